pub mod json;
pub mod quiet;
pub mod text;

use std::io::Write;

use crate::report::FileReport;

pub trait Formatter {
    fn format_to(&self, reports: &[FileReport], out: &mut dyn Write);

    fn print(&self, reports: &[FileReport]) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.format_to(reports, &mut lock);
    }
}

pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        "quiet" => Box::new(quiet::QuietFormatter),
        // "text" and any unknown value
        _ => Box::new(text::TextFormatter),
    }
}

/// `3 files processed, 1 with warnings, 0 with errors, 2 modified`
pub(crate) fn summary(reports: &[FileReport]) -> String {
    let count = reports.len();
    let file_word = if count == 1 { "file" } else { "files" };
    let warned = reports.iter().filter(|r| !r.warnings.is_empty()).count();
    let errored = reports.iter().filter(|r| !r.errors.is_empty()).count();
    let modified = reports.iter().filter(|r| r.modified).count();
    format!("{count} {file_word} processed, {warned} with warnings, {errored} with errors, {modified} modified")
}

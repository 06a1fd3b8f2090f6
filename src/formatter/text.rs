use std::io::Write;

use crate::formatter::{summary, Formatter};
use crate::report::FileReport;

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_to(&self, reports: &[FileReport], out: &mut dyn Write) {
        for report in reports {
            let _ = write!(out, "{report}");
        }
        let _ = writeln!(out, "\n{}", summary(reports));
    }
}

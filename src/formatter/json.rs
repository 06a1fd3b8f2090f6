use std::io::Write;

use serde::Serialize;

use crate::formatter::Formatter;
use crate::report::FileReport;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    metadata: Metadata,
    files: &'a [FileReport],
}

#[derive(Serialize)]
struct Metadata {
    files_processed: usize,
    warning_count: usize,
    error_count: usize,
    modified_count: usize,
}

impl Formatter for JsonFormatter {
    fn format_to(&self, reports: &[FileReport], out: &mut dyn Write) {
        let output = JsonOutput {
            metadata: Metadata {
                files_processed: reports.len(),
                warning_count: reports.iter().map(|r| r.warnings.len()).sum(),
                error_count: reports.iter().map(|r| r.errors.len()).sum(),
                modified_count: reports.iter().filter(|r| r.modified).count(),
            },
            files: reports,
        };
        let _ = serde_json::to_writer_pretty(&mut *out, &output);
        let _ = writeln!(out);
    }
}

use std::io::Write;

use crate::formatter::{summary, Formatter};
use crate::report::FileReport;

/// Only files with findings, and nothing at all when every file is clean.
pub struct QuietFormatter;

impl Formatter for QuietFormatter {
    fn format_to(&self, reports: &[FileReport], out: &mut dyn Write) {
        let shown: Vec<&FileReport> = reports.iter().filter(|r| r.has_findings()).collect();
        if shown.is_empty() {
            return;
        }
        for report in shown {
            let _ = write!(out, "{report}");
        }
        let _ = writeln!(out, "\n{}", summary(reports));
    }
}

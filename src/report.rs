use std::fmt;

use serde::Serialize;

use crate::processor::multi::MultiProcessor;
use crate::processor::{Modifying, Processor};

/// Output of one processor for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub processor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub lines: Vec<String>,
}

/// Everything the selected processors produced for one flow file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub listings: Vec<Section>,
    pub warnings: Vec<Section>,
    pub errors: Vec<String>,
    pub modified: bool,
    pub written: bool,
}

impl FileReport {
    /// A file that could not be processed at all.
    pub fn failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            errors: vec![message.into()],
            ..Self::default()
        }
    }

    /// Collects listings and warnings per sub-processor, plus the
    /// composite's errors and modification state.
    pub fn from_processor(path: impl Into<String>, multi: &MultiProcessor) -> Self {
        let mut report = Self {
            path: path.into(),
            errors: multi.errors().to_vec(),
            modified: multi.is_modified(),
            ..Self::default()
        };
        for sub in multi.processors() {
            if let Some(listing) = sub.as_listing() {
                report.listings.push(Section {
                    processor: sub.name().to_string(),
                    header: None,
                    lines: listing.list().to_vec(),
                });
            }
            if let Some(checking) = sub.as_checking() {
                if let Some(warnings) = checking.warnings() {
                    report.warnings.push(Section {
                        processor: sub.name().to_string(),
                        header: checking.warnings_header(),
                        lines: warnings.lines().map(String::from).collect(),
                    });
                }
            }
        }
        report
    }

    /// Warnings or errors were reported.
    pub fn is_failure(&self) -> bool {
        !self.warnings.is_empty() || !self.errors.is_empty()
    }

    /// Anything worth showing: failures, listed items or a rewrite.
    pub fn has_findings(&self) -> bool {
        self.is_failure() || self.modified || self.listings.iter().any(|l| !l.lines.is_empty())
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path)?;
        for section in self.listings.iter().chain(&self.warnings) {
            match &section.header {
                Some(header) => writeln!(f, "  {header}")?,
                None => writeln!(f, "  {}:", section.processor)?,
            }
            for line in &section.lines {
                writeln!(f, "    {line}")?;
            }
        }
        for error in &self.errors {
            writeln!(f, "  error: {error}")?;
        }
        if self.modified {
            let state = if self.written { "modified, written" } else { "modified" };
            writeln!(f, "  ({state})")?;
        }
        Ok(())
    }
}

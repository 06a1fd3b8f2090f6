use regex::{Regex, RegexBuilder};

use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::processor::listing::{ListRule, Occurrence};
use crate::walker::Site;

/// Locations of text-like values (names, annotations, paths, plain strings,
/// references) that contain the search text.
pub struct FindText {
    pattern: Regex,
}

impl FindText {
    pub const NAME: &'static str = "FindText";
    pub const DESCRIPTION: &'static str = "Lists the locations of text values that match the search string.";

    pub fn new(find: &str, regex: bool, case_sensitive: bool) -> Result<Self, ConfigError> {
        if find.is_empty() {
            return Err(ConfigError::invalid(Self::NAME, "Find", "must not be empty"));
        }
        let source = if regex { find.to_string() } else { regex::escape(find) };
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| ConfigError::invalid(Self::NAME, "Find", e.to_string()))?;
        Ok(Self { pattern })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        let find = config.require_str(Self::NAME, "Find")?;
        let regex = config.get_bool(Self::NAME, "Regex", false)?;
        let case_sensitive = config.get_bool(Self::NAME, "CaseSensitive", false)?;
        Self::new(find, regex, case_sensitive)
    }
}

impl ListRule for FindText {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn is_valid(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> bool {
        let Occurrence::Element { value, .. } = occurrence else {
            return false;
        };
        site.property.base_type().is_textual()
            && value.as_str().is_some_and(|text| self.pattern.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::flow::Flow;
    use crate::processor::listing::ListProcessor;
    use crate::processor::{Listing, Processor};

    fn flow() -> Flow {
        from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Display", "name": "Report", "properties": {"title": "Monthly report"}},
                {"type": "FileSupplier", "properties": {"files": ["/data/a.csv", "/data/REPORT.csv"]}},
                {"type": "Display", "name": "Other", "skip": true, "properties": {"title": "report"}}
            ]}}"#,
        )
        .unwrap()
    }

    fn find(find: &str, regex: bool, case_sensitive: bool) -> Vec<String> {
        let mut p = ListProcessor::new(FindText::new(find, regex, case_sensitive).unwrap());
        p.process(&flow()).unwrap();
        p.list().to_vec()
    }

    #[test]
    fn case_insensitive_by_default() {
        assert_eq!(
            find("report", false, false),
            vec!["Flow.Report:name", "Flow.Report:title", "Flow.FileSupplier:files[1]"]
        );
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(find("REPORT", false, true), vec!["Flow.FileSupplier:files[1]"]);
    }

    #[test]
    fn regular_expression() {
        assert_eq!(find(r"^/data/\w\.csv$", true, true), vec!["Flow.FileSupplier:files[0]"]);
    }

    #[test]
    fn literal_search_escapes_metacharacters() {
        assert!(find("a.csv", false, true).contains(&"Flow.FileSupplier:files[0]".to_string()));
        assert!(find("(", false, true).is_empty());
    }

    #[test]
    fn invalid_options() {
        assert!(matches!(FindText::new("", false, true), Err(ConfigError::InvalidOption { .. })));
        assert!(matches!(FindText::new("(", true, true), Err(ConfigError::InvalidOption { .. })));
    }
}

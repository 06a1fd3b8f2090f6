use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::value::Namespace;
use crate::processor::checking::CheckRule;

/// Storage items that are read but never written, and written but never read.
/// Local scopes are checked on their own.
#[derive(Default)]
pub struct CheckStorageUsage {
    output_counts: bool,
}

impl CheckStorageUsage {
    pub const NAME: &'static str = "CheckStorageUsage";
    pub const DESCRIPTION: &'static str = "Reports storage items that are read without being set, or set without being read.";

    pub fn new(output_counts: bool) -> Self {
        Self { output_counts }
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.get_bool(Self::NAME, "OutputCounts", false)?))
    }
}

impl CheckRule for CheckStorageUsage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn namespace(&self) -> Namespace {
        Namespace::Storage
    }

    fn output_counts(&self) -> bool {
        self.output_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::processor::checking::CheckProcessor;
    use crate::processor::{Checking, Processor};

    #[test]
    fn storage_usage_with_local_scope() {
        let flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "SetStorageValue", "properties": {"storage_name": "outer"}},
                {"type": "StorageValue", "properties": {"storage_name": "outer"}},
                {"type": "Display", "properties": {"title": "%{ghost}"}},
                {"type": "LocalScopeTrigger", "name": "local", "properties": {"actors": [
                    {"type": "SetStorageValue", "properties": {"storage_name": "inner"}},
                    {"type": "StorageValue", "properties": {"storage_name": "outer"}}
                ]}}
            ]}}"#,
        )
        .unwrap();
        let mut p = CheckProcessor::new(CheckStorageUsage::default());
        p.process(&flow).unwrap();

        assert!(p.unused().is_empty());
        assert_eq!(p.undefined(), &["ghost"]);

        let reports = p.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].scope.as_deref(), Some("Flow.local"));
        assert_eq!(reports[1].unused, vec!["inner"]);
        assert_eq!(reports[1].undefined, vec!["outer"]);

        assert_eq!(
            p.warnings().as_deref(),
            Some(
                "Undefined storage items: ghost\n\
                 Unused storage items in Flow.local: inner\n\
                 Undefined storage items in Flow.local: outer"
            )
        );
        assert_eq!(
            p.warnings_header().as_deref(),
            Some("CheckStorageUsage: 1 unused, 2 undefined")
        );
    }

    #[test]
    fn disabled_nodes_are_ignored() {
        let flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "SetStorageValue", "properties": {"storage_name": "s"}},
                {"type": "StorageValue", "skip": true, "properties": {"storage_name": "s"}}
            ]}}"#,
        )
        .unwrap();
        let mut p = CheckProcessor::new(CheckStorageUsage::default());
        p.process(&flow).unwrap();
        assert_eq!(p.unused(), &["s"]);
    }

    #[test]
    fn output_counts_option() {
        let config = ProcessorConfig::default().with_option("OutputCounts", true);
        assert!(CheckStorageUsage::from_config(&config).unwrap().output_counts());
        let config = ProcessorConfig::default().with_option("OutputCounts", "yes");
        assert!(CheckStorageUsage::from_config(&config).is_err());
    }
}

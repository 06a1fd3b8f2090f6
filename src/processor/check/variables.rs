use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::markers;
use crate::flow::value::Namespace;
use crate::processor::checking::CheckRule;

/// Variables provided by the runtime for every flow.
pub const RUNTIME_VARIABLES: &[&str] = &["flow_dir", "flow_filename_long", "flow_filename_short", "home", "tmp"];

/// Variables that are read but never set, and set but never read.
pub struct CheckVariableUsage {
    output_counts: bool,
    predefined: Vec<String>,
}

impl CheckVariableUsage {
    pub const NAME: &'static str = "CheckVariableUsage";
    pub const DESCRIPTION: &'static str = "Reports variables that are used without being set, or set without being used.";

    pub fn new(output_counts: bool, extra_predefined: Vec<String>) -> Self {
        let mut predefined: Vec<String> = RUNTIME_VARIABLES.iter().map(|s| s.to_string()).collect();
        predefined.extend(extra_predefined);
        Self {
            output_counts,
            predefined,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        let output_counts = config.get_bool(Self::NAME, "OutputCounts", false)?;
        let predefined = config.get_string_list(Self::NAME, "Predefined")?;
        if let Some(bad) = predefined.iter().find(|n| !markers::is_valid_name(n)) {
            return Err(ConfigError::invalid(
                Self::NAME,
                "Predefined",
                format!("invalid variable name {bad:?}"),
            ));
        }
        Ok(Self::new(output_counts, predefined))
    }
}

impl Default for CheckVariableUsage {
    fn default() -> Self {
        Self::new(false, Vec::new())
    }
}

impl CheckRule for CheckVariableUsage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn namespace(&self) -> Namespace {
        Namespace::Variables
    }

    fn output_counts(&self) -> bool {
        self.output_counts
    }

    fn predefined(&self) -> &[String] {
        &self.predefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::flow::Flow;
    use crate::processor::checking::CheckProcessor;
    use crate::processor::{Checking, Processor};

    fn flow() -> Flow {
        from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "SetVariable", "properties": {"variable_name": "used"}},
                {"type": "SetVariable", "name": "set2", "properties": {"variable_name": "unused"}},
                {"type": "Display", "properties": {"title": "@{used} in @{flow_dir}"}},
                {"type": "DumpFile", "properties": {"output_file": {"variable": "missing"}}}
            ]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn reports_unused_and_undefined() {
        let mut p = CheckProcessor::new(CheckVariableUsage::default());
        p.process(&flow()).unwrap();
        assert_eq!(p.unused(), &["unused"]);
        assert_eq!(p.undefined(), &["missing"]);
        assert_eq!(
            p.warnings().as_deref(),
            Some("Unused variables: unused\nUndefined variables: missing")
        );
        assert_eq!(
            p.warnings_header().as_deref(),
            Some("CheckVariableUsage: 1 unused, 1 undefined")
        );
        assert!(!p.has_errors());
    }

    #[test]
    fn predefined_names_are_never_undefined() {
        let mut p = CheckProcessor::new(CheckVariableUsage::new(false, vec!["missing".into()]));
        p.process(&flow()).unwrap();
        assert!(p.undefined().is_empty());
    }

    #[test]
    fn output_counts_lists_every_name() {
        let mut p = CheckProcessor::new(CheckVariableUsage::new(true, vec!["missing".into()]));
        p.process(&flow()).unwrap();
        let warnings = p.warnings().unwrap();
        assert!(warnings.contains("Name\tDefinitions\tUsages"));
        assert!(warnings.contains("used\t1\t1"));
        assert!(warnings.contains("flow_dir\t0\t1"));
    }

    #[test]
    fn clean_flow_passes() {
        let flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "SetVariable", "properties": {"variable_name": "x"}},
                {"type": "Variable", "properties": {"variable_name": "x"}}
            ]}}"#,
        )
        .unwrap();
        let mut p = CheckProcessor::new(CheckVariableUsage::default());
        p.process(&flow).unwrap();
        assert!(p.warnings().is_none());
        assert!(p.warnings_header().is_none());
    }

    #[test]
    fn invalid_predefined_name() {
        let config = ProcessorConfig::default().with_option("Predefined", "has space");
        assert!(CheckVariableUsage::from_config(&config).is_err());
    }
}

use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::value::{Interface, Namespace, ValueType};
use crate::flow::{Flow, NodeId};
use crate::processor::listing::{ListRule, Occurrence};
use crate::walker::Site;

/// Locations of all references to one callable actor. Local scopes that
/// define their own callables are not entered.
pub struct ListCallableReferences {
    name: String,
}

impl ListCallableReferences {
    pub const NAME: &'static str = "ListCallableReferences";
    pub const DESCRIPTION: &'static str = "Lists the locations that reference the specified callable actor.";

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        let name = config.require_str(Self::NAME, "Name")?;
        if name.is_empty() {
            return Err(ConfigError::invalid(Self::NAME, "Name", "must not be empty"));
        }
        Ok(Self::new(name))
    }
}

impl ListRule for ListCallableReferences {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn is_valid(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> bool {
        match occurrence {
            Occurrence::Element { value, .. } => {
                site.property.base_type() == ValueType::CallableRef && value.as_str() == Some(self.name.as_str())
            }
            Occurrence::Binding(_) => false,
        }
    }

    fn descend(&self, flow: &Flow, _declared: Interface, child: NodeId) -> bool {
        !flow
            .node(child)
            .is_some_and(|n| n.node_type().isolates(Namespace::Callables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::processor::listing::ListProcessor;
    use crate::processor::{Listing, Processor};

    #[test]
    fn lists_reference_locations() {
        let flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "CallableActors", "properties": {"actors": [
                    {"type": "StringConstants", "name": "A"},
                    {"type": "StringConstants", "name": "B"}
                ]}},
                {"type": "CallableSource", "name": "first", "properties": {"callable": "A"}},
                {"type": "Sequence", "properties": {"actors": [
                    {"type": "CallableSink", "properties": {"callable": "A"}},
                    {"type": "CallableSink", "name": "other", "properties": {"callable": "B"}}
                ]}},
                {"type": "LocalScopeSubProcess", "properties": {"actors": [
                    {"type": "CallableSink", "properties": {"callable": "A"}}
                ]}}
            ]}}"#,
        )
        .unwrap();
        let mut p = ListProcessor::new(ListCallableReferences::new("A"));
        p.process(&flow).unwrap();
        assert_eq!(
            p.list(),
            &["Flow.first:callable", "Flow.Sequence.CallableSink:callable"]
        );
    }

    #[test]
    fn name_is_required() {
        assert!(matches!(
            ListCallableReferences::from_config(&ProcessorConfig::default()),
            Err(ConfigError::MissingOption { .. })
        ));
        let config = ProcessorConfig::default().with_option("Name", "");
        assert!(matches!(
            ListCallableReferences::from_config(&config),
            Err(ConfigError::InvalidOption { .. })
        ));
    }
}

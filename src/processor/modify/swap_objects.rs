use tracing::debug;

use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::catalog::{self, NodeType};
use crate::flow::document::{self, NodeDoc};
use crate::flow::value::{Interface, Value};
use crate::flow::{Flow, NodeId};
use crate::processor::modifying::{Modifier, ModifyContext};
use crate::walker::{traverse, Site, Visitor};

/// Replaces every node of one type by a fresh node built from a document.
/// The replacement keeps the old node's name unless the document names it.
pub struct SwapObjects {
    find: &'static NodeType,
    replace: NodeDoc,
}

impl SwapObjects {
    pub const NAME: &'static str = "SwapObjects";
    pub const DESCRIPTION: &'static str = "Replaces all nodes of a given type with a configured replacement.";

    pub fn new(find: &str, replace: NodeDoc) -> Result<Self, ConfigError> {
        let find = catalog::lookup(find)
            .ok_or_else(|| ConfigError::invalid(Self::NAME, "Find", format!("unknown node type {find:?}")))?;
        let sample = document::from_document(&replace)
            .map_err(|e| ConfigError::invalid(Self::NAME, "Replace", e.to_string()))?;
        let interface = sample
            .root()
            .and_then(|r| sample.node(r))
            .map(|n| n.node_type().interface);
        if interface != Some(find.interface) {
            return Err(ConfigError::invalid(
                Self::NAME,
                "Replace",
                format!("{} does not implement {}", replace.node_type, find.interface),
            ));
        }
        Ok(Self { find, replace })
    }

    /// `Replace` is either a bare type name or a full node document.
    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        let find = config.require_str(Self::NAME, "Find")?;
        let replace = match config.get("Replace") {
            None | Some(serde_yml::Value::Null) => return Err(ConfigError::missing(Self::NAME, "Replace")),
            Some(serde_yml::Value::String(node_type)) => NodeDoc {
                node_type: node_type.clone(),
                name: None,
                skip: false,
                annotations: String::new(),
                properties: Default::default(),
            },
            Some(value) => serde_yml::from_value(value.clone())
                .map_err(|e| ConfigError::invalid(Self::NAME, "Replace", e.to_string()))?,
        };
        Self::new(find, replace)
    }
}

struct Target {
    parent: NodeId,
    property: &'static str,
    index: Option<usize>,
    node: NodeId,
}

struct FindTargets {
    find: &'static str,
    targets: Vec<Target>,
}

impl Visitor for FindTargets {
    fn visit_component(&mut self, site: &Site<'_>, index: Option<usize>, child: NodeId) {
        if site.flow.node(child).is_some_and(|n| n.type_name() == self.find) {
            self.targets.push(Target {
                parent: site.node,
                property: site.property.name(),
                index,
                node: child,
            });
        }
    }

    fn descend(&mut self, flow: &Flow, _declared: Interface, child: NodeId) -> bool {
        !flow.node(child).is_some_and(|n| n.type_name() == self.find)
    }

    fn include_disabled(&self) -> bool {
        true
    }
}

impl Modifier for SwapObjects {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()> {
        let mut finder = FindTargets {
            find: self.find.name,
            targets: Vec::new(),
        };
        traverse(ctx.flow, ctx.root, &mut finder);

        for target in finder.targets {
            let old_name = ctx.flow.node(target.node).map(|n| n.name().to_string());
            let fresh = match document::build(ctx.flow, &self.replace) {
                Ok(id) => id,
                Err(e) => {
                    ctx.write_failed(target.parent, target.property, e);
                    continue;
                }
            };
            if self.replace.name.is_none() {
                if let Some(name) = old_name {
                    if let Err(e) = ctx.flow.set_name(fresh, &name) {
                        ctx.write_failed(fresh, "name", e);
                    }
                }
            }
            let outcome = match target.index {
                Some(_) => ctx.flow.replace_child(target.parent, target.node, vec![fresh]),
                None => ctx
                    .flow
                    .set_value(target.parent, target.property, Value::Node(fresh))
                    .map(|()| true),
            };
            match outcome {
                Ok(true) => {
                    debug!(parent = %ctx.flow.full_name(target.parent), property = target.property, "swapped");
                    ctx.mark_modified();
                }
                Ok(false) => {
                    ctx.flow.discard(fresh);
                }
                Err(e) => {
                    ctx.flow.discard(fresh);
                    ctx.write_failed(target.parent, target.property, e);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::processor::modifying::ModifyProcessor;
    use crate::processor::{Modifying, Processor};

    fn flow() -> Flow {
        from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Display", "name": "show", "properties": {"title": "x"}},
                {"type": "Sequence", "properties": {"actors": [{"type": "Display"}]}},
                {"type": "Convert", "properties": {"conversion": {"type": "AnyToString"}}}
            ]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn swaps_array_members_keeping_names() {
        let replace: NodeDoc = serde_json::from_str(r#"{"type": "Null"}"#).unwrap();
        let mut p = ModifyProcessor::new(SwapObjects::new("Display", replace).unwrap());
        p.process(&flow()).unwrap();
        assert!(p.is_modified());
        assert!(!p.has_errors(), "{:?}", p.errors());
        let copy = p.modified_flow().unwrap();
        assert_eq!(copy.node(copy.locate("Flow.show").unwrap()).unwrap().type_name(), "Null");
        assert_eq!(copy.node(copy.locate("Flow.Sequence.Display").unwrap()).unwrap().type_name(), "Null");
        assert!(copy.nodes().all(|(_, n)| n.type_name() != "Display"));
        assert_eq!(copy.len(), flow().len());
    }

    #[test]
    fn swaps_single_component_slots() {
        let replace: NodeDoc =
            serde_json::from_str(r#"{"type": "StringReplace", "properties": {"find": "a", "replace": "b"}}"#).unwrap();
        let mut p = ModifyProcessor::new(SwapObjects::new("AnyToString", replace).unwrap());
        p.process(&flow()).unwrap();
        let copy = p.modified_flow().unwrap();
        let convert = copy.node(copy.locate("Flow.Convert").unwrap()).unwrap();
        let conversion = convert.value("conversion").and_then(Value::as_node).unwrap();
        let node = copy.node(conversion).unwrap();
        assert_eq!(node.type_name(), "StringReplace");
        assert_eq!(node.value("find"), Some(&Value::text("a")));
        assert_eq!(node.parent(), Some(copy.locate("Flow.Convert").unwrap()));
        assert!(copy.nodes().all(|(_, n)| n.type_name() != "AnyToString"));
    }

    #[test]
    fn no_matches() {
        let replace: NodeDoc = serde_json::from_str(r#"{"type": "Null"}"#).unwrap();
        let mut p = ModifyProcessor::new(SwapObjects::new("DumpFile", replace).unwrap());
        p.process(&flow()).unwrap();
        assert!(!p.is_modified());
    }

    #[test]
    fn config_validation() {
        let config = ProcessorConfig::default()
            .with_option("Find", "Display")
            .with_option("Replace", "Null");
        assert!(SwapObjects::from_config(&config).is_ok());

        let config = ProcessorConfig::default()
            .with_option("Find", "Display")
            .with_option("Replace", "AnyToString");
        assert!(matches!(SwapObjects::from_config(&config), Err(ConfigError::InvalidOption { .. })));

        let config = ProcessorConfig::default().with_option("Find", "Nope").with_option("Replace", "Null");
        assert!(SwapObjects::from_config(&config).is_err());

        let config = ProcessorConfig::default().with_option("Find", "Display");
        assert!(matches!(SwapObjects::from_config(&config), Err(ConfigError::MissingOption { .. })));
    }

    #[test]
    fn replacement_document_from_yaml() {
        let yaml: serde_yml::Value =
            serde_yml::from_str("type: DumpFile\nproperties:\n  output_file: /tmp/out.txt\n").unwrap();
        let config = ProcessorConfig::default()
            .with_option("Find", "Display")
            .with_option("Replace", yaml);
        let mut p = ModifyProcessor::new(SwapObjects::from_config(&config).unwrap());
        p.process(&flow()).unwrap();
        let copy = p.modified_flow().unwrap();
        let node = copy.node(copy.locate("Flow.show").unwrap()).unwrap();
        assert_eq!(node.value("output_file"), Some(&Value::text("/tmp/out.txt")));
    }
}

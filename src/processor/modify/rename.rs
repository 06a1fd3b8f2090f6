use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::catalog::NAME;
use crate::flow::markers;
use crate::flow::value::{Interface, Namespace, Value};
use crate::flow::{Flow, NodeId};
use crate::processor::edit::{Rewrite, RewriteRule};
use crate::processor::listing::Occurrence;
use crate::walker::Site;

/// Renames one name of a namespace everywhere it occurs: reference-typed
/// values, variable bindings, `@{..}`/`%{..}` markers in free text and, for
/// callables, the definition itself. Disabled nodes are renamed too.
pub struct Rename {
    namespace: Namespace,
    old: String,
    new: String,
}

impl Rename {
    pub const fn processor_name(namespace: Namespace) -> &'static str {
        match namespace {
            Namespace::Variables => "ChangeVariableName",
            Namespace::Storage => "ChangeStorageName",
            Namespace::Callables => "ChangeCallableName",
        }
    }

    pub const fn processor_description(namespace: Namespace) -> &'static str {
        match namespace {
            Namespace::Variables => "Renames a variable in bindings, variable names and @{..} markers.",
            Namespace::Storage => "Renames a storage item in storage names and %{..} markers.",
            Namespace::Callables => "Renames a callable actor together with every reference to it.",
        }
    }

    pub fn new(namespace: Namespace, old: &str, new: &str) -> Result<Self, ConfigError> {
        let processor = Self::processor_name(namespace);
        for (option, value) in [("Old", old), ("New", new)] {
            if value.is_empty() {
                return Err(ConfigError::invalid(processor, option, "must not be empty"));
            }
            if !markers::is_valid_name(value) {
                return Err(ConfigError::invalid(
                    processor,
                    option,
                    format!("{value:?} contains characters not allowed in names"),
                ));
            }
        }
        if namespace == Namespace::Callables && (new.contains('.') || new.contains(':')) {
            return Err(ConfigError::invalid(processor, "New", "actor names must not contain '.' or ':'"));
        }
        if old == new {
            return Err(ConfigError::invalid(processor, "New", "must differ from Old"));
        }
        Ok(Self {
            namespace,
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    pub fn from_config(namespace: Namespace, config: &ProcessorConfig) -> Result<Self, ConfigError> {
        let processor = Self::processor_name(namespace);
        let old = config.require_str(processor, "Old")?;
        let new = config.require_str(processor, "New")?;
        Self::new(namespace, old, new)
    }

    /// The `name` of a member of a callable group.
    fn is_callable_definition(&self, site: &Site<'_>) -> bool {
        if self.namespace != Namespace::Callables || site.property.name() != NAME {
            return false;
        }
        site.owner()
            .and_then(|n| n.parent())
            .and_then(|p| site.flow.node(p))
            .is_some_and(|p| p.node_type().callable_group)
    }
}

impl RewriteRule for Rename {
    fn name(&self) -> &'static str {
        Self::processor_name(self.namespace)
    }

    fn description(&self) -> &'static str {
        Self::processor_description(self.namespace)
    }

    fn rewrite(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Option<Rewrite> {
        match occurrence {
            Occurrence::Binding(variable) => (self.namespace == Namespace::Variables && *variable == self.old)
                .then(|| Rewrite::Rebind(self.new.clone())),
            Occurrence::Element { value, .. } => {
                let text = value.as_str()?;
                let base_type = site.property.base_type();
                if base_type.namespace() == Some(self.namespace) || self.is_callable_definition(site) {
                    (text == self.old).then(|| Rewrite::Value(Value::text(self.new.as_str())))
                } else if base_type.is_free_text() {
                    markers::replace(self.namespace, text, &self.old, &self.new).map(|t| Rewrite::Value(Value::Text(t)))
                } else {
                    None
                }
            }
        }
    }

    fn descend(&self, flow: &Flow, _declared: Interface, child: NodeId) -> bool {
        !flow.node(child).is_some_and(|n| n.node_type().isolates(self.namespace))
    }

    fn include_disabled(&self) -> bool {
        true
    }
}

use tracing::warn;

use crate::error::ConfigError;
use crate::flow::{Flow, NodeId};

use super::{begin, finish, Modifying, Processor};

/// Mutable state handed to a [`Modifier`] for one run.
pub struct ModifyContext<'a> {
    pub flow: &'a mut Flow,
    pub root: NodeId,
    processor: &'static str,
    errors: &'a mut Vec<String>,
    modified: bool,
}

impl<'a> ModifyContext<'a> {
    pub fn new(flow: &'a mut Flow, root: NodeId, processor: &'static str, errors: &'a mut Vec<String>) -> Self {
        Self {
            flow,
            root,
            processor,
            errors,
            modified: false,
        }
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Records a failure that only affects a single match.
    pub fn error(&mut self, message: String) {
        warn!(processor = self.processor, "{message}");
        self.errors.push(message);
    }

    /// Records a failed write against `node`, naming the property, the node
    /// type and the node's location.
    pub fn write_failed(&mut self, node: NodeId, property: &str, err: impl std::fmt::Display) {
        let (node_type, location) = match self.flow.node(node) {
            Some(n) => (n.type_name(), self.flow.full_name(node)),
            None => ("<removed>", String::new()),
        };
        self.error(format!("failed to update {property} of {node_type} {location}: {err}"));
    }
}

/// The tool-specific part of a modifying processor.
pub trait Modifier: Send {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()>;
}

/// Runs a [`Modifier`] on a private copy of the flow, so the caller's flow
/// is never touched. The copy is kept only when something changed.
pub struct ModifyProcessor<M> {
    modifier: M,
    errors: Vec<String>,
    modified: bool,
    result: Option<Flow>,
}

impl<M: Modifier> ModifyProcessor<M> {
    pub fn new(modifier: M) -> Self {
        Self {
            modifier,
            errors: Vec::new(),
            modified: false,
            result: None,
        }
    }

    pub fn modifier(&self) -> &M {
        &self.modifier
    }

    fn run(&mut self, flow: &mut Flow, root: NodeId) -> bool {
        let name = self.modifier.name();
        let mut ctx = ModifyContext::new(flow, root, name, &mut self.errors);
        let outcome = self.modifier.modify(&mut ctx);
        let modified = ctx.is_modified();
        finish(name, &mut self.errors, outcome);
        modified
    }

    fn reset(&mut self) {
        self.modified = false;
        self.result = None;
    }
}

impl<M: Modifier> Processor for ModifyProcessor<M> {
    fn name(&self) -> &'static str {
        self.modifier.name()
    }

    fn description(&self) -> &'static str {
        self.modifier.description()
    }

    fn process(&mut self, flow: &Flow) -> Result<(), ConfigError> {
        self.reset();
        let root = begin(flow, &mut self.errors)?;
        let mut copy = flow.clone();
        self.modified = self.run(&mut copy, root);
        if self.modified {
            self.result = Some(copy);
        }
        Ok(())
    }

    fn errors(&self) -> &[String] {
        &self.errors
    }

    fn as_modifying(&self) -> Option<&dyn Modifying> {
        Some(self)
    }

    fn as_modifying_mut(&mut self) -> Option<&mut dyn Modifying> {
        Some(self)
    }
}

impl<M: Modifier> Modifying for ModifyProcessor<M> {
    fn is_modified(&self) -> bool {
        self.modified
    }

    fn modified_flow(&self) -> Option<&Flow> {
        self.result.as_ref()
    }

    fn take_modified_flow(&mut self) -> Option<Flow> {
        self.result.take()
    }

    fn process_in_place(&mut self, flow: &mut Flow) -> Result<(), ConfigError> {
        self.reset();
        let root = begin(flow, &mut self.errors)?;
        self.modified = self.run(flow, root);
        Ok(())
    }
}

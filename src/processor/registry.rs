use std::collections::HashMap;

use crate::config::{ProcessorConfig, ResolvedConfig};
use crate::error::ConfigError;
use crate::flow::Flow;

use super::multi::MultiProcessor;
use super::Processor;

/// Builds a configured processor, validating its options.
pub type Factory = fn(&ProcessorConfig) -> Result<Box<dyn Processor>, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Listing,
    Checking,
    Modifying,
}

impl Capability {
    pub fn label(self) -> &'static str {
        match self {
            Capability::Listing => "listing",
            Capability::Checking => "checking",
            Capability::Modifying => "modifying",
        }
    }
}

/// Named bundles of processors that are usually run together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Check,
    CleanUp,
}

#[derive(Clone)]
pub struct ProcessorEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub capability: Capability,
    pub groups: &'static [Group],
    pub factory: Factory,
}

pub struct ProcessorRegistry {
    entries: Vec<ProcessorEntry>,
    index: HashMap<&'static str, usize>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::default_registry()
    }
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build the default registry with all built-in processors.
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        super::list::register_all(&mut registry);
        super::check::register_all(&mut registry);
        super::modify::register_all(&mut registry);
        registry
    }

    pub fn register(&mut self, entry: ProcessorEntry) {
        let idx = self.entries.len();
        self.index.insert(entry.name, idx);
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ProcessorEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ProcessorEntry> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the named processor with its options from `config`.
    pub fn build(&self, name: &str, config: &ResolvedConfig) -> Result<Box<dyn Processor>, ConfigError> {
        let entry = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProcessor(name.to_string()))?;
        (entry.factory)(&config.processor_config(name))
    }

    /// Builds a composite over the named processors, in the given order.
    pub fn build_multi(&self, names: &[&str], config: &ResolvedConfig) -> Result<MultiProcessor, ConfigError> {
        let processors = names
            .iter()
            .map(|name| self.build(name, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MultiProcessor::new(processors))
    }

    /// Names of the enabled members of `group`, in registration order.
    pub fn group_members(&self, group: Group, config: &ResolvedConfig) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.groups.contains(&group) && config.is_processor_enabled(e.name))
            .map(|e| e.name)
            .collect()
    }

    pub fn build_group(&self, group: Group, config: &ResolvedConfig) -> Result<MultiProcessor, ConfigError> {
        self.build_multi(&self.group_members(group, config), config)
    }
}

/// Runs every check-capable processor over `flow`.
pub fn check_flow(flow: &Flow, config: &ResolvedConfig) -> Result<MultiProcessor, ConfigError> {
    let mut multi = ProcessorRegistry::default_registry().build_group(Group::Check, config)?;
    multi.process(flow)?;
    Ok(multi)
}

/// Runs the clean-up group over a copy of `flow`.
pub fn clean_up_flow(flow: &Flow, config: &ResolvedConfig) -> Result<MultiProcessor, ConfigError> {
    let mut multi = ProcessorRegistry::default_registry().build_group(Group::CleanUp, config)?;
    multi.process(flow)?;
    Ok(multi)
}

pub mod callables;
pub mod storage;
pub mod variables;

use super::checking::CheckProcessor;
use super::registry::{Capability, Group, ProcessorEntry, ProcessorRegistry};

pub fn register_all(registry: &mut ProcessorRegistry) {
    registry.register(ProcessorEntry {
        name: variables::CheckVariableUsage::NAME,
        description: variables::CheckVariableUsage::DESCRIPTION,
        capability: Capability::Checking,
        groups: &[Group::Check],
        factory: |config| {
            let rule = variables::CheckVariableUsage::from_config(config)?;
            Ok(Box::new(CheckProcessor::new(rule)))
        },
    });
    registry.register(ProcessorEntry {
        name: storage::CheckStorageUsage::NAME,
        description: storage::CheckStorageUsage::DESCRIPTION,
        capability: Capability::Checking,
        groups: &[Group::Check],
        factory: |config| {
            let rule = storage::CheckStorageUsage::from_config(config)?;
            Ok(Box::new(CheckProcessor::new(rule)))
        },
    });
    registry.register(ProcessorEntry {
        name: callables::CheckCallableUsage::NAME,
        description: callables::CheckCallableUsage::DESCRIPTION,
        capability: Capability::Checking,
        groups: &[Group::Check],
        factory: |config| {
            let rule = callables::CheckCallableUsage::from_config(config)?;
            Ok(Box::new(CheckProcessor::new(rule)))
        },
    });
}

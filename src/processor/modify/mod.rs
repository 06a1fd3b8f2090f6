pub mod change_path;
pub mod flatten_structure;
pub mod remove_breakpoints;
pub mod remove_disabled;
pub mod remove_unused_callables;
pub mod rename;
pub mod swap_objects;

use tracing::debug;

use crate::flow::catalog::ACTORS;
use crate::flow::value::{Interface, Namespace, Value};
use crate::flow::{Flow, Node, NodeId};
use crate::walker::{traverse, Site, Visitor};

use super::edit::Rewriter;
use super::modifying::{ModifyContext, ModifyProcessor};
use super::registry::{Capability, Group, ProcessorEntry, ProcessorRegistry};

pub fn register_all(registry: &mut ProcessorRegistry) {
    registry.register(ProcessorEntry {
        name: rename::Rename::processor_name(Namespace::Variables),
        description: rename::Rename::processor_description(Namespace::Variables),
        capability: Capability::Modifying,
        groups: &[],
        factory: |config| {
            let rule = rename::Rename::from_config(Namespace::Variables, config)?;
            Ok(Box::new(ModifyProcessor::new(Rewriter(rule))))
        },
    });
    registry.register(ProcessorEntry {
        name: rename::Rename::processor_name(Namespace::Storage),
        description: rename::Rename::processor_description(Namespace::Storage),
        capability: Capability::Modifying,
        groups: &[],
        factory: |config| {
            let rule = rename::Rename::from_config(Namespace::Storage, config)?;
            Ok(Box::new(ModifyProcessor::new(Rewriter(rule))))
        },
    });
    registry.register(ProcessorEntry {
        name: rename::Rename::processor_name(Namespace::Callables),
        description: rename::Rename::processor_description(Namespace::Callables),
        capability: Capability::Modifying,
        groups: &[],
        factory: |config| {
            let rule = rename::Rename::from_config(Namespace::Callables, config)?;
            Ok(Box::new(ModifyProcessor::new(Rewriter(rule))))
        },
    });
    registry.register(ProcessorEntry {
        name: change_path::ChangePath::NAME,
        description: change_path::ChangePath::DESCRIPTION,
        capability: Capability::Modifying,
        groups: &[],
        factory: |config| {
            let rule = change_path::ChangePath::from_config(config)?;
            Ok(Box::new(ModifyProcessor::new(Rewriter(rule))))
        },
    });
    registry.register(ProcessorEntry {
        name: swap_objects::SwapObjects::NAME,
        description: swap_objects::SwapObjects::DESCRIPTION,
        capability: Capability::Modifying,
        groups: &[],
        factory: |config| {
            let modifier = swap_objects::SwapObjects::from_config(config)?;
            Ok(Box::new(ModifyProcessor::new(modifier)))
        },
    });
    registry.register(ProcessorEntry {
        name: remove_disabled::RemoveDisabledNodes::NAME,
        description: remove_disabled::RemoveDisabledNodes::DESCRIPTION,
        capability: Capability::Modifying,
        groups: &[Group::CleanUp],
        factory: |_| Ok(Box::new(ModifyProcessor::new(remove_disabled::RemoveDisabledNodes))),
    });
    registry.register(ProcessorEntry {
        name: remove_breakpoints::RemoveBreakpoints::NAME,
        description: remove_breakpoints::RemoveBreakpoints::DESCRIPTION,
        capability: Capability::Modifying,
        groups: &[],
        factory: |_| Ok(Box::new(ModifyProcessor::new(remove_breakpoints::RemoveBreakpoints))),
    });
    registry.register(ProcessorEntry {
        name: remove_unused_callables::RemoveUnusedCallables::NAME,
        description: remove_unused_callables::RemoveUnusedCallables::DESCRIPTION,
        capability: Capability::Modifying,
        groups: &[Group::CleanUp],
        factory: |_| {
            Ok(Box::new(ModifyProcessor::new(
                remove_unused_callables::RemoveUnusedCallables,
            )))
        },
    });
    registry.register(ProcessorEntry {
        name: flatten_structure::FlattenStructure::NAME,
        description: flatten_structure::FlattenStructure::DESCRIPTION,
        capability: Capability::Modifying,
        groups: &[Group::CleanUp],
        factory: |_| Ok(Box::new(ModifyProcessor::new(flatten_structure::FlattenStructure))),
    });
}

/// Collects the outermost nodes matching a predicate, together with the
/// node holding them.
struct Matches<F> {
    matches: F,
    include_disabled: bool,
    found: Vec<(NodeId, NodeId)>,
}

impl<F: Fn(&Node) -> bool> Visitor for Matches<F> {
    fn visit_component(&mut self, site: &Site<'_>, _index: Option<usize>, child: NodeId) {
        if site.flow.node(child).is_some_and(|n| (self.matches)(n)) {
            self.found.push((site.node, child));
        }
    }

    fn descend(&mut self, flow: &Flow, _declared: Interface, child: NodeId) -> bool {
        !flow.node(child).is_some_and(|n| (self.matches)(n))
    }

    fn include_disabled(&self) -> bool {
        self.include_disabled
    }
}

/// Removes every outermost node below the root that satisfies `matches`.
/// Nodes held in a single component slot cannot be dropped and are left in
/// place. Returns the number of removed subtrees.
pub(crate) fn remove_matching(
    ctx: &mut ModifyContext<'_>,
    include_disabled: bool,
    matches: impl Fn(&Node) -> bool,
) -> usize {
    let mut visitor = Matches {
        matches,
        include_disabled,
        found: Vec::new(),
    };
    traverse(ctx.flow, ctx.root, &mut visitor);

    let mut removed = 0;
    for (parent, child) in visitor.found {
        let location = ctx.flow.full_name(child);
        match ctx.flow.remove_child(parent, child) {
            Ok(true) => {
                debug!(node = %location, "removed");
                removed += 1;
                ctx.mark_modified();
            }
            Ok(false) => debug!(node = %location, "kept, not held in an array"),
            Err(e) => ctx.write_failed(parent, ACTORS, e),
        }
    }
    removed
}

/// Drops callable groups left without members, repeating until none remain.
pub(crate) fn prune_empty_groups(ctx: &mut ModifyContext<'_>) -> usize {
    let mut pruned = 0;
    loop {
        let empty: Vec<(NodeId, NodeId)> = ctx
            .flow
            .nodes()
            .filter(|(_, n)| n.node_type().callable_group)
            .filter(|(_, n)| matches!(n.value(ACTORS), Some(Value::Array(items)) if items.is_empty()))
            .filter_map(|(id, n)| n.parent().map(|p| (p, id)))
            .collect();
        let mut progress = false;
        for (parent, group) in empty {
            match ctx.flow.remove_child(parent, group) {
                Ok(true) => {
                    pruned += 1;
                    progress = true;
                    ctx.mark_modified();
                }
                Ok(false) => {}
                Err(e) => ctx.write_failed(parent, ACTORS, e),
            }
        }
        if !progress {
            break;
        }
    }
    pruned
}

use std::collections::VecDeque;

use tracing::debug;

use crate::flow::catalog::ACTORS;
use crate::flow::value::{Interface, Namespace, Value, ValueType};
use crate::flow::{Flow, NodeId};
use crate::processor::counter::NamedCounter;
use crate::processor::modifying::{Modifier, ModifyContext};
use crate::walker::{traverse, Site, Visitor};

use super::prune_empty_groups;

/// Removes callable actors nobody refers to. A reference from a disabled
/// actor still keeps its target alive, so re-enabling it never leaves a
/// dangling call. Removal repeats until no more callables become unused.
pub struct RemoveUnusedCallables;

impl RemoveUnusedCallables {
    pub const NAME: &'static str = "RemoveUnusedCallables";
    pub const DESCRIPTION: &'static str = "Removes callable actors that are not referenced anywhere.";
}

/// References and callable groups of one scope.
#[derive(Default)]
struct ScopeRefs {
    references: NamedCounter,
    groups: Vec<NodeId>,
    nested: Vec<NodeId>,
}

impl Visitor for ScopeRefs {
    fn visit_argument(&mut self, site: &Site<'_>, _index: Option<usize>, value: &Value) {
        if site.property.base_type() != ValueType::CallableRef {
            return;
        }
        if let Some(name) = value.as_str().filter(|n| !n.is_empty()) {
            self.references.increment(name);
        }
    }

    fn visit_component(&mut self, site: &Site<'_>, _index: Option<usize>, child: NodeId) {
        if site.flow.node(child).is_some_and(|n| n.node_type().callable_group) {
            self.groups.push(child);
        }
    }

    fn descend(&mut self, flow: &Flow, _declared: Interface, child: NodeId) -> bool {
        let isolated = flow
            .node(child)
            .is_some_and(|n| n.node_type().isolates(Namespace::Callables));
        if isolated {
            self.nested.push(child);
        }
        !isolated
    }

    fn include_disabled(&self) -> bool {
        true
    }
}

/// Members of callable groups whose name is not referenced in their scope.
fn unused_members(flow: &Flow, root: NodeId) -> Vec<(NodeId, NodeId)> {
    let mut unused = Vec::new();
    let mut scopes = VecDeque::from([root]);
    while let Some(scope) = scopes.pop_front() {
        let mut refs = ScopeRefs::default();
        traverse(flow, scope, &mut refs);
        for group in refs.groups {
            let Some(node) = flow.node(group) else { continue };
            for member in node.children() {
                if flow
                    .node(member)
                    .is_some_and(|m| m.node_type().is_actor() && !refs.references.has(m.name()))
                {
                    unused.push((group, member));
                }
            }
        }
        scopes.extend(refs.nested);
    }
    unused
}

impl Modifier for RemoveUnusedCallables {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()> {
        let mut removed = 0;
        loop {
            let unused = unused_members(ctx.flow, ctx.root);
            let mut progress = false;
            for (group, member) in unused {
                let name = ctx.flow.full_name(member);
                match ctx.flow.remove_child(group, member) {
                    Ok(true) => {
                        debug!(callable = %name, "removed unused callable");
                        removed += 1;
                        progress = true;
                        ctx.mark_modified();
                    }
                    Ok(false) => {}
                    Err(e) => ctx.write_failed(group, ACTORS, e),
                }
            }
            if !progress {
                break;
            }
        }
        let pruned = prune_empty_groups(ctx);
        debug!(removed, pruned, "removed unused callables");
        Ok(())
    }
}

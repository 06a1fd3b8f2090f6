use tracing::debug;

use crate::flow::catalog::ACTORS;
use crate::flow::{Flow, Node, NodeId};
use crate::processor::modifying::{Modifier, ModifyContext};
use crate::walker::{traverse, Site, Visitor};

/// Inlines pass-through sequences that wrap a single actor. A wrapper whose
/// only child is itself a plain sequence is replaced by that sequence's
/// children; any other child replaces the wrapper directly.
pub struct FlattenStructure;

impl FlattenStructure {
    pub const NAME: &'static str = "FlattenStructure";
    pub const DESCRIPTION: &'static str = "Removes sequences that only wrap a single actor.";
}

/// A plain sequence that carries nothing but its children.
fn is_bare_sequence(node: &Node) -> bool {
    node.node_type().plain_sequence && !node.is_disabled() && node.annotations().is_empty() && !node.has_bindings()
}

struct Candidate {
    parent: NodeId,
    wrapper: NodeId,
}

#[derive(Default)]
struct FindWrapper {
    found: Option<Candidate>,
}

impl Visitor for FindWrapper {
    fn visit_component(&mut self, site: &Site<'_>, index: Option<usize>, child: NodeId) {
        if self.found.is_some() || index.is_none() || site.property.name() != ACTORS {
            return;
        }
        if !site.owner().is_some_and(|o| o.node_type().ordered_children) {
            return;
        }
        let Some(node) = site.flow.node(child) else { return };
        if is_bare_sequence(node) && node.children().len() == 1 {
            self.found = Some(Candidate {
                parent: site.node,
                wrapper: child,
            });
        }
    }
}

/// What takes the wrapper's place in its parent.
fn replacements(flow: &Flow, wrapper: NodeId) -> Vec<NodeId> {
    let Some(only) = flow.node(wrapper).and_then(|w| w.children().first().copied()) else {
        return Vec::new();
    };
    match flow.node(only) {
        Some(node) if is_bare_sequence(node) => node.children(),
        _ => vec![only],
    }
}

impl Modifier for FlattenStructure {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()> {
        let mut flattened = 0;
        loop {
            let mut finder = FindWrapper::default();
            traverse(ctx.flow, ctx.root, &mut finder);
            let Some(Candidate { parent, wrapper }) = finder.found else {
                break;
            };

            let moved = replacements(ctx.flow, wrapper);
            let location = ctx.flow.full_name(wrapper);
            if let Err(e) = ctx.flow.replace_child(parent, wrapper, moved.clone()) {
                ctx.write_failed(parent, ACTORS, e);
                break;
            }
            debug!(wrapper = %location, moved = moved.len(), "flattened");
            flattened += 1;
            ctx.mark_modified();

            for id in moved {
                let Some(current) = ctx.flow.node(id).map(|n| n.name().to_string()) else {
                    continue;
                };
                let unique = ctx.flow.unique_child_name(parent, &current, &[id]);
                if unique != current {
                    if let Err(e) = ctx.flow.set_name(id, &unique) {
                        ctx.write_failed(id, "name", e);
                    }
                }
            }
        }
        debug!(flattened, "flatten finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::{from_json_str, to_document};
    use crate::processor::modifying::ModifyProcessor;
    use crate::processor::{Modifying, Processor};

    fn child_names(flow: &Flow, id: NodeId) -> Vec<String> {
        flow.node(id)
            .unwrap()
            .children()
            .into_iter()
            .map(|c| flow.node(c).unwrap().name().to_string())
            .collect()
    }

    fn run(json: &str) -> (Flow, ModifyProcessor<FlattenStructure>) {
        let flow = from_json_str(json).unwrap();
        let mut p = ModifyProcessor::new(FlattenStructure);
        p.process(&flow).unwrap();
        (flow, p)
    }

    #[test]
    fn wrapper_around_sequence_is_replaced_by_its_children() {
        let (_, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Display", "name": "first"},
                {"type": "Sequence", "name": "wrapper", "properties": {"actors": [
                    {"type": "SubProcess", "name": "inner", "properties": {"actors": [
                        {"type": "Null", "name": "a"},
                        {"type": "Null", "name": "b"},
                        {"type": "Null", "name": "c"}
                    ]}}
                ]}},
                {"type": "Display", "name": "last"}
            ]}}"#,
        );
        assert!(p.is_modified());
        let copy = p.modified_flow().unwrap();
        assert_eq!(child_names(copy, copy.root().unwrap()), vec!["first", "a", "b", "c", "last"]);
        assert_eq!(copy.len(), 6);
    }

    #[test]
    fn wrapper_around_single_actor() {
        let (_, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Sequence", "properties": {"actors": [{"type": "Display"}]}}
            ]}}"#,
        );
        let copy = p.modified_flow().unwrap();
        assert!(copy.locate("Flow.Display").is_some());
    }

    #[test]
    fn two_children_is_a_no_op() {
        let (flow, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Sequence", "properties": {"actors": [{"type": "Null"}, {"type": "Display"}]}}
            ]}}"#,
        );
        assert!(!p.is_modified());
        assert!(p.modified_flow().is_none());
        assert!(flow.locate("Flow.Sequence.Display").is_some());
    }

    #[test]
    fn annotated_or_disabled_wrappers_stay() {
        let (_, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Sequence", "annotations": "keep me", "properties": {"actors": [{"type": "Null"}]}},
                {"type": "Sequence", "name": "off", "skip": true, "properties": {"actors": [{"type": "Null"}]}}
            ]}}"#,
        );
        assert!(!p.is_modified());
    }

    #[test]
    fn unordered_parents_are_left_alone() {
        let (_, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Branch", "properties": {"branches": [
                    {"type": "Sequence", "properties": {"actors": [{"type": "Null"}]}}
                ]}}
            ]}}"#,
        );
        assert!(!p.is_modified());
    }

    #[test]
    fn moved_actors_get_unique_names() {
        let (flow, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Null"},
                {"type": "Sequence", "properties": {"actors": [{"type": "Null"}]}}
            ]}}"#,
        );
        let before = to_document(&flow, flow.root().unwrap()).unwrap();
        let copy = p.modified_flow().unwrap();
        assert_eq!(child_names(copy, copy.root().unwrap()), vec!["Null", "Null-1"]);
        assert_eq!(to_document(&flow, flow.root().unwrap()).unwrap(), before);
    }

    #[test]
    fn nested_wrappers_collapse_completely() {
        let (_, p) = run(
            r#"{"type": "Flow", "properties": {"actors": [
                {"type": "Sequence", "name": "s1", "properties": {"actors": [
                    {"type": "Sequence", "name": "s2", "properties": {"actors": [
                        {"type": "Sequence", "name": "s3", "properties": {"actors": [{"type": "Display"}]}}
                    ]}}
                ]}}
            ]}}"#,
        );
        let copy = p.modified_flow().unwrap();
        assert_eq!(child_names(copy, copy.root().unwrap()), vec!["Display"]);
        assert_eq!(copy.len(), 2);
    }
}

//! Rewrites are planned during a read-only traversal and applied afterwards,
//! so the tree never changes underneath the walker.

use tracing::debug;

use crate::flow::value::{Interface, Value};
use crate::flow::{Flow, NodeId};
use crate::walker::{traverse, Site, Visitor};

use super::listing::Occurrence;
use super::modifying::{Modifier, ModifyContext};

#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// New value for one element (or the whole scalar).
    Value(Value),
    /// Bind the property to a different variable.
    Rebind(String),
}

#[derive(Debug, Clone)]
struct PendingEdit {
    node: NodeId,
    property: &'static str,
    index: Option<usize>,
    rewrite: Rewrite,
}

#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<PendingEdit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId, property: &'static str, index: Option<usize>, rewrite: Rewrite) {
        self.edits.push(PendingEdit {
            node,
            property,
            index,
            rewrite,
        });
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies all edits. Element edits on the same array property are
    /// merged and written back with a single whole-array write. Returns the
    /// number of properties that actually changed.
    pub fn apply(self, ctx: &mut ModifyContext<'_>) -> usize {
        let mut groups: Vec<(NodeId, &'static str, Vec<(Option<usize>, Value)>)> = Vec::new();
        let mut changed = 0;

        for edit in self.edits {
            match edit.rewrite {
                Rewrite::Rebind(variable) => {
                    let current = ctx
                        .flow
                        .node(edit.node)
                        .and_then(|n| n.property(edit.property))
                        .and_then(|p| p.variable.map(String::from));
                    if current.as_deref() == Some(variable.as_str()) {
                        continue;
                    }
                    match ctx.flow.bind_variable(edit.node, edit.property, Some(variable)) {
                        Ok(()) => {
                            changed += 1;
                            ctx.mark_modified();
                        }
                        Err(e) => ctx.write_failed(edit.node, edit.property, e),
                    }
                }
                Rewrite::Value(value) => {
                    match groups
                        .iter_mut()
                        .find(|(n, p, _)| *n == edit.node && *p == edit.property)
                    {
                        Some((_, _, elements)) => elements.push((edit.index, value)),
                        None => groups.push((edit.node, edit.property, vec![(edit.index, value)])),
                    }
                }
            }
        }

        for (node, property, elements) in groups {
            let Some(current) = ctx.flow.node(node).and_then(|n| n.value(property)).cloned() else {
                ctx.write_failed(node, property, "property no longer exists");
                continue;
            };
            let mut updated = current.clone();
            for (index, value) in elements {
                match (index, &mut updated) {
                    (Some(i), Value::Array(items)) if i < items.len() => items[i] = value,
                    (None, slot) => *slot = value,
                    _ => {
                        ctx.write_failed(node, property, format!("no element at index {index:?}"));
                    }
                }
            }
            if updated == current {
                continue;
            }
            match ctx.flow.set_value(node, property, updated) {
                Ok(()) => {
                    changed += 1;
                    ctx.mark_modified();
                }
                Err(e) => ctx.write_failed(node, property, e),
            }
        }
        debug!(changed, "applied edits");
        changed
    }
}

/// Decides, per occurrence, whether and how to rewrite it.
pub trait RewriteRule: Send {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn rewrite(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Option<Rewrite>;

    #[allow(unused_variables)]
    fn descend(&self, flow: &Flow, declared: Interface, child: NodeId) -> bool {
        true
    }

    fn include_disabled(&self) -> bool {
        false
    }
}

/// Turns a [`RewriteRule`] into a [`Modifier`]: one planning pass, then one
/// application of the collected edits.
pub struct Rewriter<R>(pub R);

struct Planner<'r, R> {
    rule: &'r R,
    edits: EditSet,
}

impl<R: RewriteRule> Planner<'_, R> {
    fn plan(&mut self, site: &Site<'_>, index: Option<usize>, occurrence: Occurrence<'_>) {
        if let Some(rewrite) = self.rule.rewrite(site, &occurrence) {
            self.edits.push(site.node, site.property.name(), index, rewrite);
        }
    }
}

impl<R: RewriteRule> Visitor for Planner<'_, R> {
    fn visit_binding(&mut self, site: &Site<'_>, variable: &str) {
        self.plan(site, None, Occurrence::Binding(variable));
    }

    fn visit_argument(&mut self, site: &Site<'_>, index: Option<usize>, value: &Value) {
        self.plan(site, index, Occurrence::Element { index, value });
    }

    fn descend(&mut self, flow: &Flow, declared: Interface, child: NodeId) -> bool {
        self.rule.descend(flow, declared, child)
    }

    fn include_disabled(&self) -> bool {
        self.rule.include_disabled()
    }
}

impl<R: RewriteRule> Modifier for Rewriter<R> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn description(&self) -> &'static str {
        self.0.description()
    }

    fn modify(&mut self, ctx: &mut ModifyContext<'_>) -> anyhow::Result<()> {
        let mut planner = Planner {
            rule: &self.0,
            edits: EditSet::new(),
        };
        traverse(ctx.flow, ctx.root, &mut planner);
        debug!(processor = self.0.name(), planned = planner.edits.len(), "planned edits");
        planner.edits.apply(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::document::from_json_str;
    use crate::processor::modifying::ModifyProcessor;
    use crate::processor::{Modifying, Processor};

    /// Upper-cases every element of `strings` that starts with "x".
    struct Upper;

    impl RewriteRule for Upper {
        fn name(&self) -> &'static str {
            "Upper"
        }

        fn description(&self) -> &'static str {
            "test rule"
        }

        fn rewrite(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Option<Rewrite> {
            let Occurrence::Element { value, .. } = occurrence else {
                return None;
            };
            let text = value.as_str()?;
            (site.property.name() == "strings" && text.starts_with('x'))
                .then(|| Rewrite::Value(Value::text(text.to_uppercase())))
        }
    }

    #[test]
    fn array_elements_are_replaced_individually() {
        let flow = from_json_str(
            r#"{"type": "StringConstants", "properties": {"strings": ["a", "xb", "c", "xd"]}}"#,
        )
        .unwrap();
        let mut p = ModifyProcessor::new(Rewriter(Upper));
        p.process(&flow).unwrap();
        assert!(p.is_modified());
        let copy = p.modified_flow().unwrap();
        let root = copy.root().unwrap();
        assert_eq!(
            copy.node(root).unwrap().value("strings"),
            Some(&Value::Array(vec![
                Value::text("a"),
                Value::text("XB"),
                Value::text("c"),
                Value::text("XD"),
            ]))
        );
    }

    #[test]
    fn nothing_to_rewrite() {
        let flow = from_json_str(r#"{"type": "StringConstants", "properties": {"strings": ["a"]}}"#).unwrap();
        let mut p = ModifyProcessor::new(Rewriter(Upper));
        p.process(&flow).unwrap();
        assert!(!p.is_modified());
        assert!(!p.has_errors());
    }

    #[test]
    fn failed_write_is_reported_and_others_continue() {
        let mut flow = from_json_str(
            r#"{"type": "Flow", "properties": {"actors": [{"type": "Display"}, {"type": "Display", "name": "second"}]}}"#,
        )
        .unwrap();
        let first = flow.locate("Flow.Display").unwrap();
        let second = flow.locate("Flow.second").unwrap();
        let root = flow.root().unwrap();

        let mut edits = EditSet::new();
        edits.push(first, "width", None, Rewrite::Value(Value::text("wide")));
        edits.push(second, "width", None, Rewrite::Value(Value::Integer(5)));
        let mut errors = Vec::new();
        let mut ctx = ModifyContext::new(&mut flow, root, "test", &mut errors);
        assert_eq!(edits.apply(&mut ctx), 1);
        assert!(ctx.is_modified());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("width of Display Flow.Display"));
        assert_eq!(flow.node(second).unwrap().value("width"), Some(&Value::Integer(5)));
    }
}

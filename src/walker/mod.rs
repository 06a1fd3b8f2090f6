pub mod path;

use tracing::trace;

use crate::flow::property::{Property, PropertyKind};
use crate::flow::value::{Interface, Value};
use crate::flow::{Flow, Node, NodeId};
pub use path::{Step, TraversalPath};

/// Everything a visitor callback gets to see about the current property.
pub struct Site<'a> {
    pub flow: &'a Flow,
    pub node: NodeId,
    pub property: Property<'a>,
    pub path: &'a TraversalPath,
}

impl Site<'_> {
    pub fn owner(&self) -> Option<&Node> {
        self.flow.node(self.node)
    }

    pub fn location(&self) -> String {
        self.path.location(self.flow)
    }
}

/// Callbacks invoked by [`traverse`]. Every method has a no-op default, so a
/// visitor only overrides the property kinds it is interested in.
pub trait Visitor {
    #[allow(unused_variables)]
    fn enter_node(&mut self, flow: &Flow, node: NodeId, path: &TraversalPath) {}

    /// Called once for every property bound to a variable, before the
    /// kind-specific callback for the same property.
    #[allow(unused_variables)]
    fn visit_binding(&mut self, site: &Site<'_>, variable: &str) {}

    #[allow(unused_variables)]
    fn visit_flag(&mut self, site: &Site<'_>, value: bool) {}

    /// Called per element for array arguments, once for scalars (`index` is `None`).
    #[allow(unused_variables)]
    fn visit_argument(&mut self, site: &Site<'_>, index: Option<usize>, value: &Value) {}

    #[allow(unused_variables)]
    fn visit_component(&mut self, site: &Site<'_>, index: Option<usize>, child: NodeId) {}

    /// Decides whether to walk into `child`, reached through a component
    /// property declared against `declared`.
    #[allow(unused_variables)]
    fn descend(&mut self, flow: &Flow, declared: Interface, child: NodeId) -> bool {
        true
    }

    /// Disabled subtrees are skipped unless this returns true.
    fn include_disabled(&self) -> bool {
        false
    }
}

/// Walks `root` and every node reachable through its component properties,
/// depth-first and pre-order: properties in declaration order, array
/// elements in index order. The root itself is always visited.
pub fn traverse<V: Visitor + ?Sized>(flow: &Flow, root: NodeId, visitor: &mut V) {
    let mut path = TraversalPath::default();
    walk(flow, root, visitor, &mut path);
}

fn walk<V: Visitor + ?Sized>(flow: &Flow, id: NodeId, visitor: &mut V, path: &mut TraversalPath) {
    let Some(node) = flow.node(id) else {
        return;
    };
    trace!(node = %id, node_type = node.type_name(), "walk");
    path.push(Step::Node(id));
    visitor.enter_node(flow, id, path);

    for property in node.properties() {
        let name = property.name();
        if let Some(variable) = property.variable {
            path.push(Step::Property { name, index: None });
            visitor.visit_binding(&site(flow, id, property, path), variable);
            path.pop();
        }

        match property.kind() {
            PropertyKind::Flag => {
                path.push(Step::Property { name, index: None });
                let value = property.value.as_bool().unwrap_or(false);
                visitor.visit_flag(&site(flow, id, property, path), value);
                path.pop();
            }
            PropertyKind::Argument => {
                for (index, value) in property.value.elements() {
                    path.push(Step::Property { name, index });
                    visitor.visit_argument(&site(flow, id, property, path), index, value);
                    path.pop();
                }
            }
            PropertyKind::Component => {
                let Some(declared) = property.def.interface() else {
                    continue;
                };
                for (index, value) in property.value.elements() {
                    let Some(child) = value.as_node() else {
                        continue;
                    };
                    path.push(Step::Property { name, index });
                    visitor.visit_component(&site(flow, id, property, path), index, child);
                    let enabled = visitor.include_disabled()
                        || flow.node(child).is_some_and(|n| !n.is_disabled());
                    if enabled && visitor.descend(flow, declared, child) {
                        walk(flow, child, visitor, path);
                    }
                    path.pop();
                }
            }
        }
    }
    path.pop();
}

fn site<'a>(flow: &'a Flow, node: NodeId, property: Property<'a>, path: &'a TraversalPath) -> Site<'a> {
    Site {
        flow,
        node,
        property,
        path,
    }
}

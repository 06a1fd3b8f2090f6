pub mod catalog;
pub mod document;
pub mod markers;
pub mod property;
pub mod value;

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::trace;

use crate::error::PropertyError;
use catalog::{NodeType, ANNOTATIONS, NAME, SKIP};
use property::{Property, PropertyKind};
use value::Value;

/// Handle of a node inside a [`Flow`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}.{generation}")
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    variable: Option<String>,
}

/// A configurable unit of a flow: a step of the pipeline or a nested
/// settings object. Holds one slot per property its type declares.
#[derive(Debug, Clone)]
pub struct Node {
    node_type: &'static NodeType,
    parent: Option<NodeId>,
    slots: Vec<Slot>,
}

impl Node {
    pub fn node_type(&self) -> &'static NodeType {
        self.node_type
    }

    pub fn type_name(&self) -> &'static str {
        self.node_type.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn name(&self) -> &str {
        self.text_of(NAME)
    }

    pub fn annotations(&self) -> &str {
        self.text_of(ANNOTATIONS)
    }

    pub fn is_disabled(&self) -> bool {
        self.value(SKIP).and_then(Value::as_bool).unwrap_or(false)
    }

    fn text_of(&self, property: &str) -> &str {
        self.value(property).and_then(Value::as_str).unwrap_or("")
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = Property<'_>> {
        self.node_type
            .properties
            .iter()
            .zip(self.slots.iter())
            .map(|(def, slot)| Property {
                def,
                value: &slot.value,
                variable: slot.variable.as_deref(),
            })
    }

    pub fn property(&self, name: &str) -> Option<Property<'_>> {
        self.properties().find(|p| p.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        let (i, _) = self.node_type.property(name)?;
        Some(&self.slots[i].value)
    }

    pub fn has_bindings(&self) -> bool {
        self.slots.iter().any(|s| s.variable.is_some())
    }

    /// Targets of all component properties, in declaration and index order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        for property in self.properties() {
            if property.kind() == PropertyKind::Component {
                children.extend(property.value.elements().into_iter().filter_map(|(_, v)| v.as_node()));
            }
        }
        children
    }
}

/// A flow tree stored in an arena. Children are referenced by id and the
/// parent by id, so `clone` yields an independent structural copy.
#[derive(Debug, Clone, Default)]
pub struct Flow {
    arena: Arena<Node>,
    root: Option<NodeId>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.arena.iter().map(|(i, n)| (NodeId(i), n))
    }

    fn get(&self, id: NodeId) -> Result<&Node, PropertyError> {
        self.arena.get(id.0).ok_or(PropertyError::StaleNode)
    }

    /// Creates a detached node of the given type with default property values.
    /// Unset single components are filled with their declared default node.
    pub fn add_node(&mut self, type_name: &str) -> Result<NodeId, PropertyError> {
        let node_type = catalog::lookup(type_name)
            .ok_or_else(|| PropertyError::UnknownType(type_name.to_string()))?;
        let slots = node_type
            .properties
            .iter()
            .map(|def| Slot {
                value: def.default.clone(),
                variable: None,
            })
            .collect();
        let id = NodeId(self.arena.insert(Node {
            node_type,
            parent: None,
            slots,
        }));
        self.set_value(id, NAME, Value::text(node_type.name))?;

        for def in &node_type.properties {
            if def.kind != PropertyKind::Component || def.is_array() {
                continue;
            }
            if let Some(default_node) = def.default_node {
                let child = self.add_node(default_node)?;
                self.set_value(id, def.name, Value::Node(child))?;
            }
        }
        Ok(id)
    }

    /// Writes a full replacement value (scalar or whole array) into a property.
    ///
    /// Component writes re-parent the new targets and delete subtrees that
    /// are no longer referenced. The write is atomic: on error nothing changes.
    pub fn set_value(&mut self, id: NodeId, property: &str, value: Value) -> Result<(), PropertyError> {
        let node = self.get(id)?;
        let node_type = node.node_type;
        let (slot, def) = node_type.property(property).ok_or_else(|| PropertyError::UnknownProperty {
            node_type: node_type.name,
            property: property.to_string(),
        })?;
        if !def.writable {
            return Err(PropertyError::ReadOnly {
                node_type: node_type.name,
                property: def.name,
            });
        }
        if !def.accepts(&value) {
            return Err(PropertyError::TypeMismatch {
                node_type: node_type.name,
                property: def.name,
                expected: def.expected(),
            });
        }
        if def.name == NAME {
            validate_name(value.as_str().unwrap_or(""))?;
        }

        if def.kind == PropertyKind::Component {
            let interface = def.interface();
            let new_children: Vec<NodeId> = value
                .elements()
                .into_iter()
                .filter_map(|(_, v)| v.as_node())
                .collect();
            for &child in &new_children {
                let child_node = self.get(child)?;
                if Some(child_node.node_type.interface) != interface {
                    return Err(PropertyError::TypeMismatch {
                        node_type: node_type.name,
                        property: def.name,
                        expected: def.expected(),
                    });
                }
                if self.is_ancestor_or_self(child, id) {
                    return Err(PropertyError::Cycle {
                        child: self.full_name(child),
                    });
                }
                if child_node.parent.is_some_and(|p| p != id) {
                    return Err(PropertyError::Attached {
                        child: self.full_name(child),
                    });
                }
            }

            let old_children: Vec<NodeId> = self.get(id)?.slots[slot]
                .value
                .elements()
                .into_iter()
                .filter_map(|(_, v)| v.as_node())
                .collect();
            for &child in &new_children {
                if let Some(n) = self.arena.get_mut(child.0) {
                    n.parent = Some(id);
                }
            }
            for old in old_children {
                if !new_children.contains(&old) {
                    self.delete_subtree(old);
                }
            }
        }

        if let Some(node) = self.arena.get_mut(id.0) {
            trace!(node = %id, property = def.name, "set value");
            node.slots[slot].value = value;
        }
        Ok(())
    }

    /// Binds a property to a variable (or removes the binding with `None`).
    pub fn bind_variable(
        &mut self,
        id: NodeId,
        property: &str,
        variable: Option<String>,
    ) -> Result<(), PropertyError> {
        let node = self.get(id)?;
        let node_type = node.node_type;
        let (slot, def) = node_type.property(property).ok_or_else(|| PropertyError::UnknownProperty {
            node_type: node_type.name,
            property: property.to_string(),
        })?;
        if def.kind == PropertyKind::Component || !def.writable {
            return Err(PropertyError::ReadOnly {
                node_type: node_type.name,
                property: def.name,
            });
        }
        if let Some(node) = self.arena.get_mut(id.0) {
            node.slots[slot].variable = variable;
        }
        Ok(())
    }

    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), PropertyError> {
        self.set_value(id, NAME, Value::text(name))
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<(), PropertyError> {
        self.set_value(id, SKIP, Value::Bool(disabled))
    }

    /// Appends `child` to an array component property of `parent`.
    pub fn append_child(&mut self, parent: NodeId, property: &str, child: NodeId) -> Result<(), PropertyError> {
        let mut items = self.array_of(parent, property)?;
        items.push(Value::Node(child));
        self.set_value(parent, property, Value::Array(items))
    }

    fn array_of(&self, id: NodeId, property: &str) -> Result<Vec<Value>, PropertyError> {
        let node = self.get(id)?;
        match node.value(property) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => {
                let (_, def) = node.node_type.property(property).ok_or(PropertyError::StaleNode)?;
                Err(PropertyError::TypeMismatch {
                    node_type: node.node_type.name,
                    property: def.name,
                    expected: def.expected(),
                })
            }
            None => Err(PropertyError::UnknownProperty {
                node_type: node.node_type.name,
                property: property.to_string(),
            }),
        }
    }

    /// Locates the array component holding `child` below `parent`.
    pub fn position_of(&self, parent: NodeId, child: NodeId) -> Option<(&'static str, usize)> {
        let node = self.node(parent)?;
        for property in node.properties() {
            if property.kind() != PropertyKind::Component || !property.is_array() {
                continue;
            }
            if let Some(items) = property.value.as_array() {
                if let Some(i) = items.iter().position(|v| v.as_node() == Some(child)) {
                    return Some((property.name(), i));
                }
            }
        }
        None
    }

    /// Removes `child` from the array component of `parent` that holds it and
    /// deletes its subtree. Returns false if `child` is not held in an array.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, PropertyError> {
        self.replace_child(parent, child, Vec::new())
    }

    /// Replaces `child` inside an array component of `parent` with
    /// `replacements` (in order). Replacement nodes may currently be
    /// descendants of `child`; they are moved, everything else below
    /// `child` is deleted.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        replacements: Vec<NodeId>,
    ) -> Result<bool, PropertyError> {
        let Some((property, index)) = self.position_of(parent, child) else {
            return Ok(false);
        };
        for &r in &replacements {
            if !self.is_ancestor_or_self(child, r) {
                if let Some(p) = self.get(r)?.parent {
                    return Err(PropertyError::Attached {
                        child: format!("{} (parent {})", self.full_name(r), self.full_name(p)),
                    });
                }
            }
        }

        // Detach the moved nodes so deleting `child` leaves them alone.
        for &r in &replacements {
            if let Some(n) = self.arena.get_mut(r.0) {
                n.parent = None;
            }
        }
        let mut items = self.array_of(parent, property)?;
        items.splice(index..=index, replacements.iter().map(|&r| Value::Node(r)));
        self.set_value(parent, property, Value::Array(items))?;
        Ok(true)
    }

    /// Deletes a detached node and its subtree, e.g. one built for a write
    /// that then failed. Attached nodes and the root are left alone.
    pub fn discard(&mut self, id: NodeId) -> bool {
        let detached = self.node(id).is_some_and(|n| n.parent.is_none());
        if !detached || self.root == Some(id) {
            return false;
        }
        self.delete_subtree(id);
        true
    }

    /// Deletes `id` and every descendant still parented below it. Nodes that
    /// were moved elsewhere keep their new parent and survive.
    fn delete_subtree(&mut self, id: NodeId) {
        let children = match self.node(id) {
            Some(node) => node.children(),
            None => return,
        };
        for child in children {
            if self.node(child).is_some_and(|n| n.parent == Some(id)) {
                self.delete_subtree(child);
            }
        }
        self.arena.remove(id.0);
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == candidate {
                return true;
            }
            match self.node(id).and_then(|n| n.parent) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    /// Dotted path of actor names from the root down to `id`. Settings
    /// objects contribute no segment of their own.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.node(cur) else { break };
            if node.node_type.is_actor() {
                parts.push(node.name().to_string());
            }
            current = node.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Finds the actor addressed by a dotted path such as `Flow.Sequence.Display`.
    pub fn locate(&self, path: &str) -> Option<NodeId> {
        let mut parts = path.split('.');
        let mut current = self.root?;
        if self.node(current)?.name() != parts.next()? {
            return None;
        }
        for part in parts {
            let node = self.node(current)?;
            current = node
                .children()
                .into_iter()
                .find(|&c| self.node(c).is_some_and(|n| n.node_type.is_actor() && n.name() == part))?;
        }
        Some(current)
    }

    /// Derives a name for `wanted` that no sibling below `parent` (other
    /// than `ignore`) uses yet: `wanted`, `wanted-1`, `wanted-2`, ...
    pub fn unique_child_name(&self, parent: NodeId, wanted: &str, ignore: &[NodeId]) -> String {
        let taken: Vec<&str> = self
            .node(parent)
            .map(|p| p.children())
            .unwrap_or_default()
            .into_iter()
            .filter(|c| !ignore.contains(c))
            .filter_map(|c| self.node(c).map(|n| n.name()))
            .collect();
        if !taken.contains(&wanted) {
            return wanted.to_string();
        }
        (1..)
            .map(|i| format!("{wanted}-{i}"))
            .find(|candidate| !taken.contains(&candidate.as_str()))
            .unwrap_or_else(|| wanted.to_string())
    }
}

fn validate_name(name: &str) -> Result<(), PropertyError> {
    let reason = if name.is_empty() {
        "name must not be empty"
    } else if name.contains('.') || name.contains(':') {
        "name must not contain '.' or ':'"
    } else {
        return Ok(());
    };
    Err(PropertyError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence_flow() -> (Flow, NodeId, NodeId, NodeId) {
        let mut flow = Flow::new();
        let root = flow.add_node("Flow").unwrap();
        flow.set_root(root);
        let seq = flow.add_node("Sequence").unwrap();
        flow.append_child(root, "actors", seq).unwrap();
        let display = flow.add_node("Display").unwrap();
        flow.append_child(seq, "actors", display).unwrap();
        (flow, root, seq, display)
    }

    #[test]
    fn add_node_uses_type_name_and_defaults() {
        let mut flow = Flow::new();
        let id = flow.add_node("Display").unwrap();
        let node = flow.node(id).unwrap();
        assert_eq!(node.name(), "Display");
        assert_eq!(node.value("width"), Some(&Value::Integer(800)));
        assert!(!node.is_disabled());
    }

    #[test]
    fn add_node_creates_default_components() {
        let mut flow = Flow::new();
        let id = flow.add_node("IfThenElse").unwrap();
        let children = flow.node(id).unwrap().children();
        assert_eq!(children.len(), 3);
        let types: Vec<_> = children.iter().map(|&c| flow.node(c).unwrap().type_name()).collect();
        assert_eq!(types, vec!["ExpressionCondition", "Sequence", "Sequence"]);
        assert!(children.iter().all(|&c| flow.node(c).unwrap().parent() == Some(id)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut flow = Flow::new();
        assert_eq!(
            flow.add_node("Bogus"),
            Err(PropertyError::UnknownType("Bogus".into()))
        );
    }

    #[test]
    fn full_name_and_locate() {
        let (flow, _, _, display) = sequence_flow();
        assert_eq!(flow.full_name(display), "Flow.Sequence.Display");
        assert_eq!(flow.locate("Flow.Sequence.Display"), Some(display));
        assert_eq!(flow.locate("Flow.Nope"), None);
        assert_eq!(flow.locate("Other"), None);
    }

    #[test]
    fn set_value_checks_multiplicity_and_type() {
        let (mut flow, _, _, display) = sequence_flow();
        assert!(flow.set_value(display, "width", Value::Integer(10)).is_ok());
        assert!(matches!(
            flow.set_value(display, "width", Value::text("wide")),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            flow.set_value(display, "width", Value::Array(vec![])),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            flow.set_value(display, "nope", Value::Integer(1)),
            Err(PropertyError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn read_only_property_cannot_be_written() {
        let (mut flow, root, _, _) = sequence_flow();
        assert_eq!(
            flow.set_value(root, "format_version", Value::Integer(3)),
            Err(PropertyError::ReadOnly {
                node_type: "Flow",
                property: "format_version"
            })
        );
    }

    #[test]
    fn names_must_not_contain_separators() {
        let (mut flow, _, seq, _) = sequence_flow();
        assert!(matches!(flow.set_name(seq, "a.b"), Err(PropertyError::InvalidName { .. })));
        assert!(matches!(flow.set_name(seq, ""), Err(PropertyError::InvalidName { .. })));
        assert!(flow.set_name(seq, "Main").is_ok());
        assert_eq!(flow.node(seq).unwrap().name(), "Main");
    }

    #[test]
    fn component_interface_is_enforced() {
        let (mut flow, _, seq, _) = sequence_flow();
        let condition = flow.add_node("ExpressionCondition").unwrap();
        assert!(matches!(
            flow.append_child(seq, "actors", condition),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn cannot_nest_node_below_itself() {
        let (mut flow, root, seq, _) = sequence_flow();
        let inner = flow.add_node("Sequence").unwrap();
        flow.append_child(seq, "actors", inner).unwrap();
        assert!(matches!(
            flow.append_child(inner, "actors", seq),
            Err(PropertyError::Cycle { .. })
        ));
        assert!(matches!(
            flow.append_child(seq, "actors", seq),
            Err(PropertyError::Cycle { .. })
        ));
        assert_eq!(flow.node(seq).unwrap().parent(), Some(root));
    }

    #[test]
    fn remove_child_deletes_subtree() {
        let (mut flow, root, seq, display) = sequence_flow();
        assert_eq!(flow.len(), 3);
        assert!(flow.remove_child(root, seq).unwrap());
        assert_eq!(flow.len(), 1);
        assert!(flow.node(display).is_none());
        assert!(flow.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn discard_only_deletes_detached_subtrees() {
        let (mut flow, root, seq, display) = sequence_flow();
        assert!(!flow.discard(root));
        assert!(!flow.discard(seq));
        let orphan = flow.add_node("Sequence").unwrap();
        let inner = flow.add_node("Null").unwrap();
        flow.append_child(orphan, "actors", inner).unwrap();
        assert_eq!(flow.len(), 5);
        assert!(flow.discard(orphan));
        assert_eq!(flow.len(), 3);
        assert!(flow.node(inner).is_none());
        assert!(flow.node(display).is_some());
    }

    #[test]
    fn replace_child_moves_grandchildren() {
        let (mut flow, root, seq, display) = sequence_flow();
        let null = flow.add_node("Null").unwrap();
        flow.append_child(seq, "actors", null).unwrap();
        assert!(flow.replace_child(root, seq, vec![display, null]).unwrap());
        assert!(flow.node(seq).is_none());
        assert_eq!(flow.node(root).unwrap().children(), vec![display, null]);
        assert_eq!(flow.node(display).unwrap().parent(), Some(root));
        assert_eq!(flow.full_name(null), "Flow.Null");
    }

    #[test]
    fn clone_is_independent() {
        let (flow, _, _, display) = sequence_flow();
        let mut copy = flow.clone();
        copy.set_value(display, "title", Value::text("changed")).unwrap();
        assert_eq!(flow.node(display).unwrap().value("title"), Some(&Value::text("")));
        assert_eq!(copy.node(display).unwrap().value("title"), Some(&Value::text("changed")));
    }

    #[test]
    fn unique_child_names() {
        let (mut flow, root, seq, _) = sequence_flow();
        assert_eq!(flow.unique_child_name(root, "Sequence", &[]), "Sequence-1");
        assert_eq!(flow.unique_child_name(root, "Sequence", &[seq]), "Sequence");
        let other = flow.add_node("Sequence").unwrap();
        flow.set_name(other, "Sequence-1").unwrap();
        flow.append_child(root, "actors", other).unwrap();
        assert_eq!(flow.unique_child_name(root, "Sequence", &[]), "Sequence-2");
    }

    #[test]
    fn variable_binding() {
        let (mut flow, _, _, display) = sequence_flow();
        flow.bind_variable(display, "title", Some("caption".into())).unwrap();
        let node = flow.node(display).unwrap();
        assert_eq!(node.property("title").unwrap().variable, Some("caption"));
        assert!(node.has_bindings());
        assert!(flow.bind_variable(display, "nope", None).is_err());
    }
}

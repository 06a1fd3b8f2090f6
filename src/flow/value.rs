use std::fmt;

use super::NodeId;

/// The nested-node contracts a component property can be declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interface {
    Actor,
    Condition,
    Conversion,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interface::Actor => "Actor",
            Interface::Condition => "Condition",
            Interface::Conversion => "Conversion",
        };
        f.write_str(s)
    }
}

/// Independent name spaces that processors define, use and rename names in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Variables,
    Storage,
    Callables,
}

impl Namespace {
    /// The declared type of a property holding a reference into this namespace.
    pub fn reference_type(self) -> ValueType {
        match self {
            Namespace::Variables => ValueType::VariableName,
            Namespace::Storage => ValueType::StorageName,
            Namespace::Callables => ValueType::CallableRef,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Namespace::Variables => "variable",
            Namespace::Storage => "storage item",
            Namespace::Callables => "callable actor",
        }
    }
}

/// Declared base type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Integer,
    Float,
    Text,
    Annotation,
    Path,
    VariableName,
    StorageName,
    CallableRef,
    Component(Interface),
}

impl ValueType {
    /// Whether values of this type are stored as `Value::Text`.
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            ValueType::Text
                | ValueType::Annotation
                | ValueType::Path
                | ValueType::VariableName
                | ValueType::StorageName
                | ValueType::CallableRef
        )
    }

    /// Free text that may embed `@{..}` / `%{..}` markers.
    pub fn is_free_text(self) -> bool {
        matches!(self, ValueType::Text | ValueType::Annotation | ValueType::Path)
    }

    /// The namespace a reference-typed property points into.
    pub fn namespace(self) -> Option<Namespace> {
        match self {
            ValueType::VariableName => Some(Namespace::Variables),
            ValueType::StorageName => Some(Namespace::Storage),
            ValueType::CallableRef => Some(Namespace::Callables),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<ValueType> {
        let t = match name {
            "Boolean" => ValueType::Boolean,
            "Integer" => ValueType::Integer,
            "Float" => ValueType::Float,
            "Text" => ValueType::Text,
            "Annotation" => ValueType::Annotation,
            "Path" => ValueType::Path,
            "VariableName" => ValueType::VariableName,
            "StorageName" => ValueType::StorageName,
            "CallableRef" => ValueType::CallableRef,
            _ => return None,
        };
        Some(t)
    }

    /// Whether a single (non-array) value is acceptable for this type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Boolean, Value::Bool(_)) => true,
            (ValueType::Integer, Value::Integer(_)) => true,
            (ValueType::Float, Value::Float(_)) => true,
            (ValueType::Component(_), Value::Node(_)) => true,
            (t, Value::Text(_)) => t.is_textual(),
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => f.write_str("Boolean"),
            ValueType::Integer => f.write_str("Integer"),
            ValueType::Float => f.write_str("Float"),
            ValueType::Text => f.write_str("Text"),
            ValueType::Annotation => f.write_str("Annotation"),
            ValueType::Path => f.write_str("Path"),
            ValueType::VariableName => f.write_str("VariableName"),
            ValueType::StorageName => f.write_str("StorageName"),
            ValueType::CallableRef => f.write_str("CallableRef"),
            ValueType::Component(i) => write!(f, "{i}"),
        }
    }
}

/// A property value. Typed wrapper values (paths, storage names, ...) share
/// the `Text` representation; the declared base type carries their meaning.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Node(NodeId),
    Array(Vec<Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Iterates the value's elements: itself for scalars, the items for arrays.
    /// Each element is paired with its array index (`None` for scalars).
    pub fn elements(&self) -> Vec<(Option<usize>, &Value)> {
        match self {
            Value::Array(items) => items.iter().enumerate().map(|(i, v)| (Some(i), v)).collect(),
            other => vec![(None, other)],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Node(id) => write!(f, "{id}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

use super::value::{Interface, Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Boolean switch, never an array.
    Flag,
    /// Scalar or array of scalars.
    Argument,
    /// Nested configurable node(s).
    Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Single,
    Array,
}

/// Declaration of a settable property on a node type.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub base_type: ValueType,
    pub multiplicity: Multiplicity,
    /// Default for flags and arguments; ignored for components.
    pub default: Value,
    /// Node type instantiated for an unset single component.
    pub default_node: Option<&'static str>,
    /// The value declares a name in its namespace instead of referring to one.
    pub defines: bool,
    pub writable: bool,
}

impl PropertyDef {
    fn new(
        name: &'static str,
        kind: PropertyKind,
        base_type: ValueType,
        multiplicity: Multiplicity,
        default: Value,
    ) -> Self {
        Self {
            name,
            kind,
            base_type,
            multiplicity,
            default,
            default_node: None,
            defines: false,
            writable: true,
        }
    }

    pub fn flag(name: &'static str, default: bool) -> Self {
        Self::new(
            name,
            PropertyKind::Flag,
            ValueType::Boolean,
            Multiplicity::Single,
            Value::Bool(default),
        )
    }

    pub fn argument(name: &'static str, base_type: ValueType, default: Value) -> Self {
        Self::new(name, PropertyKind::Argument, base_type, Multiplicity::Single, default)
    }

    pub fn text(name: &'static str, base_type: ValueType) -> Self {
        Self::argument(name, base_type, Value::text(""))
    }

    pub fn array(name: &'static str, base_type: ValueType) -> Self {
        Self::new(
            name,
            PropertyKind::Argument,
            base_type,
            Multiplicity::Array,
            Value::Array(Vec::new()),
        )
    }

    pub fn component(name: &'static str, interface: Interface, default_node: &'static str) -> Self {
        let mut def = Self::new(
            name,
            PropertyKind::Component,
            ValueType::Component(interface),
            Multiplicity::Single,
            Value::Array(Vec::new()),
        );
        def.default_node = Some(default_node);
        def
    }

    pub fn components(name: &'static str, interface: Interface) -> Self {
        Self::new(
            name,
            PropertyKind::Component,
            ValueType::Component(interface),
            Multiplicity::Array,
            Value::Array(Vec::new()),
        )
    }

    pub fn defining(mut self) -> Self {
        self.defines = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn is_array(&self) -> bool {
        self.multiplicity == Multiplicity::Array
    }

    /// The interface of a component property.
    pub fn interface(&self) -> Option<Interface> {
        match self.base_type {
            ValueType::Component(i) => Some(i),
            _ => None,
        }
    }

    /// Checks shape and element types of a full replacement value.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.multiplicity, value) {
            (Multiplicity::Array, Value::Array(items)) => {
                items.iter().all(|v| self.base_type.accepts(v))
            }
            (Multiplicity::Array, _) => false,
            (Multiplicity::Single, Value::Array(_)) => false,
            (Multiplicity::Single, v) => self.base_type.accepts(v),
        }
    }

    pub fn expected(&self) -> String {
        match self.multiplicity {
            Multiplicity::Single => self.base_type.to_string(),
            Multiplicity::Array => format!("array of {}", self.base_type),
        }
    }
}

/// Read view of one property slot of a node.
#[derive(Debug, Clone, Copy)]
pub struct Property<'a> {
    pub def: &'a PropertyDef,
    pub value: &'a Value,
    /// Name of the variable this property is bound to, if any.
    pub variable: Option<&'a str>,
}

impl<'a> Property<'a> {
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.def.kind
    }

    pub fn base_type(&self) -> ValueType {
        self.def.base_type
    }

    pub fn is_array(&self) -> bool {
        self.def.is_array()
    }
}

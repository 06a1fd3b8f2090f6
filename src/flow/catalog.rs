use std::collections::HashMap;
use std::sync::LazyLock;

use super::property::PropertyDef;
use super::value::{Interface, Namespace, Value, ValueType};

/// Position of a node type in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Standalone,
    Source,
    Transformer,
    Sink,
    Control,
    /// Nested settings object (condition, conversion, ...), not an actor.
    Setting,
}

/// Descriptor of a concrete node type: its declared properties plus the
/// traits processors dispatch on.
#[derive(Debug)]
pub struct NodeType {
    pub name: &'static str,
    pub category: Category,
    pub interface: Interface,
    pub properties: Vec<PropertyDef>,
    /// Namespaces for which this type opens a private scope.
    pub isolates: &'static [Namespace],
    /// Children of this node are referenceable by name.
    pub callable_group: bool,
    pub breakpoint: bool,
    /// Pure pass-through container; wrapping it around a single child adds nothing.
    pub plain_sequence: bool,
    /// The `actors` array is an execution sequence that can absorb flattened children.
    pub ordered_children: bool,
}

pub const NAME: &str = "name";
pub const ANNOTATIONS: &str = "annotations";
pub const SKIP: &str = "skip";
pub const ACTORS: &str = "actors";

impl NodeType {
    fn new(name: &'static str, category: Category) -> Self {
        let interface = match category {
            Category::Setting => Interface::Condition,
            _ => Interface::Actor,
        };
        Self {
            name,
            category,
            interface,
            properties: vec![
                PropertyDef::text(NAME, ValueType::Text),
                PropertyDef::text(ANNOTATIONS, ValueType::Annotation),
                PropertyDef::flag(SKIP, false),
            ],
            isolates: &[],
            callable_group: false,
            breakpoint: false,
            plain_sequence: false,
            ordered_children: false,
        }
    }

    fn setting(name: &'static str, interface: Interface) -> Self {
        let mut t = Self::new(name, Category::Setting);
        t.interface = interface;
        t
    }

    fn handler(name: &'static str) -> Self {
        Self::new(name, Category::Control).with(PropertyDef::components(ACTORS, Interface::Actor))
    }

    fn with(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    fn sequence(mut self) -> Self {
        self.ordered_children = true;
        self
    }

    pub fn is_actor(&self) -> bool {
        self.interface == Interface::Actor
    }

    pub fn isolates(&self, namespace: Namespace) -> bool {
        self.isolates.contains(&namespace)
    }

    pub fn property(&self, name: &str) -> Option<(usize, &PropertyDef)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, def)| def.name == name)
    }
}

pub struct Catalog {
    types: Vec<NodeType>,
    index: HashMap<&'static str, usize>,
}

impl Catalog {
    fn register(&mut self, node_type: NodeType) {
        self.index.insert(node_type.name, self.types.len());
        self.types.push(node_type);
    }

    pub fn get(&self, name: &str) -> Option<&NodeType> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    pub fn types(&self) -> &[NodeType] {
        &self.types
    }
}

static CATALOG: LazyLock<Catalog> = LazyLock::new(builtin);

/// Look up a node type in the built-in catalog.
pub fn lookup(name: &str) -> Option<&'static NodeType> {
    CATALOG.get(name)
}

pub fn catalog() -> &'static Catalog {
    &CATALOG
}

fn builtin() -> Catalog {
    use Category::*;
    use ValueType as T;

    let mut c = Catalog {
        types: Vec::new(),
        index: HashMap::new(),
    };

    // control
    c.register(
        NodeType::handler("Flow")
            .sequence()
            .with(PropertyDef::argument("format_version", T::Integer, Value::Integer(2)).read_only()),
    );
    c.register(NodeType::handler("Standalones"));
    let mut callables = NodeType::handler("CallableActors");
    callables.callable_group = true;
    c.register(callables);
    let mut sequence = NodeType::handler("Sequence").sequence();
    sequence.plain_sequence = true;
    c.register(sequence);
    let mut sub_process = NodeType::handler("SubProcess").sequence();
    sub_process.plain_sequence = true;
    c.register(sub_process);
    c.register(NodeType::handler("Trigger").sequence());
    c.register(NodeType::handler("Tee").sequence());
    c.register(
        NodeType::new("Branch", Control).with(PropertyDef::components("branches", Interface::Actor)),
    );
    c.register(
        NodeType::new("IfThenElse", Control)
            .with(PropertyDef::component("condition", Interface::Condition, "ExpressionCondition"))
            .with(PropertyDef::component("then_actor", Interface::Actor, "Sequence"))
            .with(PropertyDef::component("else_actor", Interface::Actor, "Sequence")),
    );
    for name in ["LocalScopeSubProcess", "LocalScopeTrigger"] {
        let mut scope = NodeType::handler(name).sequence();
        scope.isolates = &[Namespace::Callables, Namespace::Storage];
        c.register(scope);
    }
    let mut breakpoint = NodeType::new("Breakpoint", Control).with(PropertyDef::component(
        "condition",
        Interface::Condition,
        "ExpressionCondition",
    ));
    breakpoint.breakpoint = true;
    c.register(breakpoint);

    // sources
    c.register(NodeType::new("StringConstants", Source).with(PropertyDef::array("strings", T::Text)));
    c.register(NodeType::new("FileSupplier", Source).with(PropertyDef::array("files", T::Path)));
    c.register(
        NodeType::new("StorageValue", Source).with(PropertyDef::text("storage_name", T::StorageName)),
    );
    c.register(
        NodeType::new("Variable", Source).with(PropertyDef::text("variable_name", T::VariableName)),
    );
    c.register(
        NodeType::new("CallableSource", Source).with(PropertyDef::text("callable", T::CallableRef)),
    );

    // transformers
    c.register(
        NodeType::new("SetStorageValue", Transformer)
            .with(PropertyDef::text("storage_name", T::StorageName).defining()),
    );
    c.register(
        NodeType::new("SetVariable", Transformer)
            .with(PropertyDef::text("variable_name", T::VariableName).defining())
            .with(PropertyDef::text("variable_value", T::Text)),
    );
    c.register(NodeType::new("Convert", Transformer).with(PropertyDef::component(
        "conversion",
        Interface::Conversion,
        "AnyToString",
    )));
    c.register(
        NodeType::new("MathExpression", Transformer).with(PropertyDef::text("expression", T::Text)),
    );
    c.register(
        NodeType::new("CallableTransformer", Transformer)
            .with(PropertyDef::text("callable", T::CallableRef)),
    );

    // sinks
    c.register(
        NodeType::new("Display", Sink)
            .with(PropertyDef::text("title", T::Text))
            .with(PropertyDef::argument("width", T::Integer, Value::Integer(800)))
            .with(PropertyDef::argument("height", T::Integer, Value::Integer(600))),
    );
    c.register(
        NodeType::new("DumpFile", Sink)
            .with(PropertyDef::text("output_file", T::Path))
            .with(PropertyDef::flag("append", false)),
    );
    c.register(NodeType::new("CallableSink", Sink).with(PropertyDef::text("callable", T::CallableRef)));
    c.register(NodeType::new("Null", Sink));

    // settings
    c.register(
        NodeType::setting("ExpressionCondition", Interface::Condition)
            .with(PropertyDef::text("expression", T::Text)),
    );
    c.register(
        NodeType::setting("HasStorageValue", Interface::Condition)
            .with(PropertyDef::text("storage_name", T::StorageName)),
    );
    c.register(
        NodeType::setting("VariableCondition", Interface::Condition)
            .with(PropertyDef::text("variable_name", T::VariableName))
            .with(PropertyDef::text("expected", T::Text)),
    );
    c.register(NodeType::setting("AnyToString", Interface::Conversion));
    c.register(
        NodeType::setting("StringReplace", Interface::Conversion)
            .with(PropertyDef::text("find", T::Text))
            .with(PropertyDef::text("replace", T::Text))
            .with(PropertyDef::flag("all", false)),
    );
    c.register(
        NodeType::setting("ChainedConversion", Interface::Conversion)
            .with(PropertyDef::components("conversions", Interface::Conversion)),
    );

    c
}

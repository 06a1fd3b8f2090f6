//! Persisted form of a flow: a nested document of node descriptions stored
//! as JSON or YAML.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::catalog::{ANNOTATIONS, NAME, SKIP};
use super::property::{PropertyDef, PropertyKind};
use super::value::{Value, ValueType};
use super::{Flow, NodeId};
use crate::error::{LoadError, PropertyError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub annotations: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyDoc>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One property value in a document. The variant is chosen by shape: an
/// object with `variable` is a binding, an object with `type` is a node, an
/// array of objects is a node list, anything else is a plain value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyDoc {
    Bound(Binding),
    Node(Box<NodeDoc>),
    Nodes(Vec<NodeDoc>),
    Plain(serde_json::Value),
}

impl PropertyDoc {
    pub fn from_json(json: serde_json::Value) -> Result<PropertyDoc, serde_json::Error> {
        let doc = match &json {
            serde_json::Value::Object(map) if map.contains_key("variable") => {
                PropertyDoc::Bound(serde_json::from_value(json)?)
            }
            serde_json::Value::Object(map) if map.contains_key("type") => {
                PropertyDoc::Node(Box::new(serde_json::from_value(json)?))
            }
            serde_json::Value::Array(items) if items.iter().all(serde_json::Value::is_object) => {
                PropertyDoc::Nodes(serde_json::from_value(json)?)
            }
            _ => PropertyDoc::Plain(json),
        };
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for PropertyDoc {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        PropertyDoc::from_json(json).map_err(serde::de::Error::custom)
    }
}

/// A property bound to a variable, optionally keeping its literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binding {
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yml" | "yaml") => Some(Format::Yaml),
            _ => None,
        }
    }
}

pub fn load(path: &Path) -> Result<Flow, LoadError> {
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, format)
}

pub fn parse(contents: &str, format: Format) -> Result<Flow, LoadError> {
    let doc: NodeDoc = match format {
        Format::Json => serde_json::from_str(contents)?,
        Format::Yaml => serde_yml::from_str(contents)?,
    };
    from_document(&doc)
}

pub fn save(flow: &Flow, path: &Path) -> Result<(), LoadError> {
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;
    let contents = render(flow, format)?;
    std::fs::write(path, contents).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn render(flow: &Flow, format: Format) -> Result<String, LoadError> {
    let root = flow.root().ok_or(LoadError::MissingRoot)?;
    let doc = to_document(flow, root)?;
    let mut out = match format {
        Format::Json => serde_json::to_string_pretty(&doc)?,
        Format::Yaml => serde_yml::to_string(&doc)?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Builds a flow whose root is the node described by `doc`.
pub fn from_document(doc: &NodeDoc) -> Result<Flow, LoadError> {
    let mut flow = Flow::new();
    let root = build(&mut flow, doc)?;
    flow.set_root(root);
    Ok(flow)
}

/// Adds the subtree described by `doc` to `flow` as a detached node.
pub(crate) fn build(flow: &mut Flow, doc: &NodeDoc) -> Result<NodeId, LoadError> {
    let id = flow.add_node(&doc.node_type)?;
    let node_type = flow.node(id).ok_or(PropertyError::StaleNode)?.node_type();
    if let Some(name) = &doc.name {
        flow.set_name(id, name)?;
    }
    flow.set_disabled(id, doc.skip)?;
    flow.set_value(id, ANNOTATIONS, Value::text(doc.annotations.as_str()))?;

    for (key, prop) in &doc.properties {
        let (_, def) = node_type.property(key).ok_or_else(|| PropertyError::UnknownProperty {
            node_type: node_type.name,
            property: key.clone(),
        })?;
        if !def.writable {
            continue;
        }
        let invalid = |reason: &str| LoadError::InvalidValue {
            node_type: node_type.name.to_string(),
            property: key.clone(),
            reason: reason.to_string(),
        };
        match prop {
            PropertyDoc::Bound(binding) => {
                if def.kind == PropertyKind::Component {
                    return Err(invalid("components cannot be bound to a variable"));
                }
                if let Some(literal) = &binding.value {
                    let value = from_json(def, literal).ok_or_else(|| invalid(&format!("expected {}", def.expected())))?;
                    flow.set_value(id, key, value)?;
                }
                flow.bind_variable(id, key, Some(binding.variable.clone()))?;
            }
            PropertyDoc::Node(child) => {
                if def.kind != PropertyKind::Component || def.is_array() {
                    return Err(invalid(&format!("expected {}", def.expected())));
                }
                let child = build(flow, child)?;
                flow.set_value(id, key, Value::Node(child))?;
            }
            PropertyDoc::Nodes(children) => {
                if !def.is_array() {
                    return Err(invalid(&format!("expected {}", def.expected())));
                }
                if def.kind != PropertyKind::Component && !children.is_empty() {
                    return Err(invalid(&format!("expected {}", def.expected())));
                }
                let mut items = Vec::with_capacity(children.len());
                for child in children {
                    items.push(Value::Node(build(flow, child)?));
                }
                flow.set_value(id, key, Value::Array(items))?;
            }
            PropertyDoc::Plain(json) => {
                if def.kind == PropertyKind::Component {
                    return Err(invalid("expected a node document"));
                }
                let value = from_json(def, json).ok_or_else(|| invalid(&format!("expected {}", def.expected())))?;
                flow.set_value(id, key, value)?;
            }
        }
    }
    Ok(id)
}

fn from_json(def: &PropertyDef, json: &serde_json::Value) -> Option<Value> {
    if def.is_array() {
        let items = json.as_array()?;
        return items
            .iter()
            .map(|item| scalar_from_json(def.base_type, item))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array);
    }
    scalar_from_json(def.base_type, json)
}

fn scalar_from_json(base_type: ValueType, json: &serde_json::Value) -> Option<Value> {
    match base_type {
        ValueType::Boolean => json.as_bool().map(Value::Bool),
        ValueType::Integer => json.as_i64().map(Value::Integer),
        ValueType::Float => json.as_f64().map(Value::Float),
        ValueType::Component(_) => None,
        _ => json.as_str().map(Value::text),
    }
}

/// Describes the subtree below `id` as a document.
pub fn to_document(flow: &Flow, id: NodeId) -> Result<NodeDoc, LoadError> {
    let node = flow.node(id).ok_or(PropertyError::StaleNode)?;
    let mut properties = BTreeMap::new();
    for property in node.properties() {
        if matches!(property.name(), NAME | ANNOTATIONS | SKIP) || !property.def.writable {
            continue;
        }
        let doc = if property.kind() == PropertyKind::Component {
            if property.is_array() {
                let mut children = Vec::new();
                for (_, v) in property.value.elements() {
                    if let Some(child) = v.as_node() {
                        children.push(to_document(flow, child)?);
                    }
                }
                PropertyDoc::Nodes(children)
            } else {
                match property.value.as_node() {
                    Some(child) => PropertyDoc::Node(Box::new(to_document(flow, child)?)),
                    None => continue,
                }
            }
        } else if let Some(variable) = property.variable {
            PropertyDoc::Bound(Binding {
                variable: variable.to_string(),
                value: Some(to_json(property.value)),
            })
        } else {
            PropertyDoc::Plain(to_json(property.value))
        };
        properties.insert(property.name().to_string(), doc);
    }
    Ok(NodeDoc {
        node_type: node.type_name().to_string(),
        name: Some(node.name().to_string()),
        skip: node.is_disabled(),
        annotations: node.annotations().to_string(),
        properties,
    })
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Node(_) => serde_json::Value::Null,
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
    }
}

/// Parses a JSON flow document. Mostly useful in tests.
pub fn from_json_str(json: &str) -> Result<Flow, LoadError> {
    parse(json, Format::Json)
}

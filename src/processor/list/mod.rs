pub mod annotation_tags;
pub mod callable_references;
pub mod find_text;
pub mod paths;
pub mod storage_names;
pub mod variables;

use crate::flow::markers;
use crate::flow::value::Namespace;
use crate::walker::Site;

use super::listing::{ListProcessor, Occurrence};
use super::registry::{Capability, ProcessorEntry, ProcessorRegistry};

pub fn register_all(registry: &mut ProcessorRegistry) {
    registry.register(ProcessorEntry {
        name: variables::ListAllVariables::NAME,
        description: variables::ListAllVariables::DESCRIPTION,
        capability: Capability::Listing,
        groups: &[],
        factory: |_| Ok(Box::new(ListProcessor::new(variables::ListAllVariables))),
    });
    registry.register(ProcessorEntry {
        name: storage_names::ListAllStorageNames::NAME,
        description: storage_names::ListAllStorageNames::DESCRIPTION,
        capability: Capability::Listing,
        groups: &[],
        factory: |_| Ok(Box::new(ListProcessor::new(storage_names::ListAllStorageNames))),
    });
    registry.register(ProcessorEntry {
        name: callable_references::ListCallableReferences::NAME,
        description: callable_references::ListCallableReferences::DESCRIPTION,
        capability: Capability::Listing,
        groups: &[],
        factory: |config| {
            let rule = callable_references::ListCallableReferences::from_config(config)?;
            Ok(Box::new(ListProcessor::new(rule)))
        },
    });
    registry.register(ProcessorEntry {
        name: find_text::FindText::NAME,
        description: find_text::FindText::DESCRIPTION,
        capability: Capability::Listing,
        groups: &[],
        factory: |config| Ok(Box::new(ListProcessor::new(find_text::FindText::from_config(config)?))),
    });
    registry.register(ProcessorEntry {
        name: annotation_tags::ListAnnotationTags::NAME,
        description: annotation_tags::ListAnnotationTags::DESCRIPTION,
        capability: Capability::Listing,
        groups: &[],
        factory: |config| {
            let rule = annotation_tags::ListAnnotationTags::from_config(config)?;
            Ok(Box::new(ListProcessor::new(rule)))
        },
    });
    registry.register(ProcessorEntry {
        name: paths::ListPaths::NAME,
        description: paths::ListPaths::DESCRIPTION,
        capability: Capability::Listing,
        groups: &[],
        factory: |_| Ok(Box::new(ListProcessor::new(paths::ListPaths))),
    });
}

/// Names of `namespace` referenced or declared by one occurrence: the bound
/// variable, a reference-typed value, or markers embedded in free text.
pub(crate) fn names_in(namespace: Namespace, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
    match occurrence {
        Occurrence::Binding(variable) if namespace == Namespace::Variables => vec![variable.to_string()],
        Occurrence::Binding(_) => Vec::new(),
        Occurrence::Element { value, .. } => {
            let Some(text) = value.as_str() else {
                return Vec::new();
            };
            let base_type = site.property.base_type();
            if base_type.namespace() == Some(namespace) {
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text.to_string()]
                }
            } else if base_type.is_free_text() {
                markers::extract(namespace, text).into_iter().map(String::from).collect()
            } else {
                Vec::new()
            }
        }
    }
}

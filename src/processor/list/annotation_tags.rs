use std::sync::LazyLock;

use regex::Regex;

use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::catalog::ANNOTATIONS;
use crate::processor::listing::{ListRule, Occurrence};
use crate::walker::Site;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_][A-Za-z0-9_\-]*)").unwrap());

/// Extracts `#tag` markers from annotation text, in order of appearance.
pub fn tags(text: &str) -> Vec<&str> {
    TAG.captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Lists `#tag` markers found in node annotations, one row per tag.
pub struct ListAnnotationTags {
    filter: Option<Regex>,
}

impl ListAnnotationTags {
    pub const NAME: &'static str = "ListAnnotationTags";
    pub const DESCRIPTION: &'static str = "Lists the tags found in annotations, optionally restricted by a regular expression.";
    pub const HEADER: &'static str = "Location\tTag";

    pub fn new(filter: Option<&str>) -> Result<Self, ConfigError> {
        let filter = filter
            .filter(|f| !f.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigError::invalid(Self::NAME, "Filter", e.to_string()))?;
        Ok(Self { filter })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        Self::new(config.get_str(Self::NAME, "Filter")?)
    }
}

impl ListRule for ListAnnotationTags {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn is_valid(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> bool {
        let Occurrence::Element { value, .. } = occurrence else {
            return false;
        };
        site.property.name() == ANNOTATIONS && value.as_str().is_some_and(|text| !tags(text).is_empty())
    }

    /// A node can carry tags that all fail the filter; it then yields no rows.
    fn display(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Vec<String> {
        let Occurrence::Element { value, .. } = occurrence else {
            return Vec::new();
        };
        let location = site.flow.full_name(site.node);
        tags(value.as_str().unwrap_or(""))
            .into_iter()
            .filter(|tag| self.filter.as_ref().is_none_or(|f| f.is_match(tag)))
            .map(|tag| format!("{location}\t{tag}"))
            .collect()
    }

    fn finalize(&self, list: &mut Vec<String>) {
        if !list.is_empty() {
            list.insert(0, Self::HEADER.to_string());
        }
    }
}

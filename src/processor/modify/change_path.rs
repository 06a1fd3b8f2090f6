use crate::config::ProcessorConfig;
use crate::error::ConfigError;
use crate::flow::value::{Value, ValueType};
use crate::processor::edit::{Rewrite, RewriteRule};
use crate::processor::listing::Occurrence;
use crate::walker::Site;

/// Replaces the leading `old` part of path values by `new`. The prefix only
/// matches whole path components: `/data` rewrites `/data/x` but not
/// `/database/x`.
pub struct ChangePath {
    old: String,
    new: String,
}

impl ChangePath {
    pub const NAME: &'static str = "ChangePath";
    pub const DESCRIPTION: &'static str = "Replaces a path prefix in all file and directory paths.";

    pub fn new(old: &str, new: &str) -> Result<Self, ConfigError> {
        if old.is_empty() {
            return Err(ConfigError::invalid(Self::NAME, "Old", "must not be empty"));
        }
        if old == new {
            return Err(ConfigError::invalid(Self::NAME, "New", "must differ from Old"));
        }
        Ok(Self {
            old: old.to_string(),
            new: new.to_string(),
        })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        let old = config.require_str(Self::NAME, "Old")?;
        let new = config.get_str(Self::NAME, "New")?.unwrap_or("");
        Self::new(old, new)
    }
}

impl RewriteRule for ChangePath {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    fn rewrite(&self, site: &Site<'_>, occurrence: &Occurrence<'_>) -> Option<Rewrite> {
        let Occurrence::Element { value, .. } = occurrence else {
            return None;
        };
        if site.property.base_type() != ValueType::Path {
            return None;
        }
        let rest = value.as_str()?.strip_prefix(self.old.as_str())?;
        if !(rest.is_empty() || rest.starts_with(is_separator) || self.old.ends_with(is_separator)) {
            return None;
        }
        Some(Rewrite::Value(Value::text(format!("{}{rest}", self.new))))
    }

    fn include_disabled(&self) -> bool {
        true
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

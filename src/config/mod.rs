use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yml::Value;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG: &str = ".flowproc.yml";

/// Per-processor configuration from `.flowproc.yml`.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub enabled: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub options: HashMap<String, Value>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include: Vec::new(),
            exclude: Vec::new(),
            options: HashMap::new(),
        }
    }
}

impl ProcessorConfig {
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn get_str(&self, processor: &str, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ConfigError::invalid(processor, key, "expected a string")),
        }
    }

    pub fn require_str(&self, processor: &str, key: &str) -> Result<&str, ConfigError> {
        self.get_str(processor, key)?
            .ok_or_else(|| ConfigError::missing(processor, key))
    }

    pub fn get_bool(&self, processor: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ConfigError::invalid(processor, key, "expected true or false")),
        }
    }

    pub fn get_string_list(&self, processor: &str, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Sequence(seq)) => seq
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(String::from)
                        .ok_or_else(|| ConfigError::invalid(processor, key, "expected a list of strings"))
                })
                .collect(),
            Some(_) => Err(ConfigError::invalid(processor, key, "expected a list of strings")),
        }
    }

    /// Whether this processor applies to `path` according to its
    /// Include/Exclude patterns.
    pub fn applies_to(&self, path: &Path) -> Result<bool> {
        let path = normalize(path);
        if !self.include.is_empty() && !compile_globset(&self.include)?.is_match(&path) {
            return Ok(false);
        }
        if !self.exclude.is_empty() && compile_globset(&self.exclude)?.is_match(&path) {
            return Ok(false);
        }
        Ok(true)
    }
}

/// Resolved configuration from `.flowproc.yml`.
#[derive(Debug, Default)]
pub struct ResolvedConfig {
    processor_configs: HashMap<String, ProcessorConfig>,
    global_excludes: Vec<String>,
    config_path: Option<PathBuf>,
}

/// Load config from the given path, or look for `.flowproc.yml` in the
/// current directory. Returns an empty config if the default file doesn't
/// exist; an explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if !default.exists() {
                return Ok(ResolvedConfig::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let mut config = parse_config(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    config.config_path = Some(config_path);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<ResolvedConfig> {
    let raw: Value = serde_yml::from_str(contents)?;
    let mut config = ResolvedConfig::default();

    if let Value::Mapping(map) = &raw {
        for (key, value) in map {
            let Some(key) = key.as_str() else {
                continue;
            };
            if key == "AllProcessors" {
                if let Some(excludes) = extract_string_list(value, "Exclude") {
                    config.global_excludes = excludes;
                }
                continue;
            }
            config
                .processor_configs
                .insert(key.to_string(), parse_processor_config(value));
        }
    }
    Ok(config)
}

impl ResolvedConfig {
    pub fn is_processor_enabled(&self, name: &str) -> bool {
        self.processor_configs.get(name).is_none_or(|c| c.enabled)
    }

    /// Whether the config names a processor explicitly.
    pub fn mentions(&self, name: &str) -> bool {
        self.processor_configs.contains_key(name)
    }

    pub fn processor_config(&self, name: &str) -> ProcessorConfig {
        self.processor_configs.get(name).cloned().unwrap_or_default()
    }

    pub fn processor_names(&self) -> impl Iterator<Item = &str> {
        self.processor_configs.keys().map(String::as_str)
    }

    /// Global exclude patterns from AllProcessors.Exclude.
    pub fn global_excludes(&self) -> &[String] {
        &self.global_excludes
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Applies a `Processor.Option=value` override; the value is read as a
    /// YAML scalar, so `true`, `3` and `foo` get their natural types.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::invalid("--set", assignment, reason);
        let (target, raw) = assignment
            .split_once('=')
            .ok_or_else(|| invalid("expected Processor.Option=value"))?;
        let (processor, option) = target
            .split_once('.')
            .ok_or_else(|| invalid("expected Processor.Option=value"))?;
        if processor.is_empty() || option.is_empty() {
            return Err(invalid("expected Processor.Option=value"));
        }
        let value: Value = serde_yml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        let entry = self.processor_configs.entry(processor.to_string()).or_default();
        match option {
            "Enabled" => entry.enabled = value.as_bool().ok_or_else(|| invalid("expected true or false"))?,
            "Include" => entry.include = value_to_string_list(&value).unwrap_or_else(|| vec![raw.to_string()]),
            "Exclude" => entry.exclude = value_to_string_list(&value).unwrap_or_else(|| vec![raw.to_string()]),
            _ => {
                entry.options.insert(option.to_string(), value);
            }
        }
        Ok(())
    }
}

fn parse_processor_config(value: &Value) -> ProcessorConfig {
    let mut config = ProcessorConfig::default();

    if let Value::Mapping(map) = value {
        for (k, v) in map {
            let Some(key) = k.as_str() else {
                continue;
            };
            match key {
                "Enabled" => {
                    if let Some(b) = v.as_bool() {
                        config.enabled = b;
                    }
                }
                "Exclude" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.exclude = list;
                    }
                }
                "Include" => {
                    if let Some(list) = value_to_string_list(v) {
                        config.include = list;
                    }
                }
                _ => {
                    config.options.insert(key.to_string(), v.clone());
                }
            }
        }
    }

    config
}

fn extract_string_list(value: &Value, key: &str) -> Option<Vec<String>> {
    value
        .as_mapping()?
        .get(&Value::String(key.to_string()))
        .and_then(value_to_string_list)
}

fn value_to_string_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence().map(|seq| {
        seq.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    })
}

pub(crate) fn compile_globset(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for g in globs {
        builder.add(Glob::new(g).with_context(|| format!("invalid glob: {g:?}"))?);
    }
    Ok(builder.build()?)
}

fn normalize(path: &Path) -> PathBuf {
    path.strip_prefix("./").unwrap_or(path).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_default_config_is_empty() {
        let config = ResolvedConfig::default();
        assert!(config.global_excludes().is_empty());
        assert!(config.is_processor_enabled("FindText"));
        assert!(config.config_path().is_none());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/.flowproc.yml"))).is_err());
    }

    #[test]
    fn all_processors_exclude() {
        let config = parse_config("AllProcessors:\n  Exclude:\n    - 'archive/**'\n    - 'tmp/**'\n").unwrap();
        assert_eq!(
            config.global_excludes(),
            &["archive/**".to_string(), "tmp/**".to_string()]
        );
    }

    #[test]
    fn processor_enabled_false() {
        let config = parse_config("CheckStorageUsage:\n  Enabled: false\n").unwrap();
        assert!(!config.is_processor_enabled("CheckStorageUsage"));
        assert!(config.is_processor_enabled("CheckVariableUsage"));
        assert!(config.mentions("CheckStorageUsage"));
    }

    #[test]
    fn processor_options_and_patterns() {
        let config = parse_config(
            "FindText:\n  Find: TODO\n  CaseSensitive: false\n  Exclude:\n    - 'legacy/**'\n",
        )
        .unwrap();
        let pc = config.processor_config("FindText");
        assert_eq!(pc.get_str("FindText", "Find").unwrap(), Some("TODO"));
        assert!(!pc.get_bool("FindText", "CaseSensitive", true).unwrap());
        assert_eq!(pc.exclude, vec!["legacy/**".to_string()]);
        assert!(!pc.applies_to(Path::new("legacy/a.flow.json")).unwrap());
        assert!(pc.applies_to(Path::new("./current/a.flow.json")).unwrap());
    }

    #[test]
    fn include_patterns_restrict() {
        let pc = ProcessorConfig {
            include: vec!["prod/**".into()],
            ..Default::default()
        };
        assert!(pc.applies_to(Path::new("prod/x.flow.json")).unwrap());
        assert!(!pc.applies_to(Path::new("dev/x.flow.json")).unwrap());
    }

    #[test]
    fn wrong_option_types_are_config_errors() {
        let pc = ProcessorConfig::default()
            .with_option("Find", 3)
            .with_option("Regex", "yes");
        assert!(matches!(
            pc.get_str("FindText", "Find"),
            Err(ConfigError::InvalidOption { .. })
        ));
        assert!(matches!(
            pc.get_bool("FindText", "Regex", false),
            Err(ConfigError::InvalidOption { .. })
        ));
        assert_eq!(
            pc.require_str("FindText", "Missing"),
            Err(ConfigError::missing("FindText", "Missing"))
        );
    }

    #[test]
    fn string_lists() {
        let pc = ProcessorConfig::default()
            .with_option("Predefined", Value::Sequence(vec!["a".into(), "b".into()]))
            .with_option("Single", "c");
        assert_eq!(pc.get_string_list("X", "Predefined").unwrap(), vec!["a", "b"]);
        assert_eq!(pc.get_string_list("X", "Single").unwrap(), vec!["c"]);
        assert!(pc.get_string_list("X", "Absent").unwrap().is_empty());
    }

    #[test]
    fn command_line_overrides() {
        let mut config = ResolvedConfig::default();
        config.apply_override("ChangeVariableName.Old=foo").unwrap();
        config.apply_override("ChangeVariableName.New=bar").unwrap();
        config.apply_override("CheckVariableUsage.OutputCounts=true").unwrap();
        config.apply_override("CheckStorageUsage.Enabled=false").unwrap();
        let pc = config.processor_config("ChangeVariableName");
        assert_eq!(pc.require_str("ChangeVariableName", "Old").unwrap(), "foo");
        let counts = config.processor_config("CheckVariableUsage");
        assert!(counts.get_bool("CheckVariableUsage", "OutputCounts", false).unwrap());
        assert!(!config.is_processor_enabled("CheckStorageUsage"));
        assert!(config.apply_override("no-equals").is_err());
        assert!(config.apply_override("NoDot=1").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        fs::write(&path, "ListPaths:\n  Enabled: false\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert!(!config.is_processor_enabled("ListPaths"));
        assert_eq!(config.config_path(), Some(path.as_path()));
    }
}

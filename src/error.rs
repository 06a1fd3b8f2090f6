use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems. These abort a `process` call (or the
/// construction of a processor) and are never collected into a processor's
/// error list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no flow root to process")]
    MissingRoot,

    #[error("unknown processor: {0}")]
    UnknownProcessor(String),

    #[error("{processor}: missing option {option}")]
    MissingOption {
        processor: String,
        option: String,
    },

    #[error("{processor}: invalid value for {option}: {reason}")]
    InvalidOption {
        processor: String,
        option: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(processor: &str, option: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOption {
            processor: processor.to_string(),
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(processor: &str, option: &str) -> Self {
        ConfigError::MissingOption {
            processor: processor.to_string(),
            option: option.to_string(),
        }
    }
}

/// Failure to read or write a single property slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    #[error("node no longer exists")]
    StaleNode,

    #[error("unknown node type: {0}")]
    UnknownType(String),

    #[error("{node_type} has no property {property}")]
    UnknownProperty {
        node_type: &'static str,
        property: String,
    },

    #[error("{node_type}.{property} expects {expected}")]
    TypeMismatch {
        node_type: &'static str,
        property: &'static str,
        expected: String,
    },

    #[error("{node_type}.{property} is read-only")]
    ReadOnly {
        node_type: &'static str,
        property: &'static str,
    },

    #[error("invalid node name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("{child} is already attached elsewhere")]
    Attached { child: String },

    #[error("{child} cannot be nested below itself")]
    Cycle { child: String },
}

/// Errors raised while loading or saving flow documents.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON flow: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML flow: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("unsupported flow file extension: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("flow has no root node")]
    MissingRoot,

    #[error("{node_type}.{property}: {reason}")]
    InvalidValue {
        node_type: String,
        property: String,
        reason: String,
    },

    #[error(transparent)]
    Property(#[from] PropertyError),
}

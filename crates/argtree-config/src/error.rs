//! Error types for loading task and tools definitions

use argtree_core::ConfigError;
use std::path::PathBuf;

/// Errors while reading, parsing or building a definition
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File extension not recognised
    #[error("unsupported definition format for {0} (expected .yaml, .yml, .json or .toml)")]
    UnsupportedFormat(PathBuf),

    /// YAML syntax or shape error
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax or shape error
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// `{ ref: name }` with no such named converter
    #[error("reference to unknown converter '{0}'")]
    UnknownReference(String),

    /// Parameter declared twice
    #[error("parameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    /// `choice` parameter without options
    #[error("choice parameter '{0}' has no options")]
    EmptyChoice(String),

    /// Tree failed validation
    #[error("invalid converter tree: {0}")]
    Build(#[from] ConfigError),
}

impl LoadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

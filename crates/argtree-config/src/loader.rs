//! File loading keyed by extension

use crate::build::CommandTask;
use crate::error::LoadError;
use crate::model::TaskDefinition;
use crate::tools::ToolsConfig;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Supported definition file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl FileFormat {
    /// Supported file extensions (without dot)
    pub const EXTENSIONS: &'static [&'static str] = &["yaml", "yml", "json", "toml"];

    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Deserialize `text` in this format
    pub fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T, LoadError> {
        Ok(match self {
            Self::Yaml => serde_yaml::from_str(text)?,
            Self::Json => serde_json::from_str(text)?,
            Self::Toml => toml::from_str(text)?,
        })
    }
}

/// Read and deserialize a definition file
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let format = FileFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::io_error(path, e))?;
    tracing::debug!(path = %path.display(), ?format, "loading definition");
    format.parse(&text)
}

/// Load a task definition without building it
pub fn load_definition(path: &Path) -> Result<TaskDefinition, LoadError> {
    load(path)
}

/// Load and build a task definition
pub fn load_task(path: &Path) -> Result<CommandTask, LoadError> {
    CommandTask::from_definition(&load_definition(path)?)
}

/// Load a tools configuration
pub fn load_tools(path: &Path) -> Result<ToolsConfig, LoadError> {
    load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn format_by_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.yaml")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.YML")).unwrap(), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a.toml")).unwrap(), FileFormat::Toml);
        assert!(matches!(
            FileFormat::from_path(Path::new("a.xml")),
            Err(LoadError::UnsupportedFormat(p)) if p == PathBuf::from("a.xml")
        ));
        assert!(FileFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_definition(Path::new("/nonexistent/task.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

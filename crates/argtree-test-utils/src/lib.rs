//! Testing utilities for argtree workspace
//!
//! Shared test helpers, fixtures, and a table-driven tool locator.

#![allow(missing_docs)]

use argtree_config::{CommandTask, FileFormat, TaskDefinition};
use argtree_core::{LocatorError, MemoryJob, PathRole, ToolLocator, ToolRequest};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Tool locator backed by a fixed table
///
/// Keys are `path`, `package/path` or `package/version/path`.
#[derive(Debug, Default)]
pub struct StaticToolLocator {
    tools: HashMap<String, PathBuf>,
    lookups: AtomicUsize,
}

impl StaticToolLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, path: &str, location: impl Into<PathBuf>) -> Self {
        self.tools.insert(path.to_string(), location.into());
        self
    }

    pub fn with_package_tool(
        mut self,
        package: &str,
        version: Option<&str>,
        path: &str,
        location: impl Into<PathBuf>,
    ) -> Self {
        let key = match version {
            Some(version) => format!("{package}/{version}/{path}"),
            None => format!("{package}/{path}"),
        };
        self.tools.insert(key, location.into());
        self
    }

    /// Number of `locate` calls so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl ToolLocator for StaticToolLocator {
    fn locate(&self, request: &ToolRequest<'_>) -> Result<PathBuf, LocatorError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let key = match (request.package, request.version) {
            (Some(package), Some(version)) => format!("{package}/{version}/{}", request.path),
            (Some(package), None) => format!("{package}/{}", request.path),
            (None, _) => request.path.to_string(),
        };
        self.tools
            .get(&key)
            .cloned()
            .ok_or_else(|| LocatorError::ToolNotFound {
                path: request.path.to_string(),
                searched: Vec::new(),
            })
    }
}

/// Jar-based search task touching most converter kinds
pub const SEARCH_TASK_YAML: &str = r#"
name: msgf-search
description: Peptide search with a jar-based engine
parameters:
  - { name: threads, type: int, default: 4 }
  - { name: precision, type: choice, options: [high, low], default: high }
  - { name: decoy, type: boolean, default: "no" }
  - { name: output_format, type: choice, options: [tsv, mzid] }
  - { name: verbose, type: boolean }
converters:
  spectra:
    type: path
    role: input
    key: spectra
    switch: s
command:
  type: list
  items:
    - type: jar
      archive: { path: MSGFPlus.jar, package: msgf, version: msgf_version }
      runtime_args:
        - -Xmx4g
    - { ref: spectra }
    - { type: path, role: input, key: database, switch: d }
    - { type: value-with-switch, param: threads, switch: thread }
    - type: enum-switch
      param: precision
      switches: { high: hr, low: lr }
    - type: if
      param: decoy
      then: { type: value-with-switch, param: decoy_prefix, switch: decoy, default: XXX }
      else: -nodecoy
    - type: choose
      param: output_format
      branches:
        tsv: { type: switch, name: tsv }
        mzid:
          type: list
          items:
            - { type: switch, name: mzid }
            - { type: path, role: output, key: mzid }
    - type: joined-flags
      flags:
        - { type: boolean-switch, param: verbose, switch: v }
        - { type: boolean-switch, param: quiet, switch: q }
        - { type: boolean-switch, param: keep, switch: k }
"#;

/// Minimal task in TOML
pub const ECHO_TASK_TOML: &str = r#"
name = "echo"

[command]
type = "list"
items = ["echo", { type = "value", param = "message" }]
"#;

/// Minimal task in JSON, joined switch format
pub const ECHO_TASK_JSON: &str = r#"{
  "name": "echo",
  "default_format": { "style": "joined", "marker": "--", "separator": "=" },
  "command": {
    "type": "list",
    "items": ["echo", { "type": "value-with-switch", "param": "message", "switch": "text" }]
  }
}"#;

pub fn search_definition() -> TaskDefinition {
    FileFormat::Yaml.parse(SEARCH_TASK_YAML).unwrap()
}

pub fn search_task() -> CommandTask {
    CommandTask::from_definition(&search_definition()).unwrap()
}

/// Locator with the runtime and archive of [`SEARCH_TASK_YAML`]
pub fn search_tools() -> StaticToolLocator {
    StaticToolLocator::new()
        .with_tool("java", "/usr/bin/java")
        .with_package_tool("msgf", None, "MSGFPlus.jar", "/opt/msgf/MSGFPlus.jar")
        .with_package_tool("msgf", Some("2019"), "MSGFPlus.jar", "/opt/msgf-2019/MSGFPlus.jar")
}

/// Job with inputs for [`SEARCH_TASK_YAML`]
pub fn search_job() -> MemoryJob {
    MemoryJob::new("search-1")
        .with_path(PathRole::Input, Some("spectra"), "run1.mzML")
        .with_path(PathRole::Input, Some("database"), "uniprot.fasta")
}

/// Write a definition file under `dir`
pub fn write_definition(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).unwrap();
    path
}

//! Job contract consumed by resolution
//!
//! A [`Job`] exposes string parameters, job-wide defaults, and the file
//! paths it contributes under each [`PathRole`]. [`MemoryJob`] is a plain
//! in-memory implementation.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Role under which a job contributes file paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathRole {
    /// Files the tool reads
    Input,

    /// Files the tool writes
    Output,

    /// Resources shipped with the task definition, relative to its module
    Module,
}

impl PathRole {
    /// Lowercase role name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Module => "module",
        }
    }
}

impl Display for PathRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            "module" => Ok(Self::Module),
            other => Err(format!("unknown path role '{other}'")),
        }
    }
}

/// Read-only view of one job, queried during resolution
pub trait Job {
    /// Identifier used in log output
    fn id(&self) -> &str;

    /// Job-supplied parameter value
    fn parameter(&self, name: &str) -> Option<&str>;

    /// Job-wide default, consulted after the converter's own default
    fn default_parameter(&self, _name: &str) -> Option<&str> {
        None
    }

    /// Paths contributed under `role`, optionally narrowed by `key`
    ///
    /// An empty list is a normal outcome, not an error.
    fn paths(&self, role: PathRole, key: Option<&str>) -> Result<Vec<String>, JobError>;

    /// Span that resolution of this job runs inside
    fn span(&self) -> tracing::Span {
        tracing::debug_span!("job", id = self.id())
    }
}

/// In-memory job
///
/// Paths registered without a key are returned for keyless lookups; keyed
/// lookups return only the paths registered under that key. Module-role
/// lookups join the key onto the module root.
#[derive(Debug, Clone, Default)]
pub struct MemoryJob {
    id: String,
    parameters: BTreeMap<String, String>,
    defaults: BTreeMap<String, String>,
    paths: HashMap<(PathRole, Option<String>), Vec<String>>,
    module_root: Option<PathBuf>,
}

impl MemoryJob {
    /// Create empty job
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set a parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    /// Set a job-wide default
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Register a path under a role (and optional key)
    #[must_use]
    pub fn with_path(
        mut self,
        role: PathRole,
        key: Option<&str>,
        path: impl Into<String>,
    ) -> Self {
        self.add_path(role, key, path);
        self
    }

    /// Set the directory module-role keys are resolved against
    #[must_use]
    pub fn with_module_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.module_root = Some(root.into());
        self
    }

    /// Set a parameter in place
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Register a path in place
    pub fn add_path(&mut self, role: PathRole, key: Option<&str>, path: impl Into<String>) {
        self.paths
            .entry((role, key.map(str::to_string)))
            .or_default()
            .push(path.into());
    }

    /// All job-supplied parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl Job for MemoryJob {
    fn id(&self) -> &str {
        &self.id
    }

    fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    fn default_parameter(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).map(String::as_str)
    }

    fn paths(&self, role: PathRole, key: Option<&str>) -> Result<Vec<String>, JobError> {
        let registered = self
            .paths
            .get(&(role, key.map(str::to_string)))
            .cloned()
            .unwrap_or_default();

        if role != PathRole::Module || !registered.is_empty() {
            return Ok(registered);
        }

        match key {
            None => Ok(Vec::new()),
            Some(relative) => {
                let root = self
                    .module_root
                    .as_ref()
                    .ok_or_else(|| JobError::NoModuleRoot(relative.to_string()))?;
                Ok(vec![root.join(relative).display().to_string()])
            }
        }
    }
}

//! Tools configuration

use argtree_core::{FsToolLocator, SoftwarePackage};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where installed tools live
///
/// Version keys must be strings; quote numeric versions in YAML
/// (`"5.0": tpp-5.0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Base directory for relative tool paths and package installs
    pub tools_dir: Option<PathBuf>,

    /// Also search `PATH` for unqualified tools
    pub search_path: bool,

    /// Installed software packages
    pub packages: IndexMap<String, PackageConfig>,
}

/// Installs of one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Version used when the job requests none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,

    /// Version → install directory
    #[serde(default)]
    pub installs: IndexMap<String, PathBuf>,
}

impl ToolsConfig {
    /// Override the tools directory
    #[must_use]
    pub fn with_tools_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.tools_dir = dir;
        }
        self
    }

    /// Build a filesystem locator
    #[must_use]
    pub fn locator(&self) -> FsToolLocator {
        let mut locator = FsToolLocator::new().search_path(self.search_path);
        if let Some(dir) = &self.tools_dir {
            locator = locator.with_tools_dir(dir);
        }
        for (name, config) in &self.packages {
            let mut package = SoftwarePackage::new();
            for (version, dir) in &config.installs {
                package = package.with_install(version, dir);
            }
            if let Some(version) = &config.default_version {
                package = package.with_default_version(version);
            }
            locator = locator.with_package(name, package);
        }
        locator
    }
}

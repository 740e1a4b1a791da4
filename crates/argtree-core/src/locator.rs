//! Tool locator contract
//!
//! Resolution asks a [`ToolLocator`] for the installed path of executables
//! and libraries. The locator is passed into every resolution call; nothing
//! here is global. [`FsToolLocator`] checks a tools directory, versioned
//! package installs, and optionally `PATH`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Logical tool lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRequest<'a> {
    /// Tool path hint, relative to the package or tools directory
    pub path: &'a str,

    /// Software package the tool ships in
    pub package: Option<&'a str>,

    /// Requested package version
    pub version: Option<&'a str>,
}

impl<'a> ToolRequest<'a> {
    /// Request a tool by path only
    #[inline]
    #[must_use]
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            package: None,
            version: None,
        }
    }

    /// Set the package
    #[inline]
    #[must_use]
    pub fn in_package(mut self, package: Option<&'a str>) -> Self {
        self.package = package;
        self
    }

    /// Set the version
    #[inline]
    #[must_use]
    pub fn at_version(mut self, version: Option<&'a str>) -> Self {
        self.version = version;
        self
    }
}

impl fmt::Display for ToolRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)?;
        if let Some(package) = self.package {
            write!(f, " ({package}")?;
            if let Some(version) = self.version {
                write!(f, " {version}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Tool lookup failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// No installed file matched the request
    #[error("tool '{path}' not found (searched {} location(s))", searched.len())]
    ToolNotFound {
        /// Requested path hint
        path: String,
        /// Candidate locations checked
        searched: Vec<PathBuf>,
    },

    /// Package is not configured
    #[error("software package '{package}' is not installed")]
    UnknownPackage {
        /// Package name
        package: String,
    },

    /// Package exists but not at the requested version
    #[error("version '{version}' of package '{package}' is not installed")]
    UnknownVersion {
        /// Package name
        package: String,
        /// Requested version
        version: String,
    },

    /// Package has several installs and no default version
    #[error("package '{package}' has no default version; one must be requested")]
    AmbiguousVersion {
        /// Package name
        package: String,
    },
}

/// Resolves logical tool names to installed paths
pub trait ToolLocator: Send + Sync + fmt::Debug {
    /// Locate the tool described by `request`
    fn locate(&self, request: &ToolRequest<'_>) -> Result<PathBuf, LocatorError>;
}

/// Installs of one software package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftwarePackage {
    /// Version used when none is requested
    pub default_version: Option<String>,

    /// Version → install directory
    pub installs: BTreeMap<String, PathBuf>,
}

impl SoftwarePackage {
    /// Create package with no installs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an install
    #[must_use]
    pub fn with_install(mut self, version: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.installs.insert(version.into(), dir.into());
        self
    }

    /// Set the default version
    #[must_use]
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = Some(version.into());
        self
    }

    fn install_dir(&self, package: &str, version: Option<&str>) -> Result<&Path, LocatorError> {
        let Some(version) = version.or(self.default_version.as_deref()) else {
            // a single install needs no default
            return match self.installs.values().next() {
                Some(dir) if self.installs.len() == 1 => Ok(dir),
                _ => Err(LocatorError::AmbiguousVersion {
                    package: package.to_string(),
                }),
            };
        };
        self.installs
            .get(version)
            .map(PathBuf::as_path)
            .ok_or_else(|| LocatorError::UnknownVersion {
                package: package.to_string(),
                version: version.to_string(),
            })
    }
}

/// Filesystem-backed tool locator
///
/// # Lookup
/// - with a package: `<install dir for version>/<path>`; relative install
///   dirs are taken from the tools directory
/// - without a package: absolute paths as-is, otherwise
///   `<tools dir>/<path>`, then each `PATH` entry when enabled
///
/// A candidate only matches if it exists on disk.
#[derive(Debug, Clone, Default)]
pub struct FsToolLocator {
    tools_dir: Option<PathBuf>,
    packages: HashMap<String, SoftwarePackage>,
    search_path: bool,
}

impl FsToolLocator {
    /// Create locator with no tools directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tools directory
    #[must_use]
    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = Some(dir.into());
        self
    }

    /// Register a package
    #[must_use]
    pub fn with_package(mut self, name: impl Into<String>, package: SoftwarePackage) -> Self {
        self.packages.insert(name.into(), package);
        self
    }

    /// Also search `PATH` for unqualified tools
    #[must_use]
    pub fn search_path(mut self, enabled: bool) -> Self {
        self.search_path = enabled;
        self
    }

    /// Tools directory
    #[inline]
    #[must_use]
    pub fn tools_dir(&self) -> Option<&Path> {
        self.tools_dir.as_deref()
    }

    fn under_tools_dir(&self, path: &Path) -> PathBuf {
        match &self.tools_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn candidates(&self, request: &ToolRequest<'_>) -> Result<Vec<PathBuf>, LocatorError> {
        let hint = Path::new(request.path);

        if let Some(name) = request.package {
            let package = self
                .packages
                .get(name)
                .ok_or_else(|| LocatorError::UnknownPackage {
                    package: name.to_string(),
                })?;
            let dir = self.under_tools_dir(package.install_dir(name, request.version)?);
            return Ok(vec![dir.join(hint)]);
        }

        if hint.is_absolute() {
            return Ok(vec![hint.to_path_buf()]);
        }

        let mut candidates = Vec::new();
        if let Some(dir) = &self.tools_dir {
            candidates.push(dir.join(hint));
        }
        if self.search_path && hint.components().count() == 1 {
            if let Some(path_var) = std::env::var_os("PATH") {
                candidates.extend(std::env::split_paths(&path_var).map(|d| d.join(hint)));
            }
        }
        Ok(candidates)
    }
}

impl ToolLocator for FsToolLocator {
    fn locate(&self, request: &ToolRequest<'_>) -> Result<PathBuf, LocatorError> {
        let searched = self.candidates(request)?;
        if let Some(found) = searched.iter().find(|c| c.exists()) {
            tracing::trace!(tool = %request, path = %found.display(), "located tool");
            return Ok(found.clone());
        }
        Err(LocatorError::ToolNotFound {
            path: request.path.to_string(),
            searched,
        })
    }
}

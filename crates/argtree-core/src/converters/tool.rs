//! Located executables and archives

use crate::error::ResolveError;
use crate::locator::ToolRequest;
use crate::param::ParamRef;
use crate::resolve::{Resolution, VisitedSet};
use crate::tree::NodeId;

/// Token placed between the runtime and the archive path
pub const JAR_MARKER: &str = "-jar";

/// Logical tool reference handed to the locator
///
/// The version, when configured, is read from a job parameter at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    path: String,
    package: Option<String>,
    version: Option<ParamRef>,
}

impl ToolSpec {
    /// Tool by path hint
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package: None,
            version: None,
        }
    }

    /// Look the tool up inside a software package
    #[must_use]
    pub fn in_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Read the package version from a job parameter
    #[must_use]
    pub fn with_version(mut self, param: ParamRef) -> Self {
        self.version = Some(param);
        self
    }

    /// Path hint
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Package name
    #[inline]
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Version parameter
    #[inline]
    #[must_use]
    pub fn version(&self) -> Option<&ParamRef> {
        self.version.as_ref()
    }

    /// Resolve to an installed path
    pub fn locate(&self, cx: &Resolution<'_>) -> Result<String, ResolveError> {
        let version = self
            .version
            .as_ref()
            .and_then(|param| param.lookup_non_empty(cx.job()));
        let request = ToolRequest::new(&self.path)
            .in_package(self.package.as_deref())
            .at_version(version);
        let path = cx.locate(&request)?;
        Ok(path.display().to_string())
    }
}

/// Located executable as one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExeToArgs {
    tool: ToolSpec,
}

impl ExeToArgs {
    /// Create converter
    #[inline]
    #[must_use]
    pub fn new(tool: ToolSpec) -> Self {
        Self { tool }
    }

    /// Tool looked up
    #[inline]
    #[must_use]
    pub fn tool(&self) -> &ToolSpec {
        &self.tool
    }

    pub(super) fn convert(&self, cx: &Resolution<'_>) -> Result<Vec<String>, ResolveError> {
        Ok(vec![self.tool.locate(cx)?])
    }
}

/// Runtime interpreter running an archive
///
/// Emits `[runtime, runtime args..., -jar, archive]`. Runtime arguments are
/// other nodes of the tree, resolved in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarToArgs {
    archive: ToolSpec,
    runtime: ToolSpec,
    runtime_args: Vec<NodeId>,
}

impl JarToArgs {
    /// Run `archive` with the `java` runtime
    #[must_use]
    pub fn new(archive: ToolSpec) -> Self {
        Self {
            archive,
            runtime: ToolSpec::new("java"),
            runtime_args: Vec::new(),
        }
    }

    /// Replace the runtime
    #[must_use]
    pub fn with_runtime(mut self, runtime: ToolSpec) -> Self {
        self.runtime = runtime;
        self
    }

    /// Nodes resolved between the runtime and the `-jar` marker
    #[must_use]
    pub fn with_runtime_args(mut self, args: Vec<NodeId>) -> Self {
        self.runtime_args = args;
        self
    }

    /// Archive looked up
    #[inline]
    #[must_use]
    pub fn archive(&self) -> &ToolSpec {
        &self.archive
    }

    /// Runtime looked up
    #[inline]
    #[must_use]
    pub fn runtime(&self) -> &ToolSpec {
        &self.runtime
    }

    /// Runtime argument nodes
    #[inline]
    #[must_use]
    pub fn runtime_args(&self) -> &[NodeId] {
        &self.runtime_args
    }

    pub(super) fn convert(
        &self,
        cx: &Resolution<'_>,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        let mut args = vec![self.runtime.locate(cx)?];
        args.extend(cx.resolve_all(&self.runtime_args, visited)?);
        args.push(JAR_MARKER.to_string());
        args.push(self.archive.locate(cx)?);
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{Literal, ValueWithSwitch};
    use crate::job::MemoryJob;
    use crate::locator::{LocatorError, ToolLocator};
    use crate::tree::TreeBuilder;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Maps `path` or `package/version/path` to a fixed location
    #[derive(Debug, Default)]
    struct Table(HashMap<String, PathBuf>);

    impl Table {
        fn with(mut self, key: &str, path: &str) -> Self {
            self.0.insert(key.to_string(), PathBuf::from(path));
            self
        }
    }

    impl ToolLocator for Table {
        fn locate(&self, request: &ToolRequest<'_>) -> Result<PathBuf, LocatorError> {
            let key = match (request.package, request.version) {
                (Some(p), Some(v)) => format!("{p}/{v}/{}", request.path),
                (Some(p), None) => format!("{p}/{}", request.path),
                _ => request.path.to_string(),
            };
            self.0.get(&key).cloned().ok_or(LocatorError::ToolNotFound {
                path: request.path.to_string(),
                searched: Vec::new(),
            })
        }
    }

    #[test]
    fn exe_reads_version_param() {
        let tools = Table::default()
            .with("tpp/5.0/bin/xinteract", "/opt/tpp5/bin/xinteract")
            .with("tpp/bin/xinteract", "/opt/tpp/bin/xinteract");
        let exe = ExeToArgs::new(
            ToolSpec::new("bin/xinteract")
                .in_package("tpp")
                .with_version(ParamRef::new("tpp_version")),
        );

        let mut b = TreeBuilder::new();
        let root = b.add(exe);
        let tree = b.build(root).unwrap();

        let job = MemoryJob::new("j").with_param("tpp_version", "5.0");
        assert_eq!(tree.resolve(&job, &tools).unwrap(), vec!["/opt/tpp5/bin/xinteract"]);
        assert_eq!(
            tree.resolve(&MemoryJob::new("j"), &tools).unwrap(),
            vec!["/opt/tpp/bin/xinteract"]
        );
    }

    #[test]
    fn jar_layout() {
        let tools = Table::default()
            .with("java", "/usr/bin/java")
            .with("lib/msgf.jar", "/tools/lib/msgf.jar");

        let mut b = TreeBuilder::new();
        let heap = b.add(Literal::new("-Xmx4g"));
        let mem = b.add_formatted(
            ValueWithSwitch::new(ParamRef::new("stack"), "Xss"),
            crate::format::SwitchFormat::joined(""),
        );
        let root = b.add(
            JarToArgs::new(ToolSpec::new("lib/msgf.jar")).with_runtime_args(vec![heap, mem]),
        );
        let tree = b.build(root).unwrap();

        let job = MemoryJob::new("j").with_param("stack", "8m");
        assert_eq!(
            tree.resolve(&job, &tools).unwrap(),
            vec!["/usr/bin/java", "-Xmx4g", "-Xss8m", "-jar", "/tools/lib/msgf.jar"]
        );
    }

    #[test]
    fn jar_missing_archive_fails() {
        let tools = Table::default().with("java", "/usr/bin/java");
        let mut b = TreeBuilder::new();
        let root = b.add(JarToArgs::new(ToolSpec::new("lib/missing.jar")));
        let err = b.build(root).unwrap().resolve(&MemoryJob::new("j"), &tools).unwrap_err();
        assert!(err.is_tool_failure());
    }
}

//! Role-based job path converter

use crate::error::ResolveError;
use crate::job::PathRole;
use crate::resolve::Resolution;
use crate::tree::NodeId;

/// Job file paths for one role
///
/// Every non-empty path becomes one token, or a switch/value pair when a
/// switch is configured. No paths means no tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathArgs {
    role: PathRole,
    key: Option<String>,
    switch: Option<String>,
}

impl PathArgs {
    /// All paths of `role`
    #[inline]
    #[must_use]
    pub fn new(role: PathRole) -> Self {
        Self {
            role,
            key: None,
            switch: None,
        }
    }

    /// Narrow to paths registered under `key`
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Precede each path with `switch`
    #[must_use]
    pub fn with_switch(mut self, switch: impl Into<String>) -> Self {
        self.switch = Some(switch.into());
        self
    }

    /// Path role
    #[inline]
    #[must_use]
    pub fn role(&self) -> PathRole {
        self.role
    }

    /// Lookup key
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Switch name
    #[inline]
    #[must_use]
    pub fn switch(&self) -> Option<&str> {
        self.switch.as_deref()
    }

    pub(super) fn convert(&self, id: NodeId, cx: &Resolution<'_>) -> Result<Vec<String>, ResolveError> {
        let paths = cx
            .job()
            .paths(self.role, self.key.as_deref())
            .map_err(|source| ResolveError::paths(self.role, source))?;
        if paths.is_empty() {
            tracing::debug!(role = %self.role, key = self.key.as_deref(), "no paths for role");
        }

        let format = cx.format(id);
        let mut args = Vec::with_capacity(paths.len());
        for path in paths.iter().filter(|p| !p.is_empty()) {
            match &self.switch {
                Some(switch) => args.extend(format.format(switch, Some(path))),
                None => args.push(path.clone()),
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SwitchFormat;
    use crate::job::MemoryJob;
    use crate::locator::{LocatorError, ToolLocator, ToolRequest};
    use crate::tree::TreeBuilder;
    use std::path::PathBuf;

    #[derive(Debug)]
    struct NoTools;

    impl ToolLocator for NoTools {
        fn locate(&self, request: &ToolRequest<'_>) -> Result<PathBuf, LocatorError> {
            Err(LocatorError::ToolNotFound {
                path: request.path.to_string(),
                searched: Vec::new(),
            })
        }
    }

    fn job() -> MemoryJob {
        MemoryJob::new("paths")
            .with_path(PathRole::Input, None, "a.mzML")
            .with_path(PathRole::Input, None, "")
            .with_path(PathRole::Input, None, "b.mzML")
            .with_path(PathRole::Output, Some("report"), "out/report.tsv")
    }

    #[test]
    fn bare_paths_skip_empty() {
        let mut b = TreeBuilder::new();
        let root = b.add(PathArgs::new(PathRole::Input));
        let args = b.build(root).unwrap().resolve(&job(), &NoTools).unwrap();
        assert_eq!(args, vec!["a.mzML", "b.mzML"]);
    }

    #[test]
    fn switched_paths_follow_format() {
        let mut b = TreeBuilder::new();
        let root = b.add_formatted(
            PathArgs::new(PathRole::Output).with_key("report").with_switch("out"),
            SwitchFormat::joined("="),
        );
        let args = b.build(root).unwrap().resolve(&job(), &NoTools).unwrap();
        assert_eq!(args, vec!["-out=out/report.tsv"]);
    }

    #[test]
    fn no_paths_no_tokens() {
        let mut b = TreeBuilder::new();
        let root = b.add(PathArgs::new(PathRole::Output));
        let args = b.build(root).unwrap().resolve(&job(), &NoTools).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn job_failure_names_role() {
        let mut b = TreeBuilder::new();
        let root = b.add(PathArgs::new(PathRole::Module).with_key("run.R"));
        let err = b
            .build(root)
            .unwrap()
            .resolve(&MemoryJob::new("no-root"), &NoTools)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Paths { role: PathRole::Module, .. }));
    }
}

//! Composite converters
//!
//! Composites refer to other nodes by id and resolve them through the
//! shared [`Resolution`], so every child entry goes through the visited-set
//! check. Any child error aborts the composite; no partial list is returned.

use crate::converters::Converter;
use crate::error::ResolveError;
use crate::param::{ParamRef, ParamValidator};
use crate::resolve::{Resolution, VisitedSet};
use crate::tree::NodeId;
use indexmap::IndexMap;

/// Ordered concatenation of children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListToArgs {
    children: Vec<NodeId>,
}

impl ListToArgs {
    /// Create list
    #[inline]
    #[must_use]
    pub fn new(children: Vec<NodeId>) -> Self {
        Self { children }
    }

    /// Children in order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(super) fn convert(
        &self,
        cx: &Resolution<'_>,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        cx.resolve_all(&self.children, visited)
    }
}

/// Yes/no choice between two subtrees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanBranch {
    param: ParamRef,
    then: NodeId,
    otherwise: NodeId,
}

impl BooleanBranch {
    /// Resolve `then` on yes, `otherwise` on no
    #[must_use]
    pub fn new(param: ParamRef, then: NodeId, otherwise: NodeId) -> Self {
        Self {
            param: param.with_validator(ParamValidator::YesNo),
            then,
            otherwise,
        }
    }

    /// Discriminating parameter
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    /// Subtree taken on yes
    #[inline]
    #[must_use]
    pub fn then(&self) -> NodeId {
        self.then
    }

    /// Subtree taken on no
    #[inline]
    #[must_use]
    pub fn otherwise(&self) -> NodeId {
        self.otherwise
    }

    pub(super) fn convert(
        &self,
        cx: &Resolution<'_>,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        let branch = if self.param.lookup_yes_no(cx.job())?.is_yes() {
            self.then
        } else {
            self.otherwise
        };
        cx.resolve(branch, visited)
    }
}

/// Keyed choice among subtrees
///
/// An unmapped or absent value selects nothing and yields an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumBranch {
    param: ParamRef,
    branches: IndexMap<String, NodeId>,
}

impl EnumBranch {
    /// Create branch from `key → subtree` pairs
    #[must_use]
    pub fn new<K: Into<String>>(param: ParamRef, branches: impl IntoIterator<Item = (K, NodeId)>) -> Self {
        Self {
            param,
            branches: branches.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Discriminating parameter
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    /// Key → subtree mapping
    #[inline]
    #[must_use]
    pub fn branches(&self) -> &IndexMap<String, NodeId> {
        &self.branches
    }

    pub(super) fn convert(
        &self,
        cx: &Resolution<'_>,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        let selected = self
            .param
            .lookup_non_empty(cx.job())
            .and_then(|key| self.branches.get(key).map(|&id| (key, id)));
        match selected {
            Some((key, id)) => {
                tracing::trace!(param = self.param.name(), key, "branch selected");
                cx.resolve(id, visited)
            }
            None => {
                tracing::debug!(param = self.param.name(), "no branch selected");
                Ok(Vec::new())
            }
        }
    }
}

/// Boolean switches merged into one short-flag token
///
/// Enabled children contribute only their bare switch names, in order; the
/// concatenation is formatted once with this node's effective format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedFlags {
    flags: Vec<NodeId>,
}

impl JoinedFlags {
    /// Create from boolean-switch nodes
    #[inline]
    #[must_use]
    pub fn new(flags: Vec<NodeId>) -> Self {
        Self { flags }
    }

    /// Flag nodes in order
    #[inline]
    #[must_use]
    pub fn flags(&self) -> &[NodeId] {
        &self.flags
    }

    pub(super) fn convert(
        &self,
        id: NodeId,
        cx: &Resolution<'_>,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        let mut combined = String::new();
        for &child in &self.flags {
            let _guard = visited.enter(child)?;
            // children are checked to be boolean switches at build time
            let Some(Converter::BooleanToSwitch(flag)) = cx.tree().converter(child) else {
                return Err(ResolveError::UnknownNode(child));
            };
            if flag.is_enabled(cx.job()) {
                combined.push_str(flag.switch());
            }
        }

        if combined.is_empty() {
            tracing::debug!(node = %id, "no joined flag enabled");
            return Ok(Vec::new());
        }
        Ok(cx.format(id).format(&combined, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{BooleanToSwitch, Literal, SwitchFlag};
    use crate::error::ConfigError;
    use crate::format::SwitchFormat;
    use crate::job::MemoryJob;
    use crate::locator::{LocatorError, ToolLocator, ToolRequest};
    use crate::tree::TreeBuilder;
    use pretty_assertions::assert_eq;
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

    #[test]
    fn list_concatenates_in_order() {
        let mut b = TreeBuilder::new();
        let a = b.add(Literal::new("a"));
        let v = b.add(SwitchFlag::required("v"));
        let c = b.add(Literal::new("c"));
        let root = b.add(ListToArgs::new(vec![a, v, c, a]));
        let args = b.build(root).unwrap().resolve(&MemoryJob::new("j"), &NoTools).unwrap();
        assert_eq!(args, vec!["a", "-v", "c", "a"]);
    }

    #[test]
    fn boolean_branch_routes() {
        let mut b = TreeBuilder::new();
        let yes = b.add(Literal::new("on"));
        let no = b.add(Literal::new("off"));
        let root = b.add(BooleanBranch::new(ParamRef::new("enabled"), yes, no));
        let tree = b.build(root).unwrap();

        let job = MemoryJob::new("j").with_param("enabled", "yes");
        assert_eq!(tree.resolve(&job, &NoTools).unwrap(), vec!["on"]);
        let job = MemoryJob::new("j").with_param("enabled", "NO");
        assert_eq!(tree.resolve(&job, &NoTools).unwrap(), vec!["off"]);
        assert_eq!(tree.resolve(&MemoryJob::new("j"), &NoTools).unwrap(), vec!["off"]);

        let job = MemoryJob::new("j").with_param("enabled", "sometimes");
        assert!(matches!(
            tree.resolve(&job, &NoTools),
            Err(ResolveError::InvalidParameter(_))
        ));
    }

    #[test]
    fn boolean_branch_bad_default_is_config_error() {
        let mut b = TreeBuilder::new();
        let yes = b.add(Literal::new("on"));
        let no = b.add(Literal::new("off"));
        let root = b.add(BooleanBranch::new(
            ParamRef::new("enabled").with_default("maybe"),
            yes,
            no,
        ));
        assert!(matches!(b.build(root), Err(ConfigError::InvalidDefault { .. })));
    }

    #[test]
    fn enum_branch_selects_or_yields_nothing() {
        let mut b = TreeBuilder::new();
        let csv = b.add(Literal::new("--csv"));
        let tsv = b.add(Literal::new("--tsv"));
        let root = b.add(EnumBranch::new(
            ParamRef::new("format").with_default("tsv"),
            [("csv", csv), ("tsv", tsv)],
        ));
        let tree = b.build(root).unwrap();

        let job = MemoryJob::new("j").with_param("format", "csv");
        assert_eq!(tree.resolve(&job, &NoTools).unwrap(), vec!["--csv"]);
        assert_eq!(tree.resolve(&MemoryJob::new("j"), &NoTools).unwrap(), vec!["--tsv"]);

        let job = MemoryJob::new("j").with_param("format", "json");
        assert!(tree.resolve(&job, &NoTools).unwrap().is_empty());
    }

    #[test]
    fn joined_flags_combine_enabled_names() {
        let mut b = TreeBuilder::new();
        let a = b.add(BooleanToSwitch::new(ParamRef::new("a"), "a"));
        let bb = b.add(BooleanToSwitch::new(ParamRef::new("b"), "b"));
        let c = b.add(BooleanToSwitch::new(ParamRef::new("c"), "c"));
        let root = b.add_formatted(JoinedFlags::new(vec![a, bb, c]), SwitchFormat::space_separated());
        let tree = b.build(root).unwrap();

        let job = MemoryJob::new("j")
            .with_param("a", "yes")
            .with_param("b", "no")
            .with_param("c", "yes");
        assert_eq!(tree.resolve(&job, &NoTools).unwrap(), vec!["-ac"]);

        let none = MemoryJob::new("j").with_param("a", "no");
        assert!(tree.resolve(&none, &NoTools).unwrap().is_empty());
    }

    #[test]
    fn joined_flags_ignore_child_format() {
        let mut b = TreeBuilder::new();
        let a = b.add_formatted(
            BooleanToSwitch::new(ParamRef::new("a"), "a"),
            SwitchFormat::space_separated().with_marker("--"),
        );
        let c = b.add(BooleanToSwitch::new(ParamRef::new("c"), "c"));
        let root = b.add(JoinedFlags::new(vec![a, c]));
        let tree = b.build(root).unwrap();
        assert_eq!(tree.warnings().len(), 1);

        let job = MemoryJob::new("j").with_param("a", "yes").with_param("c", "yes");
        assert_eq!(tree.resolve(&job, &NoTools).unwrap(), vec!["-ac"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut b = TreeBuilder::new();
        let root = b.reserve();
        let lit = b.add(Literal::new("x"));
        b.fill(root, ListToArgs::new(vec![lit, root]), None).unwrap();
        let err = b
            .build(root)
            .unwrap()
            .resolve(&MemoryJob::new("j"), &NoTools)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { node } if node == root));
    }

    #[test]
    fn cycle_through_untaken_branch_is_not_hit() {
        let mut b = TreeBuilder::new();
        let root = b.reserve();
        let off = b.add(Literal::new("off"));
        b.fill(root, BooleanBranch::new(ParamRef::new("loop"), root, off), None)
            .unwrap();
        let tree = b.build(root).unwrap();

        assert_eq!(tree.resolve(&MemoryJob::new("j"), &NoTools).unwrap(), vec!["off"]);
        let job = MemoryJob::new("j").with_param("loop", "yes");
        assert!(tree.resolve(&job, &NoTools).unwrap_err().is_cycle());
    }
}

//! Resolution protocol
//!
//! A top-level resolution walks the tree depth-first, left to right. Every
//! node is entered through [`VisitedSet::enter`]; the returned guard removes
//! the node again when dropped, so a node can be resolved any number of
//! times in sequence but never while it is already on the active stack.

use crate::error::ResolveError;
use crate::format::SwitchFormat;
use crate::job::Job;
use crate::locator::{ToolLocator, ToolRequest};
use crate::tree::{ConverterTree, NodeId};
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

/// Nodes currently on the resolution stack of one top-level call
#[derive(Debug, Default)]
pub struct VisitedSet {
    active: HashSet<NodeId>,
}

impl VisitedSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if node is being resolved
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.active.contains(&id)
    }

    /// Number of nodes on the stack
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Check if no node is being resolved
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Push a node, failing with [`ResolveError::Cycle`] if already present
    pub fn enter(&mut self, id: NodeId) -> Result<VisitGuard<'_>, ResolveError> {
        if !self.active.insert(id) {
            return Err(ResolveError::Cycle { node: id });
        }
        Ok(VisitGuard { set: self, id })
    }
}

/// Scoped membership in a [`VisitedSet`]
///
/// Dereferences to the set so recursion can keep threading it through.
#[derive(Debug)]
pub struct VisitGuard<'v> {
    set: &'v mut VisitedSet,
    id: NodeId,
}

impl VisitGuard<'_> {
    /// Node this guard holds
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.id
    }
}

impl Deref for VisitGuard<'_> {
    type Target = VisitedSet;

    fn deref(&self) -> &Self::Target {
        self.set
    }
}

impl DerefMut for VisitGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.set
    }
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        self.set.active.remove(&self.id);
    }
}

/// Read-only context of one resolution call
///
/// Holds the tree, the job and the tool locator; the mutable visited set is
/// passed alongside so the context itself can be copied freely.
#[derive(Clone, Copy)]
pub struct Resolution<'a> {
    tree: &'a ConverterTree,
    job: &'a dyn Job,
    locator: &'a dyn ToolLocator,
}

impl<'a> Resolution<'a> {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(tree: &'a ConverterTree, job: &'a dyn Job, locator: &'a dyn ToolLocator) -> Self {
        Self { tree, job, locator }
    }

    /// Tree being resolved
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &'a ConverterTree {
        self.tree
    }

    /// Job being resolved
    #[inline]
    #[must_use]
    pub fn job(&self) -> &'a dyn Job {
        self.job
    }

    /// Effective switch format of a node
    #[inline]
    #[must_use]
    pub fn format(&self, id: NodeId) -> &'a SwitchFormat {
        self.tree.effective_format(id)
    }

    /// Locate a tool through the configured locator
    pub fn locate(&self, request: &ToolRequest<'_>) -> Result<PathBuf, ResolveError> {
        Ok(self.locator.locate(request)?)
    }

    /// Resolve one node, guarding against re-entry
    pub fn resolve(&self, id: NodeId, visited: &mut VisitedSet) -> Result<Vec<String>, ResolveError> {
        let converter = self
            .tree
            .converter(id)
            .ok_or(ResolveError::UnknownNode(id))?;
        let mut guard = visited.enter(id)?;
        tracing::trace!(node = %id, kind = converter.kind(), "resolving");
        converter.convert(id, self, &mut guard)
    }

    /// Resolve nodes in order and concatenate, stopping at the first error
    pub fn resolve_all(
        &self,
        ids: &[NodeId],
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        let mut args = Vec::new();
        for &id in ids {
            args.extend(self.resolve(id, visited)?);
        }
        Ok(args)
    }
}

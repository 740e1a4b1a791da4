//! Converter tree
//!
//! Nodes live in one arena and refer to each other by [`NodeId`]. A node's
//! parent is an index as well; it is only walked upward to find the
//! effective [`SwitchFormat`] and is never followed during resolution.
//!
//! The same node may be listed as a child in several places (shared
//! sub-converters). It keeps the first of those owners as its parent.

use crate::converters::Converter;
use crate::error::{ConfigError, ParameterError, ResolveError};
use crate::format::SwitchFormat;
use crate::job::Job;
use crate::locator::ToolLocator;
use crate::resolve::{Resolution, VisitedSet};
use petgraph::graphmap::DiGraphMap;
use std::fmt::{self, Display, Formatter};

/// Index of a node within its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Create id from arena index
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-fatal configuration finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Joined-flags child carries its own switch format, which is ignored
    DivergentFlagFormat {
        /// Joined-flags composite
        node: NodeId,
        /// Child whose format is ignored
        child: NodeId,
    },
}

impl Display for ConfigWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivergentFlagFormat { node, child } => write!(
                f,
                "flag {child} sets its own switch format; joined flags {node} formats with its own"
            ),
        }
    }
}

#[derive(Debug)]
struct Node {
    converter: Converter,
    format: Option<SwitchFormat>,
    parent: Option<NodeId>,
    label: Option<String>,
}

/// Immutable converter tree
///
/// Built once by [`TreeBuilder`] and then shared; resolution keeps all
/// per-call state outside the tree, so one tree may be resolved for many
/// jobs concurrently.
#[derive(Debug)]
pub struct ConverterTree {
    nodes: Vec<Node>,
    root: NodeId,
    default_format: SwitchFormat,
    warnings: Vec<ConfigWarning>,
}

impl ConverterTree {
    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree has no nodes (never true for a built tree)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Converter at `id`
    #[inline]
    #[must_use]
    pub fn converter(&self, id: NodeId) -> Option<&Converter> {
        self.nodes.get(id.0).map(|n| &n.converter)
    }

    /// Owning parent of `id`
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Label given at build time (named definitions)
    #[inline]
    #[must_use]
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).and_then(|n| n.label.as_deref())
    }

    /// Find a node by label
    #[must_use]
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.label.as_deref() == Some(label))
            .map(NodeId)
    }

    /// Tree-wide default format
    #[inline]
    #[must_use]
    pub fn default_format(&self) -> &SwitchFormat {
        &self.default_format
    }

    /// Explicit format of `id` if any
    #[inline]
    #[must_use]
    pub fn own_format(&self, id: NodeId) -> Option<&SwitchFormat> {
        self.nodes.get(id.0).and_then(|n| n.format.as_ref())
    }

    /// Format in effect at `id`
    ///
    /// The node's own format, else the nearest ancestor's, else the tree
    /// default.
    #[must_use]
    pub fn effective_format(&self, id: NodeId) -> &SwitchFormat {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(c.0)) {
            if let Some(format) = &node.format {
                return format;
            }
            current = node.parent;
        }
        &self.default_format
    }

    /// Warnings recorded while building
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// Resolve the root for `job`
    ///
    /// Returns the complete argument vector or the first error; never a
    /// partial list.
    pub fn resolve(
        &self,
        job: &dyn Job,
        locator: &dyn ToolLocator,
    ) -> Result<Vec<String>, ResolveError> {
        let job_span = job.span();
        let _job = job_span.enter();
        let _span = tracing::debug_span!("resolve", root = %self.root).entered();

        let mut visited = VisitedSet::new();
        let args = self.resolve_node(self.root, job, locator, &mut visited)?;
        tracing::debug!(count = args.len(), "resolved arguments");
        Ok(args)
    }

    /// Resolve one node with a caller-supplied visited set
    pub fn resolve_node(
        &self,
        id: NodeId,
        job: &dyn Job,
        locator: &dyn ToolLocator,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        Resolution::new(self, job, locator).resolve(id, visited)
    }

    /// Static cycle check over child edges
    ///
    /// Returns a node on a cycle if some node's resolution would re-enter
    /// itself. Nodes merely listed in several places are not cycles.
    #[must_use]
    pub fn find_cycle(&self) -> Option<NodeId> {
        let mut graph = DiGraphMap::<NodeId, ()>::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index);
            graph.add_node(id);
            for child in node.converter.children() {
                graph.add_edge(id, child, ());
            }
        }
        petgraph::algo::toposort(&graph, None)
            .err()
            .map(|cycle| cycle.node_id())
    }

    /// Check job-supplied values against every validator in the tree
    ///
    /// Reports each offending parameter once.
    #[must_use]
    pub fn validate_parameters(&self, job: &dyn Job) -> Vec<ParameterError> {
        let mut errors: Vec<ParameterError> = Vec::new();
        for param in self.nodes.iter().flat_map(|n| n.converter.params()) {
            if let Err(err) = param.validate_job_value(job) {
                if !errors.iter().any(|e| e.name == err.name) {
                    errors.push(err);
                }
            }
        }
        errors
    }
}

#[derive(Debug, Default)]
struct Slot {
    converter: Option<Converter>,
    format: Option<SwitchFormat>,
    label: Option<String>,
}

/// Builder for [`ConverterTree`]
///
/// Children must be added before the nodes that list them, or reserved with
/// [`TreeBuilder::reserve`] and filled later (forward and shared references).
#[derive(Debug, Default)]
pub struct TreeBuilder {
    slots: Vec<Slot>,
    default_format: SwitchFormat,
}

impl TreeBuilder {
    /// Create empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tree-wide default format
    #[must_use]
    pub fn with_default_format(mut self, format: SwitchFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Add a node inheriting its format
    pub fn add(&mut self, converter: impl Into<Converter>) -> NodeId {
        self.push(Some(converter.into()), None)
    }

    /// Add a node with an explicit format
    pub fn add_formatted(&mut self, converter: impl Into<Converter>, format: SwitchFormat) -> NodeId {
        self.push(Some(converter.into()), Some(format))
    }

    /// Reserve an id to be filled later
    pub fn reserve(&mut self) -> NodeId {
        self.push(None, None)
    }

    /// Fill a reserved id
    pub fn fill(
        &mut self,
        id: NodeId,
        converter: impl Into<Converter>,
        format: Option<SwitchFormat>,
    ) -> Result<(), ConfigError> {
        let slot = self.slots.get_mut(id.0).ok_or(ConfigError::UnknownNode(id))?;
        if slot.converter.is_some() {
            return Err(ConfigError::AlreadyDefined(id));
        }
        slot.converter = Some(converter.into());
        slot.format = format;
        Ok(())
    }

    /// Attach a label to a node
    pub fn label(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), ConfigError> {
        let slot = self.slots.get_mut(id.0).ok_or(ConfigError::UnknownNode(id))?;
        slot.label = Some(label.into());
        Ok(())
    }

    /// Number of nodes added or reserved
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if nothing was added
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn push(&mut self, converter: Option<Converter>, format: Option<SwitchFormat>) -> NodeId {
        self.slots.push(Slot {
            converter,
            format,
            label: None,
        });
        NodeId(self.slots.len() - 1)
    }

    /// Validate and freeze the tree
    pub fn build(self, root: NodeId) -> Result<ConverterTree, ConfigError> {
        if root.0 >= self.slots.len() {
            return Err(ConfigError::UnknownNode(root));
        }

        let mut nodes = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.into_iter().enumerate() {
            let converter = slot
                .converter
                .ok_or(ConfigError::UnfilledNode(NodeId(index)))?;
            nodes.push(Node {
                converter,
                format: slot.format,
                parent: None,
                label: slot.label,
            });
        }

        let mut warnings = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            let id = NodeId(index);
            for child in node.converter.children() {
                if child.0 >= nodes.len() {
                    return Err(ConfigError::UnknownNode(child));
                }
            }
            node.converter.validate(id)?;

            if let Converter::JoinedFlags(flags) = &node.converter {
                for &child in flags.flags() {
                    let child_node = &nodes[child.0];
                    if !matches!(child_node.converter, Converter::BooleanToSwitch(_)) {
                        return Err(ConfigError::NotABooleanFlag {
                            node: id,
                            child,
                            kind: child_node.converter.kind(),
                        });
                    }
                    if child_node.format.is_some() {
                        warnings.push(ConfigWarning::DivergentFlagFormat { node: id, child });
                    }
                }
            }
        }

        assign_parents(&mut nodes);

        for warning in &warnings {
            tracing::warn!(%warning, "converter tree configuration warning");
        }

        Ok(ConverterTree {
            nodes,
            root,
            default_format: self.default_format,
            warnings,
        })
    }
}

/// First owner wins; an assignment that would loop the upward chain is skipped
fn assign_parents(nodes: &mut [Node]) {
    for index in 0..nodes.len() {
        let owner = NodeId(index);
        for child in nodes[index].converter.children() {
            if child == owner || nodes[child.0].parent.is_some() {
                continue;
            }
            if is_upward_reachable(nodes, owner, child) {
                continue;
            }
            nodes[child.0].parent = Some(owner);
        }
    }
}

fn is_upward_reachable(nodes: &[Node], from: NodeId, target: NodeId) -> bool {
    let mut current = Some(from);
    let mut steps = 0;
    while let Some(id) = current {
        if id == target {
            return true;
        }
        steps += 1;
        if steps > nodes.len() {
            return true;
        }
        current = nodes[id.0].parent;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::{BooleanToSwitch, JoinedFlags, ListToArgs, Literal, SwitchFlag};
    use crate::param::ParamRef;

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::new(4).to_string(), "#4");
        assert_eq!(NodeId::new(4).index(), 4);
    }

    #[test]
    fn parents_follow_first_owner() {
        let mut b = TreeBuilder::new();
        let shared = b.add(Literal::new("x"));
        let first = b.add(ListToArgs::new(vec![shared]));
        let second = b.add(ListToArgs::new(vec![shared]));
        let root = b.add(ListToArgs::new(vec![first, second]));
        let tree = b.build(root).unwrap();

        assert_eq!(tree.parent(shared), Some(first));
        assert_eq!(tree.parent(first), Some(root));
        assert_eq!(tree.parent(second), Some(root));
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn effective_format_inherits() {
        let mut b = TreeBuilder::new();
        let leaf = b.add(SwitchFlag::required("v"));
        let inner = b.add_formatted(ListToArgs::new(vec![leaf]), SwitchFormat::joined("="));
        let root = b.add(ListToArgs::new(vec![inner]));
        let tree = b.build(root).unwrap();

        assert_eq!(tree.effective_format(leaf), &SwitchFormat::joined("="));
        assert_eq!(tree.effective_format(root), &SwitchFormat::default());
        assert!(tree.own_format(leaf).is_none());
    }

    #[test]
    fn tree_default_format_applies_at_top() {
        let mut b = TreeBuilder::new().with_default_format(SwitchFormat::joined(":"));
        let root = b.add(SwitchFlag::required("v"));
        let tree = b.build(root).unwrap();
        assert_eq!(tree.effective_format(root), &SwitchFormat::joined(":"));
    }

    #[test]
    fn mutual_references_do_not_loop_parent_chain() {
        let mut b = TreeBuilder::new();
        let a = b.reserve();
        let c = b.reserve();
        b.fill(a, ListToArgs::new(vec![c]), None).unwrap();
        b.fill(c, ListToArgs::new(vec![a]), None).unwrap();
        let tree = b.build(a).unwrap();

        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.parent(a), None);
        // terminates
        assert_eq!(tree.effective_format(c), &SwitchFormat::default());
        assert!(tree.find_cycle().is_some());
    }

    #[test]
    fn unfilled_reservation_fails_build() {
        let mut b = TreeBuilder::new();
        let hole = b.reserve();
        let root = b.add(ListToArgs::new(vec![hole]));
        assert!(matches!(b.build(root), Err(ConfigError::UnfilledNode(id)) if id == hole));
    }

    #[test]
    fn fill_twice_fails() {
        let mut b = TreeBuilder::new();
        let id = b.reserve();
        b.fill(id, Literal::new("a"), None).unwrap();
        assert!(matches!(
            b.fill(id, Literal::new("b"), None),
            Err(ConfigError::AlreadyDefined(_))
        ));
    }

    #[test]
    fn unknown_child_fails_build() {
        let mut b = TreeBuilder::new();
        let root = b.add(ListToArgs::new(vec![NodeId::new(42)]));
        assert!(matches!(b.build(root), Err(ConfigError::UnknownNode(_))));
    }

    #[test]
    fn joined_flags_reject_non_boolean_children() {
        let mut b = TreeBuilder::new();
        let lit = b.add(Literal::new("x"));
        let root = b.add(JoinedFlags::new(vec![lit]));
        assert!(matches!(
            b.build(root),
            Err(ConfigError::NotABooleanFlag { kind: "literal", .. })
        ));
    }

    #[test]
    fn joined_flags_warn_on_child_format() {
        let mut b = TreeBuilder::new();
        let a = b.add_formatted(
            BooleanToSwitch::new(ParamRef::new("a"), "a"),
            SwitchFormat::joined("="),
        );
        let root = b.add(JoinedFlags::new(vec![a]));
        let tree = b.build(root).unwrap();
        assert_eq!(
            tree.warnings(),
            &[ConfigWarning::DivergentFlagFormat { node: root, child: a }]
        );
    }

    #[test]
    fn shared_reuse_is_not_a_static_cycle() {
        let mut b = TreeBuilder::new();
        let shared = b.add(Literal::new("x"));
        let root = b.add(ListToArgs::new(vec![shared, shared]));
        let tree = b.build(root).unwrap();
        assert_eq!(tree.find_cycle(), None);
    }

    #[test]
    fn labels() {
        let mut b = TreeBuilder::new();
        let id = b.add(Literal::new("x"));
        b.label(id, "common").unwrap();
        let tree = b.build(id).unwrap();
        assert_eq!(tree.label(id), Some("common"));
        assert_eq!(tree.find("common"), Some(id));
        assert_eq!(tree.find("other"), None);
    }
}

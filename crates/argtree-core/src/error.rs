//! Error types for argument composition
//!
//! Provides error handling for:
//! - Tree construction and validation ([`ConfigError`])
//! - Resolution of a tree against a job ([`ResolveError`])
//! - Individual parameter values failing their validator ([`ParameterError`])
//! - Path lookups that a job could not satisfy ([`JobError`])

use crate::job::PathRole;
use crate::locator::LocatorError;
use crate::tree::NodeId;

/// Errors detected while building or validating a converter tree
///
/// These must be fixed before the tree is used; they never surface from
/// resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A static default does not pass the parameter's validator
    #[error("invalid default '{value}' for parameter '{name}': {reason}")]
    InvalidDefault {
        /// Parameter name
        name: String,
        /// Offending default value
        value: String,
        /// Validator message
        reason: String,
    },

    /// Boolean branch without one of its subtrees
    #[error("boolean branch on '{param}' is missing its '{branch}' subtree")]
    MissingBranch {
        /// Parameter driving the branch
        param: String,
        /// Which subtree is absent (`then` or `else`)
        branch: &'static str,
    },

    /// Child reference to a node that does not exist
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    /// Node reserved for a forward reference but never filled
    #[error("node {0} was reserved but never defined")]
    UnfilledNode(NodeId),

    /// Node filled twice
    #[error("node {0} is already defined")]
    AlreadyDefined(NodeId),

    /// Joined-flags composite holding something other than a boolean switch
    #[error("joined flags node {node} contains non-boolean child {child} ({kind})")]
    NotABooleanFlag {
        /// Composite node
        node: NodeId,
        /// Offending child
        child: NodeId,
        /// Kind of the offending child
        kind: &'static str,
    },

    /// Regex substitution pattern failed to compile
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern text
        pattern: String,
        /// Compiler error
        #[source]
        source: regex::Error,
    },

    /// Switch converter configured with an empty name
    #[error("node {0} has an empty switch name")]
    EmptySwitch(NodeId),
}

/// A parameter value rejected by its validator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parameter '{name}' has invalid value '{value}': {reason}")]
pub struct ParameterError {
    /// Parameter name
    pub name: String,
    /// Rejected value
    pub value: String,
    /// Validator message
    pub reason: String,
}

impl ParameterError {
    /// Create new parameter error
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors a job reports while supplying file paths
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Module-relative path requested but the job has no module root
    #[error("no module root configured for path '{0}'")]
    NoModuleRoot(String),

    /// Job-specific failure
    #[error("{0}")]
    Other(String),
}

/// Errors raised while resolving a tree against a job
///
/// All of these abort the whole top-level resolution; composites never
/// return partial argument lists.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Node re-entered while already on the active resolution stack
    #[error("circular reference in argument-composition graph at node {node}")]
    Cycle {
        /// Node that was re-entered
        node: NodeId,
    },

    /// Resolution started at a node the tree does not contain
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    /// Tool locator could not find an executable, library or version
    #[error("tool resolution failed: {0}")]
    Tool(#[from] LocatorError),

    /// Job value rejected by its validator
    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    /// Job could not supply paths for a role
    #[error("job could not supply {role} paths: {source}")]
    Paths {
        /// Requested role
        role: PathRole,
        /// Underlying job error
        #[source]
        source: JobError,
    },
}

impl ResolveError {
    /// Check if error is a detected cycle
    #[inline]
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. })
    }

    /// Check if error came from the tool locator
    #[inline]
    #[must_use]
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Self::Tool(_))
    }

    /// Create path lookup error
    #[inline]
    #[must_use]
    pub fn paths(role: PathRole, source: JobError) -> Self {
        Self::Paths { role, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display() {
        let err = ResolveError::Cycle { node: NodeId::new(3) };
        assert!(err.to_string().contains("circular reference"));
        assert!(err.is_cycle());
        assert!(!err.is_tool_failure());
    }

    #[test]
    fn tool_error_converts() {
        let err: ResolveError = LocatorError::UnknownPackage {
            package: "tpp".to_string(),
        }
        .into();
        assert!(err.is_tool_failure());
        assert!(err.to_string().contains("tpp"));
    }

    #[test]
    fn parameter_error_display() {
        let err = ParameterError::new("verbose", "maybe", "expected yes or no");
        assert_eq!(
            err.to_string(),
            "parameter 'verbose' has invalid value 'maybe': expected yes or no"
        );
    }

    #[test]
    fn missing_branch_display() {
        let err = ConfigError::MissingBranch {
            param: "enabled".to_string(),
            branch: "else",
        };
        assert!(err.to_string().contains("'else'"));
    }
}

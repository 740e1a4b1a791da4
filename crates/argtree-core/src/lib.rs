//! Argument composition engine
//!
//! Turns a tree of converter nodes and a job's parameters into the ordered
//! argument vector of an external tool.
//!
//! # Core Concepts
//!
//! - [`ConverterTree`]: immutable arena of [`Converter`] nodes, built by [`TreeBuilder`]
//! - [`SwitchFormat`]: renders a switch and optional value into tokens, inherited down the tree
//! - [`Job`]: parameters and file paths of one invocation ([`MemoryJob`] in memory)
//! - [`ToolLocator`]: resolves tool names and versions to installed paths ([`FsToolLocator`])
//! - [`VisitedSet`]: per-call re-entry guard that turns cyclic references into errors
//!
//! # Example
//!
//! ```rust,ignore
//! use argtree_core::{BooleanToSwitch, ListToArgs, Literal, MemoryJob, ParamRef, TreeBuilder};
//!
//! let mut b = TreeBuilder::new();
//! let name = b.add(Literal::new("tandem"));
//! let verbose = b.add(BooleanToSwitch::new(ParamRef::new("verbose"), "v"));
//! let root = b.add(ListToArgs::new(vec![name, verbose]));
//! let tree = b.build(root)?;
//!
//! let job = MemoryJob::new("job-1").with_param("verbose", "yes");
//! let args = tree.resolve(&job, &locator)?; // ["tandem", "-v"]
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod converters;
mod error;
mod format;
mod job;
mod locator;
mod param;
mod resolve;
mod tree;

// Re-exports
pub use converters::{
    BooleanBranch, BooleanToSwitch, Converter, EnumBranch, EnumToSwitch, ExeToArgs, JarToArgs,
    JoinedFlags, ListToArgs, Literal, PathArgs, RegexToArg, SwitchFlag, ToolSpec, ValueInLine,
    ValueWithSwitch, JAR_MARKER,
};
pub use error::{ConfigError, JobError, ParameterError, ResolveError};
pub use format::{SwitchFormat, DEFAULT_MARKER};
pub use job::{Job, MemoryJob, PathRole};
pub use locator::{FsToolLocator, LocatorError, SoftwarePackage, ToolLocator, ToolRequest};
pub use param::{ParamRef, ParamValidator, YesNo};
pub use resolve::{Resolution, VisitGuard, VisitedSet};
pub use tree::{ConfigWarning, ConverterTree, NodeId, TreeBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Declarative task definitions
//!
//! Loads task definitions (YAML, JSON or TOML) and builds them into
//! [`argtree_core::ConverterTree`]s.
//!
//! # Definition shape
//!
//! ```yaml
//! name: tandem
//! parameters:
//!   - { name: threads, type: int, default: 4 }
//! converters:
//!   input: { type: path, role: input }
//! command:
//!   type: list
//!   items:
//!     - { type: exe, tool: { path: bin/tandem.exe } }
//!     - { type: value-with-switch, param: threads, switch: t }
//!     - { ref: input }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod build;
mod error;
mod loader;
mod model;
mod tools;

// Re-exports
pub use build::CommandTask;
pub use error::LoadError;
pub use loader::{load, load_definition, load_task, load_tools, FileFormat};
pub use model::{ConverterDef, KindDef, NodeDef, ParamType, ParameterDef, TaskDefinition, ToolDef};
pub use tools::{PackageConfig, ToolsConfig};

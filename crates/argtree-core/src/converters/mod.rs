//! Converter node kinds
//!
//! Leaves read job data (parameters, paths, located tools) and emit tokens;
//! composites combine other nodes of the same tree by [`NodeId`].

mod composite;
mod path;
mod tool;
mod value;

pub use composite::{BooleanBranch, EnumBranch, JoinedFlags, ListToArgs};
pub use path::PathArgs;
pub use tool::{ExeToArgs, JarToArgs, ToolSpec, JAR_MARKER};
pub use value::{
    BooleanToSwitch, EnumToSwitch, Literal, RegexToArg, SwitchFlag, ValueInLine, ValueWithSwitch,
};

use crate::error::{ConfigError, ResolveError};
use crate::param::ParamRef;
use crate::resolve::{Resolution, VisitedSet};
use crate::tree::NodeId;

/// One node of a converter tree
#[derive(Debug, Clone)]
pub enum Converter {
    /// Fixed token, optionally a located path
    Literal(Literal),
    /// Switch without a value
    Switch(SwitchFlag),
    /// Parameter value as a bare token
    ValueInLine(ValueInLine),
    /// Parameter value behind a switch
    ValueWithSwitch(ValueWithSwitch),
    /// Parameter value mapped to a switch name
    EnumToSwitch(EnumToSwitch),
    /// Yes/no parameter toggling a switch
    BooleanToSwitch(BooleanToSwitch),
    /// Regex substitution on a parameter value
    RegexToArg(RegexToArg),
    /// Job file paths for a role
    Path(PathArgs),
    /// Located executable
    Exe(ExeToArgs),
    /// Runtime interpreter + `-jar` + located archive
    Jar(JarToArgs),
    /// Ordered concatenation of children
    List(ListToArgs),
    /// Yes/no choice between two subtrees
    BooleanBranch(BooleanBranch),
    /// Keyed choice among subtrees
    EnumBranch(EnumBranch),
    /// Boolean switches merged into one short-flag token
    JoinedFlags(JoinedFlags),
}

impl Converter {
    /// Kind name, as used in task definitions
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Switch(_) => "switch",
            Self::ValueInLine(_) => "value",
            Self::ValueWithSwitch(_) => "value-with-switch",
            Self::EnumToSwitch(_) => "enum-switch",
            Self::BooleanToSwitch(_) => "boolean-switch",
            Self::RegexToArg(_) => "regex",
            Self::Path(_) => "path",
            Self::Exe(_) => "exe",
            Self::Jar(_) => "jar",
            Self::List(_) => "list",
            Self::BooleanBranch(_) => "if",
            Self::EnumBranch(_) => "choose",
            Self::JoinedFlags(_) => "joined-flags",
        }
    }

    /// Nodes this node resolves (ownership edges)
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::List(list) => list.children().to_vec(),
            Self::BooleanBranch(branch) => vec![branch.then(), branch.otherwise()],
            Self::EnumBranch(branch) => branch.branches().values().copied().collect(),
            Self::JoinedFlags(flags) => flags.flags().to_vec(),
            Self::Jar(jar) => jar.runtime_args().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Job parameters this node reads
    #[must_use]
    pub fn params(&self) -> Vec<&ParamRef> {
        match self {
            Self::Switch(flag) => flag.condition().into_iter().collect(),
            Self::ValueInLine(v) => vec![v.param()],
            Self::ValueWithSwitch(v) => vec![v.param()],
            Self::EnumToSwitch(v) => vec![v.param()],
            Self::BooleanToSwitch(v) => vec![v.param()],
            Self::RegexToArg(v) => vec![v.param()],
            Self::Literal(lit) => lit.tool().and_then(ToolSpec::version).into_iter().collect(),
            Self::Path(_) | Self::List(_) | Self::JoinedFlags(_) => Vec::new(),
            Self::Exe(exe) => exe.tool().version().into_iter().collect(),
            Self::Jar(jar) => jar
                .archive()
                .version()
                .into_iter()
                .chain(jar.runtime().version())
                .collect(),
            Self::BooleanBranch(branch) => vec![branch.param()],
            Self::EnumBranch(branch) => vec![branch.param()],
        }
    }

    /// Switch names this node emits
    fn switch_names(&self) -> Vec<&str> {
        match self {
            Self::Switch(flag) => vec![flag.switch()],
            Self::ValueWithSwitch(v) => vec![v.switch()],
            Self::EnumToSwitch(v) => v.switches().values().map(String::as_str).collect(),
            Self::BooleanToSwitch(v) => vec![v.switch()],
            Self::Path(p) => p.switch().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Node-local configuration checks
    pub(crate) fn validate(&self, id: NodeId) -> Result<(), ConfigError> {
        if self.switch_names().iter().any(|s| s.is_empty()) {
            return Err(ConfigError::EmptySwitch(id));
        }
        for param in self.params() {
            param.validate_default()?;
        }
        Ok(())
    }

    /// Produce this node's tokens
    pub(crate) fn convert(
        &self,
        id: NodeId,
        cx: &Resolution<'_>,
        visited: &mut VisitedSet,
    ) -> Result<Vec<String>, ResolveError> {
        match self {
            Self::Literal(lit) => lit.convert(cx),
            Self::Switch(flag) => Ok(flag.convert(id, cx)),
            Self::ValueInLine(v) => Ok(v.convert(cx)),
            Self::ValueWithSwitch(v) => Ok(v.convert(id, cx)),
            Self::EnumToSwitch(v) => Ok(v.convert(id, cx)),
            Self::BooleanToSwitch(v) => v.convert(id, cx),
            Self::RegexToArg(v) => Ok(v.convert(cx)),
            Self::Path(p) => p.convert(id, cx),
            Self::Exe(exe) => exe.convert(cx),
            Self::Jar(jar) => jar.convert(cx, visited),
            Self::List(list) => list.convert(cx, visited),
            Self::BooleanBranch(branch) => branch.convert(cx, visited),
            Self::EnumBranch(branch) => branch.convert(cx, visited),
            Self::JoinedFlags(flags) => flags.convert(id, cx, visited),
        }
    }
}

macro_rules! impl_from_converter {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Converter {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_converter! {
    Literal => Literal,
    Switch => SwitchFlag,
    ValueInLine => ValueInLine,
    ValueWithSwitch => ValueWithSwitch,
    EnumToSwitch => EnumToSwitch,
    BooleanToSwitch => BooleanToSwitch,
    RegexToArg => RegexToArg,
    Path => PathArgs,
    Exe => ExeToArgs,
    Jar => JarToArgs,
    List => ListToArgs,
    BooleanBranch => BooleanBranch,
    EnumBranch => EnumBranch,
    JoinedFlags => JoinedFlags,
}

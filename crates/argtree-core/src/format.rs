//! Switch formatting strategies
//!
//! Provides [`SwitchFormat`], the pluggable rule that turns a switch name and
//! an optional value into command-line tokens.

use serde::{Deserialize, Serialize};

/// Default leading switch marker
pub const DEFAULT_MARKER: &str = "-";

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

/// How a named switch (and its value) is rendered into tokens
///
/// # Examples
/// - space separated: `-x v` → `["-x", "v"]`
/// - joined with `=`: `-x=v` → `["-x=v"]`
/// - no value (either style): `["-x"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "kebab-case")]
pub enum SwitchFormat {
    /// Switch and value as two separate tokens
    SpaceSeparated {
        /// Leading marker, `-` unless configured
        #[serde(default = "default_marker")]
        marker: String,
    },

    /// Switch and value joined into one token
    Joined {
        /// Leading marker, `-` unless configured
        #[serde(default = "default_marker")]
        marker: String,

        /// Text placed between switch name and value (empty by default)
        #[serde(default)]
        separator: String,
    },
}

impl SwitchFormat {
    /// Space-separated format with the default marker
    #[inline]
    #[must_use]
    pub fn space_separated() -> Self {
        Self::SpaceSeparated {
            marker: default_marker(),
        }
    }

    /// Joined format with the default marker
    #[inline]
    #[must_use]
    pub fn joined(separator: impl Into<String>) -> Self {
        Self::Joined {
            marker: default_marker(),
            separator: separator.into(),
        }
    }

    /// Replace the leading marker (e.g. `--` or `/`)
    #[must_use]
    pub fn with_marker(mut self, new_marker: impl Into<String>) -> Self {
        match &mut self {
            Self::SpaceSeparated { marker } | Self::Joined { marker, .. } => {
                *marker = new_marker.into();
            }
        }
        self
    }

    /// Leading switch marker
    #[inline]
    #[must_use]
    pub fn marker(&self) -> &str {
        match self {
            Self::SpaceSeparated { marker } | Self::Joined { marker, .. } => marker,
        }
    }

    /// Render a switch into one or two tokens
    #[must_use]
    pub fn format(&self, name: &str, value: Option<&str>) -> Vec<String> {
        let switch = format!("{}{name}", self.marker());
        match (self, value) {
            (_, None) => vec![switch],
            (Self::SpaceSeparated { .. }, Some(value)) => vec![switch, value.to_string()],
            (Self::Joined { separator, .. }, Some(value)) => {
                vec![format!("{switch}{separator}{value}")]
            }
        }
    }
}

impl Default for SwitchFormat {
    fn default() -> Self {
        Self::space_separated()
    }
}

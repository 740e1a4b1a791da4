//! Parameter-driven leaf converters
//!
//! Each reads at most one job parameter. A missing, empty, false or
//! unmapped value contributes no tokens; that is the normal outcome for an
//! option the job did not request.

use super::tool::ToolSpec;
use crate::error::{ConfigError, ResolveError};
use crate::job::Job;
use crate::param::{ParamRef, ParamValidator, YesNo};
use crate::resolve::Resolution;
use crate::tree::NodeId;
use indexmap::IndexMap;
use regex::Regex;

/// Fixed token
///
/// A located literal asks the tool locator for the text instead, so the
/// token becomes the installed path of a tool or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    value: String,
    tool: Option<ToolSpec>,
}

impl Literal {
    /// Literal text
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tool: None,
        }
    }

    /// Path resolved through the tool locator
    #[must_use]
    pub fn located(tool: ToolSpec) -> Self {
        Self {
            value: tool.path().to_string(),
            tool: Some(tool),
        }
    }

    /// Literal text, or the path hint when located
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Tool lookup, if located
    #[inline]
    #[must_use]
    pub fn tool(&self) -> Option<&ToolSpec> {
        self.tool.as_ref()
    }

    pub(super) fn convert(&self, cx: &Resolution<'_>) -> Result<Vec<String>, ResolveError> {
        match &self.tool {
            None => Ok(vec![self.value.clone()]),
            Some(tool) => Ok(vec![tool.locate(cx)?]),
        }
    }
}

/// Switch without a value
///
/// Required switches always emit; conditional ones emit only when their
/// parameter has a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchFlag {
    switch: String,
    condition: Option<ParamRef>,
}

impl SwitchFlag {
    /// Always emitted
    #[inline]
    #[must_use]
    pub fn required(switch: impl Into<String>) -> Self {
        Self {
            switch: switch.into(),
            condition: None,
        }
    }

    /// Emitted when `param` is present and non-empty
    #[inline]
    #[must_use]
    pub fn optional(switch: impl Into<String>, param: ParamRef) -> Self {
        Self {
            switch: switch.into(),
            condition: Some(param),
        }
    }

    /// Switch name
    #[inline]
    #[must_use]
    pub fn switch(&self) -> &str {
        &self.switch
    }

    /// Controlling parameter
    #[inline]
    #[must_use]
    pub fn condition(&self) -> Option<&ParamRef> {
        self.condition.as_ref()
    }

    pub(super) fn convert(&self, id: NodeId, cx: &Resolution<'_>) -> Vec<String> {
        if let Some(param) = &self.condition {
            if param.lookup_non_empty(cx.job()).is_none() {
                tracing::debug!(switch = %self.switch, param = param.name(), "switch not requested");
                return Vec::new();
            }
        }
        cx.format(id).format(&self.switch, None)
    }
}

/// Parameter value as one bare token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueInLine {
    param: ParamRef,
}

impl ValueInLine {
    /// Create converter
    #[inline]
    #[must_use]
    pub fn new(param: ParamRef) -> Self {
        Self { param }
    }

    /// Parameter read
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    pub(super) fn convert(&self, cx: &Resolution<'_>) -> Vec<String> {
        self.param
            .lookup_non_empty(cx.job())
            .map(|v| vec![v.to_string()])
            .unwrap_or_default()
    }
}

/// Parameter value behind a named switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueWithSwitch {
    param: ParamRef,
    switch: String,
}

impl ValueWithSwitch {
    /// Create converter
    #[inline]
    #[must_use]
    pub fn new(param: ParamRef, switch: impl Into<String>) -> Self {
        Self {
            param,
            switch: switch.into(),
        }
    }

    /// Parameter read
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    /// Switch name
    #[inline]
    #[must_use]
    pub fn switch(&self) -> &str {
        &self.switch
    }

    pub(super) fn convert(&self, id: NodeId, cx: &Resolution<'_>) -> Vec<String> {
        match self.param.lookup_non_empty(cx.job()) {
            Some(value) => cx.format(id).format(&self.switch, Some(value)),
            None => Vec::new(),
        }
    }
}

/// Parameter value mapped to a switch name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumToSwitch {
    param: ParamRef,
    switches: IndexMap<String, String>,
}

impl EnumToSwitch {
    /// Create converter from `value → switch` pairs
    #[must_use]
    pub fn new<K, V>(param: ParamRef, switches: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            param,
            switches: switches
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parameter read
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    /// Value → switch mapping
    #[inline]
    #[must_use]
    pub fn switches(&self) -> &IndexMap<String, String> {
        &self.switches
    }

    pub(super) fn convert(&self, id: NodeId, cx: &Resolution<'_>) -> Vec<String> {
        let Some(value) = self.param.lookup_non_empty(cx.job()) else {
            return Vec::new();
        };
        match self.switches.get(value) {
            Some(switch) => cx.format(id).format(switch, None),
            None => {
                tracing::debug!(param = self.param.name(), value, "value maps to no switch");
                Vec::new()
            }
        }
    }
}

/// Yes/no parameter toggling a switch
///
/// Emits when the value is `yes`, or `no` when negative. The parameter
/// always carries the yes/no validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanToSwitch {
    param: ParamRef,
    switch: String,
    negative: bool,
}

impl BooleanToSwitch {
    /// Emit `switch` when `param` is yes
    #[must_use]
    pub fn new(param: ParamRef, switch: impl Into<String>) -> Self {
        Self {
            param: param.with_validator(ParamValidator::YesNo),
            switch: switch.into(),
            negative: false,
        }
    }

    /// Emit `switch` when `param` is no
    #[must_use]
    pub fn negative(param: ParamRef, switch: impl Into<String>) -> Self {
        Self {
            negative: true,
            ..Self::new(param, switch)
        }
    }

    /// Parameter read
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    /// Bare switch name
    #[inline]
    #[must_use]
    pub fn switch(&self) -> &str {
        &self.switch
    }

    /// Check if configured negative
    #[inline]
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Evaluate the condition for a job
    ///
    /// Only an explicit `yes` (or `no` when negative) enables the switch.
    /// Absent, empty and unparseable values leave it off; rejecting the
    /// latter is left to form validation.
    #[must_use]
    pub fn is_enabled(&self, job: &dyn Job) -> bool {
        let Some(raw) = self.param.lookup_non_empty(job) else {
            return false;
        };
        match raw.parse::<YesNo>() {
            Ok(value) => value.is_yes() != self.negative,
            Err(reason) => {
                tracing::debug!(param = self.param.name(), value = raw, %reason, "ignoring non yes/no value");
                false
            }
        }
    }

    pub(super) fn convert(&self, id: NodeId, cx: &Resolution<'_>) -> Result<Vec<String>, ResolveError> {
        if self.is_enabled(cx.job()) {
            Ok(cx.format(id).format(&self.switch, None))
        } else {
            tracing::debug!(switch = %self.switch, param = self.param.name(), "boolean switch off");
            Ok(Vec::new())
        }
    }
}

/// Regex substitution on a parameter value
///
/// Emits the substituted value as one token when the pattern matches.
#[derive(Debug, Clone)]
pub struct RegexToArg {
    param: ParamRef,
    pattern: Regex,
    replacement: String,
}

impl RegexToArg {
    /// Compile the pattern
    pub fn new(
        param: ParamRef,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            param,
            pattern,
            replacement: replacement.into(),
        })
    }

    /// Parameter read
    #[inline]
    #[must_use]
    pub fn param(&self) -> &ParamRef {
        &self.param
    }

    /// Pattern source
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub(super) fn convert(&self, cx: &Resolution<'_>) -> Vec<String> {
        match self.param.lookup_non_empty(cx.job()) {
            Some(value) if self.pattern.is_match(value) => {
                vec![self
                    .pattern
                    .replace_all(value, self.replacement.as_str())
                    .into_owned()]
            }
            _ => Vec::new(),
        }
    }
}

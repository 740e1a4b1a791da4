//! Job parameter resolution and validation
//!
//! [`ParamRef`] names a job parameter together with its static default and
//! optional [`ParamValidator`]. Yes/no discriminators are parsed once into
//! [`YesNo`] at the boundary instead of being compared as raw strings.

use crate::error::{ConfigError, ParameterError};
use crate::job::Job;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parsed yes/no parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YesNo {
    /// `yes`, any case
    Yes,
    /// `no`, any case
    No,
}

impl YesNo {
    /// Check for `Yes`
    #[inline]
    #[must_use]
    pub fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl FromStr for YesNo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("yes") {
            Ok(Self::Yes)
        } else if s.eq_ignore_ascii_case("no") {
            Ok(Self::No)
        } else {
            Err("expected 'yes' or 'no'".to_string())
        }
    }
}

impl Display for YesNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_yes() { "yes" } else { "no" })
    }
}

/// Validator attached to a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "options", rename_all = "kebab-case")]
pub enum ParamValidator {
    /// Case-insensitive `yes` / `no`
    YesNo,

    /// Signed integer
    Integer,

    /// Decimal number
    Decimal,

    /// One of a fixed set of keys
    OneOf(Vec<String>),
}

impl ParamValidator {
    /// Check one value, returning the rejection reason
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            Self::YesNo => value.parse::<YesNo>().map(|_| ()),
            Self::Integer => value
                .trim()
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| "expected an integer".to_string()),
            Self::Decimal => value
                .trim()
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| "expected a number".to_string()),
            Self::OneOf(options) => {
                if options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err(format!("expected one of: {}", options.join(", ")))
                }
            }
        }
    }
}

/// Reference to a named job parameter
///
/// Lookup order: the job's own value, then this reference's static default,
/// then the job-wide default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRef {
    name: String,
    default: Option<String>,
    validator: Option<ParamValidator>,
}

impl ParamRef {
    /// Reference a parameter with no default
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            validator: None,
        }
    }

    /// Set the static default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Attach a validator
    #[inline]
    #[must_use]
    pub fn with_validator(mut self, validator: ParamValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Attach a validator unless one is already set
    #[must_use]
    pub fn or_validator(mut self, validator: Option<ParamValidator>) -> Self {
        if self.validator.is_none() {
            self.validator = validator;
        }
        self
    }

    /// Set the default unless one is already set
    #[must_use]
    pub fn or_default(mut self, default: Option<String>) -> Self {
        if self.default.is_none() {
            self.default = default;
        }
        self
    }

    /// Parameter name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static default
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Attached validator
    #[inline]
    #[must_use]
    pub fn validator(&self) -> Option<&ParamValidator> {
        self.validator.as_ref()
    }

    /// Resolve against a job
    #[must_use]
    pub fn lookup<'a>(&'a self, job: &'a dyn Job) -> Option<&'a str> {
        job.parameter(&self.name)
            .or(self.default.as_deref())
            .or_else(|| job.default_parameter(&self.name))
    }

    /// Resolve against a job, treating empty strings as absent
    #[must_use]
    pub fn lookup_non_empty<'a>(&'a self, job: &'a dyn Job) -> Option<&'a str> {
        self.lookup(job).filter(|v| !v.is_empty())
    }

    /// Resolve as yes/no; absent or empty counts as `No`
    pub fn lookup_yes_no(&self, job: &dyn Job) -> Result<YesNo, ParameterError> {
        match self.lookup_non_empty(job) {
            None => Ok(YesNo::No),
            Some(raw) => raw
                .parse::<YesNo>()
                .map_err(|reason| ParameterError::new(&self.name, raw, reason)),
        }
    }

    /// Check the static default against the validator
    pub fn validate_default(&self) -> Result<(), ConfigError> {
        match (&self.validator, &self.default) {
            (Some(validator), Some(default)) => {
                validator
                    .check(default)
                    .map_err(|reason| ConfigError::InvalidDefault {
                        name: self.name.clone(),
                        value: default.clone(),
                        reason,
                    })
            }
            _ => Ok(()),
        }
    }

    /// Check the job-supplied value (if any) against the validator
    pub fn validate_job_value(&self, job: &dyn Job) -> Result<(), ParameterError> {
        let (Some(validator), Some(value)) = (&self.validator, job.parameter(&self.name)) else {
            return Ok(());
        };
        if value.is_empty() {
            return Ok(());
        }
        validator
            .check(value)
            .map_err(|reason| ParameterError::new(&self.name, value, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::MemoryJob;

    #[test]
    fn yes_no_is_case_insensitive() {
        assert_eq!("YES".parse::<YesNo>().unwrap(), YesNo::Yes);
        assert_eq!("yEs".parse::<YesNo>().unwrap(), YesNo::Yes);
        assert_eq!("No".parse::<YesNo>().unwrap(), YesNo::No);
        assert!("true".parse::<YesNo>().is_err());
        assert!("".parse::<YesNo>().is_err());
    }

    #[test]
    fn lookup_order() {
        let param = ParamRef::new("mode").with_default("static");

        let job = MemoryJob::new("j").with_param("mode", "explicit");
        assert_eq!(param.lookup(&job), Some("explicit"));

        let job = MemoryJob::new("j").with_default("mode", "job-wide");
        assert_eq!(param.lookup(&job), Some("static"));

        let bare = ParamRef::new("mode");
        assert_eq!(bare.lookup(&job), Some("job-wide"));
        assert_eq!(bare.lookup(&MemoryJob::new("j")), None);
    }

    #[test]
    fn lookup_non_empty_filters_blank() {
        let param = ParamRef::new("x");
        let job = MemoryJob::new("j").with_param("x", "");
        assert_eq!(param.lookup(&job), Some(""));
        assert_eq!(param.lookup_non_empty(&job), None);
    }

    #[test]
    fn lookup_yes_no() {
        let param = ParamRef::new("enabled");
        assert_eq!(param.lookup_yes_no(&MemoryJob::new("j")).unwrap(), YesNo::No);

        let job = MemoryJob::new("j").with_param("enabled", "Yes");
        assert_eq!(param.lookup_yes_no(&job).unwrap(), YesNo::Yes);

        let job = MemoryJob::new("j").with_param("enabled", "maybe");
        let err = param.lookup_yes_no(&job).unwrap_err();
        assert_eq!(err.name, "enabled");
        assert_eq!(err.value, "maybe");
    }

    #[test]
    fn validate_default_rejects_bad_boolean() {
        let param = ParamRef::new("enabled")
            .with_default("sometimes")
            .with_validator(ParamValidator::YesNo);
        assert!(matches!(
            param.validate_default(),
            Err(ConfigError::InvalidDefault { .. })
        ));

        let ok = ParamRef::new("enabled")
            .with_default("NO")
            .with_validator(ParamValidator::YesNo);
        assert!(ok.validate_default().is_ok());
    }

    #[test]
    fn validators() {
        assert!(ParamValidator::Integer.check("42").is_ok());
        assert!(ParamValidator::Integer.check("4.2").is_err());
        assert!(ParamValidator::Decimal.check("4.2").is_ok());
        assert!(ParamValidator::Decimal.check("four").is_err());

        let choice = ParamValidator::OneOf(vec!["csv".to_string(), "tsv".to_string()]);
        assert!(choice.check("csv").is_ok());
        assert!(choice.check("json").is_err());
    }

    #[test]
    fn validate_job_value() {
        let param = ParamRef::new("threads").with_validator(ParamValidator::Integer);
        assert!(param.validate_job_value(&MemoryJob::new("j")).is_ok());

        let job = MemoryJob::new("j").with_param("threads", "many");
        let err = param.validate_job_value(&job).unwrap_err();
        assert_eq!(err.reason, "expected an integer");
    }

    #[test]
    fn or_helpers_keep_explicit_settings() {
        let param = ParamRef::new("x")
            .with_default("1")
            .or_default(Some("2".to_string()))
            .with_validator(ParamValidator::Integer)
            .or_validator(Some(ParamValidator::YesNo));
        assert_eq!(param.default_value(), Some("1"));
        assert_eq!(param.validator(), Some(&ParamValidator::Integer));
    }
}

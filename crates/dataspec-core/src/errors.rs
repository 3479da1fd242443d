//! Error types for dataspec-core.
//!
//! Two families of failure exist:
//!
//! - [`SchemaError`]: the spec itself is malformed. Only produced while a
//!   spec is being built.
//! - [`InvalidValue`]: a candidate value does not conform. It carries every
//!   failure found during one check. Each failure may be located by index or
//!   key, and may wrap the nested failure that caused it.
//!
//! [`CheckError`] is what a check returns: either an [`InvalidValue`], or an
//! error raised by a user callback that is not a validation outcome and is
//! passed through untouched.

use std::fmt;
use std::net::AddrParseError;
use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use std::sync::Arc;

use thiserror::Error;

use crate::value::Value;

/// Result of checking a value.
pub type CheckResult<T = Value> = Result<T, CheckError>;

/// Boxed error raised by a user callback.
pub type CallbackError = Arc<dyn std::error::Error + Send + Sync>;

/// A spec could not be constructed.
#[derive(Error, Debug, Clone)]
pub enum SchemaError {
    #[error("Invalid schema, default value is spec-invalid: {0}")]
    InvalidDefault(#[source] InvalidValue),

    #[error("Invalid base type: {0}")]
    InvalidBaseType(String),

    #[error("Conflicting options: {0}")]
    Conflict(String),

    #[error("One of value keys or type keys must be specified")]
    EmptySchema,

    #[error("Invalid conditional spec: {0}")]
    Conditional(String),

    #[error("At least one reference key must be given")]
    EmptyRefKeys,

    #[error("Invalid constraint pattern: {0}")]
    Pattern(String),

    #[error("Callback failed while validating the default: {0}")]
    Callback(CallbackError),
}

/// Outcome of a failed check.
#[derive(Error, Debug, Clone)]
pub enum CheckError {
    /// The value does not conform.
    #[error(transparent)]
    Invalid(#[from] InvalidValue),

    /// A canonicalizer or post-processing callback raised an error that is
    /// not a validation outcome.
    #[error("Callback failed during check: {0}")]
    Callback(CallbackError),
}

impl CheckError {
    /// The value failure, if this is not a callback defect.
    pub fn as_invalid(&self) -> Option<&InvalidValue> {
        match self {
            CheckError::Invalid(e) => Some(e),
            CheckError::Callback(_) => None,
        }
    }

    /// Owned form of [`as_invalid`](Self::as_invalid).
    pub fn into_invalid(self) -> Option<InvalidValue> {
        match self {
            CheckError::Invalid(e) => Some(e),
            CheckError::Callback(_) => None,
        }
    }
}

impl From<CheckError> for SchemaError {
    fn from(error: CheckError) -> Self {
        match error {
            CheckError::Invalid(e) => SchemaError::InvalidDefault(e),
            CheckError::Callback(e) => SchemaError::Callback(e),
        }
    }
}

/// Error returned by a canonicalizer.
///
/// The first four variants are the recognized failure classes: they become
/// validation failures of the spec that ran the canonicalizer. `Other` is
/// passed through as [`CheckError::Callback`].
#[derive(Error, Debug)]
pub enum CanonicalizeError {
    #[error("{0}")]
    Value(String),

    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Attribute(String),

    #[error("{0}")]
    Key(String),

    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl CanonicalizeError {
    pub fn value(message: impl Into<String>) -> Self {
        CanonicalizeError::Value(message.into())
    }

    pub fn wrong_type(message: impl Into<String>) -> Self {
        CanonicalizeError::Type(message.into())
    }

    pub fn other(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        CanonicalizeError::Other(Box::new(error))
    }

    /// Label used when the failure is reported as a validation failure.
    pub(crate) fn class(&self) -> &'static str {
        match self {
            CanonicalizeError::Value(_) => "invalid value",
            CanonicalizeError::Type(_) => "wrong type",
            CanonicalizeError::Attribute(_) => "missing attribute",
            CanonicalizeError::Key(_) => "missing key",
            CanonicalizeError::Other(_) => "callback error",
        }
    }
}

impl From<ParseIntError> for CanonicalizeError {
    fn from(e: ParseIntError) -> Self {
        CanonicalizeError::Value(e.to_string())
    }
}

impl From<ParseFloatError> for CanonicalizeError {
    fn from(e: ParseFloatError) -> Self {
        CanonicalizeError::Value(e.to_string())
    }
}

impl From<ParseBoolError> for CanonicalizeError {
    fn from(e: ParseBoolError) -> Self {
        CanonicalizeError::Value(e.to_string())
    }
}

impl From<AddrParseError> for CanonicalizeError {
    fn from(e: AddrParseError) -> Self {
        CanonicalizeError::Value(e.to_string())
    }
}

/// Where inside the checked value a failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Element position in an iterable or sequence.
    Index(usize),
    /// Key of a mapping.
    Key(Value),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Index(i) => write!(f, "[{}]", i),
            Location::Key(Value::Str(s)) => f.write_str(s),
            Location::Key(other) => write!(f, "[{}]", other),
        }
    }
}

/// One failure inside an [`InvalidValue`].
#[derive(Debug, Clone)]
pub struct Failure {
    pub location: Option<Location>,
    /// Rendered message, including the cause when there is one.
    pub message: String,
    pub cause: Option<Box<InvalidValue>>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
            cause: None,
        }
    }

    pub fn at(location: Location, message: impl Into<String>) -> Self {
        Self {
            location: Some(location),
            message: message.into(),
            cause: None,
        }
    }

    /// A failure explained by a nested one. Renders as `context: cause`.
    pub fn caused(location: Option<Location>, context: impl Into<String>, cause: InvalidValue) -> Self {
        Self {
            location,
            message: format!("{}: {}", context.into(), cause),
            cause: Some(Box::new(cause)),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A value failed to conform to a spec.
///
/// A simple error has one failure whose message is the error message. An
/// aggregate has a summary message and one failure per problem found;
/// `error_count` is the number of those failures.
#[derive(Debug, Clone)]
pub struct InvalidValue {
    message: String,
    failures: Vec<Failure>,
    aggregated: bool,
    // "value is not an instance of this type": unions fall through on it
    no_match: bool,
}

impl InvalidValue {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            failures: vec![Failure::new(message.clone())],
            message,
            aggregated: false,
            no_match: false,
        }
    }

    /// Summarize several failures under one message.
    ///
    /// With no failures this degenerates to a simple error.
    pub fn aggregate(message: impl Into<String>, failures: Vec<Failure>) -> Self {
        if failures.is_empty() {
            return Self::new(message);
        }
        Self {
            message: message.into(),
            failures,
            aggregated: true,
            no_match: false,
        }
    }

    /// A simple error explained by a nested one.
    pub fn wrap(context: impl Into<String>, cause: InvalidValue) -> Self {
        let failure = Failure::caused(None, context, cause);
        Self {
            message: failure.message.clone(),
            failures: vec![failure],
            aggregated: false,
            no_match: false,
        }
    }

    pub(crate) fn no_match(message: impl Into<String>) -> Self {
        Self {
            no_match: true,
            ..Self::new(message)
        }
    }

    pub(crate) fn into_no_match(mut self) -> Self {
        self.no_match = true;
        self
    }

    pub(crate) fn is_no_match(&self) -> bool {
        self.no_match
    }

    /// Summary message (without the failure list of an aggregate).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Direct failures, without flattening nested causes.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.message.as_str())
    }

    /// Number of direct failures.
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_aggregate(&self) -> bool {
        self.aggregated
    }

    /// Flatten nested failures into leaf issues with paths like
    /// `servers[1].port`.
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        self.collect_issues("", &mut issues);
        issues
    }

    fn collect_issues(&self, prefix: &str, out: &mut Vec<Issue>) {
        for failure in &self.failures {
            let path = match &failure.location {
                Some(location) => join_path(prefix, location),
                None => prefix.to_string(),
            };
            match &failure.cause {
                Some(cause) => cause.collect_issues(&path, out),
                None => out.push(Issue {
                    path,
                    message: failure.message.clone(),
                }),
            }
        }
    }
}

fn join_path(prefix: &str, location: &Location) -> String {
    match location {
        Location::Key(Value::Str(key)) if prefix.is_empty() => key.clone(),
        Location::Key(Value::Str(key)) => format!("{}.{}", prefix, key),
        other => format!("{}{}", prefix, other),
    }
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if self.aggregated {
            f.write_str(":")?;
            for failure in &self.failures {
                write!(f, "\n-- {}", failure.message.replace('\n', "\n   "))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for InvalidValue {}

/// A leaf failure with the path at which it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Path to the offending value.
    ///
    /// Examples:
    /// - `""` - the checked value itself
    /// - `"port"` - a mapping key
    /// - `"servers[1].port"` - a key inside a list element
    pub path: String,

    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested() -> InvalidValue {
        let port = InvalidValue::aggregate(
            "Does not conform with dict schema",
            vec![Failure::caused(
                Some(Location::Key("port".into())),
                "Invalid value for key \"port\"",
                InvalidValue::new("Must be int"),
            )],
        );
        InvalidValue::aggregate(
            "Items do not conform with iterable spec",
            vec![
                Failure::caused(Some(Location::Index(1)), "Index 1 is invalid", port),
                Failure::at(Location::Index(3), "Must be dict"),
            ],
        )
    }

    #[test]
    fn test_simple_error_display() {
        let error = InvalidValue::new("Must be int");
        assert_eq!(error.to_string(), "Must be int");
        assert_eq!(error.error_count(), 1);
        assert!(!error.is_aggregate());
    }

    #[test]
    fn test_aggregate_display_indents_nested() {
        let expected = "Items do not conform with iterable spec:\n\
                        -- Index 1 is invalid: Does not conform with dict schema:\n   \
                        -- Invalid value for key \"port\": Must be int\n\
                        -- Must be dict";
        assert_eq!(nested().to_string(), expected);
        assert_eq!(nested().error_count(), 2);
    }

    #[test]
    fn test_issue_paths() {
        let issues = nested().issues();
        assert_eq!(
            issues,
            vec![
                Issue {
                    path: "[1].port".to_string(),
                    message: "Must be int".to_string(),
                },
                Issue {
                    path: "[3]".to_string(),
                    message: "Must be dict".to_string(),
                },
            ]
        );
        assert_eq!(issues[0].to_string(), "[1].port: Must be int");
    }

    #[test]
    fn test_non_string_keys_use_brackets() {
        let error = InvalidValue::aggregate(
            "Does not conform with dict schema",
            vec![Failure::at(Location::Key(Value::Int(7)), "Missing required mapping key 7")],
        );
        assert_eq!(error.issues()[0].path, "[7]");
    }

    #[test]
    fn test_empty_aggregate_is_simple() {
        let error = InvalidValue::aggregate("nothing", vec![]);
        assert!(!error.is_aggregate());
        assert_eq!(error.to_string(), "nothing");
    }

    #[test]
    fn test_canonicalize_error_classes() {
        let parse: CanonicalizeError = "x".parse::<i64>().unwrap_err().into();
        assert_eq!(parse.class(), "invalid value");
        assert_eq!(CanonicalizeError::wrong_type("t").class(), "wrong type");
    }
}

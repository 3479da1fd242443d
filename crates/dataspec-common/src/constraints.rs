//! Constraint factories.
//!
//! Each factory returns a [`Constraint`] ready to pass to
//! [`SpecBuilder::constraint`](dataspec_core::SpecBuilder) or
//! [`Spec::add_constraints`](dataspec_core::Spec::add_constraints). A value
//! the comparison does not apply to (a length of a number, an int compared
//! with a string) fails the constraint.

use std::cmp::Ordering;

use dataspec_core::{Constraint, SchemaError, Value};
use regex::Regex;

fn has_length(value: &Value, test: impl Fn(usize) -> bool) -> bool {
    value.length().is_some_and(test)
}

fn compares(value: &Value, bound: &Value, test: impl Fn(Ordering) -> bool) -> bool {
    value.compare(bound).is_some_and(test)
}

/// Must have length >= `length`
pub fn min_len(length: usize) -> Constraint {
    Constraint::new(
        move |v| has_length(v, |n| n >= length),
        format!("Must have length >= {}", length),
    )
}

/// Must have length <= `length`
pub fn max_len(length: usize) -> Constraint {
    Constraint::new(
        move |v| has_length(v, |n| n <= length),
        format!("Must have length <= {}", length),
    )
}

/// Length in the inclusive range `min..=max`.
pub fn range_len(min: usize, max: usize) -> Constraint {
    Constraint::new(
        move |v| has_length(v, |n| (min..=max).contains(&n)),
        format!("Must have length between {}-{}", min, max),
    )
}

/// Must have length == `length`
pub fn exact_len(length: usize) -> Constraint {
    Constraint::new(
        move |v| has_length(v, |n| n == length),
        format!("Must have exact length {}", length),
    )
}

/// Element of a collection, key of a mapping, or substring of a string.
pub fn contains(needle: impl Into<Value>) -> Constraint {
    let needle = needle.into();
    let message = format!("Must contain {}", needle);
    Constraint::new(move |v| v.contains(&needle), message)
}

/// Must be >= `min`, numerically across ints and floats.
pub fn min_value(min: impl Into<Value>) -> Constraint {
    let min = min.into();
    let message = format!("Must be >= {}", min);
    Constraint::new(move |v| compares(v, &min, Ordering::is_ge), message)
}

/// Must be <= `max`.
pub fn max_value(max: impl Into<Value>) -> Constraint {
    let max = max.into();
    let message = format!("Must be <= {}", max);
    Constraint::new(move |v| compares(v, &max, Ordering::is_le), message)
}

/// Inclusive range.
pub fn range_value(min: impl Into<Value>, max: impl Into<Value>) -> Constraint {
    let (min, max) = (min.into(), max.into());
    let message = format!("Must be between {}-{}", min, max);
    Constraint::new(
        move |v| compares(v, &min, Ordering::is_ge) && compares(v, &max, Ordering::is_le),
        message,
    )
}

/// String matching `pattern`. Non-strings fail.
pub fn pattern(pattern: Regex, message: impl Into<String>) -> Constraint {
    Constraint::new(
        move |v| v.as_str().is_some_and(|s| pattern.is_match(s)),
        message,
    )
}

/// [`pattern`] from source text, failing on a malformed expression.
pub fn matching(source: &str, message: impl Into<String>) -> Result<Constraint, SchemaError> {
    let regex = Regex::new(source).map_err(|e| SchemaError::Pattern(e.to_string()))?;
    Ok(pattern(regex, message))
}

//! Value constraints: predicates checked after the structural check.

use std::fmt;

use crate::errors::{Failure, InvalidValue};
use crate::spec::{Callback, PredicateFn};
use crate::value::Value;

/// A predicate with the message reported when it does not hold.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    test: Callback<PredicateFn>,
    message: String,
}

impl Constraint {
    pub fn new(
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self {
            test: Callback::predicate(test),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn holds(&self, value: &Value) -> bool {
        (self.test.get())(value)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Evaluate every constraint and report all that fail.
pub(crate) fn check_all(constraints: &[Constraint], value: &Value) -> Result<(), InvalidValue> {
    let mut failed: Vec<&Constraint> = constraints.iter().filter(|c| !c.holds(value)).collect();
    if failed.is_empty() {
        return Ok(());
    }
    if constraints.len() == 1 {
        let message = failed.remove(0).message();
        return Err(InvalidValue::new(format!(
            "Does not meet value constraint: {}",
            message
        )));
    }
    Err(InvalidValue::aggregate(
        "Does not meet value constraints",
        failed
            .into_iter()
            .map(|c| Failure::new(c.message.clone()))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_least(n: i64) -> Constraint {
        Constraint::new(
            move |v| v.as_i64().is_some_and(|i| i >= n),
            format!("Must be >= {}", n),
        )
    }

    fn even() -> Constraint {
        Constraint::new(|v| v.as_i64().is_some_and(|i| i % 2 == 0), "Must be even")
    }

    #[test]
    fn test_single_constraint_message() {
        let err = check_all(&[at_least(3)], &Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "Does not meet value constraint: Must be >= 3");
        assert_eq!(err.error_count(), 1);
    }

    #[test]
    fn test_multiple_constraints_aggregate_only_failures() {
        let constraints = [at_least(3), even()];
        let err = check_all(&constraints, &Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Does not meet value constraints:\n-- Must be >= 3\n-- Must be even"
        );
        assert_eq!(err.error_count(), 2);

        let err = check_all(&constraints, &Value::Int(5)).unwrap_err();
        assert_eq!(err.error_count(), 1);
        assert!(err.is_aggregate());
    }

    #[test]
    fn test_passing_and_empty() {
        assert!(check_all(&[at_least(3), even()], &Value::Int(4)).is_ok());
        assert!(check_all(&[], &Value::Null).is_ok());
    }
}

//! Post rules run against a structurally valid mapping.

use std::sync::Arc;

use crate::errors::{InvalidValue, SchemaError};
use crate::spec::Callback;
use crate::value::{Map, Value};

/// Callback over the values of the reference keys, in reference-key order.
pub type RefFn<T> = dyn Fn(&[Value]) -> T + Send + Sync;

/// A post rule attached with [`DictSpec::post`](crate::DictSpec::post).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Post {
    Update(Update),
    Test(Test),
}

impl Post {
    pub fn ref_keys(&self) -> &[Value] {
        match self {
            Post::Update(update) => &update.ref_keys,
            Post::Test(test) => &test.ref_keys,
        }
    }

    pub(crate) fn evaluate(&self, mapping: &mut Map) -> Result<(), InvalidValue> {
        match self {
            Post::Update(update) => update.evaluate(mapping),
            Post::Test(test) => test.evaluate(mapping),
        }
    }
}

impl From<Update> for Post {
    fn from(update: Update) -> Self {
        Post::Update(update)
    }
}

impl From<Test> for Post {
    fn from(test: Test) -> Self {
        Post::Test(test)
    }
}

fn collect_ref_keys<I, K>(keys: I) -> Result<Vec<Value>, SchemaError>
where
    I: IntoIterator<Item = K>,
    K: Into<Value>,
{
    let keys: Vec<Value> = keys.into_iter().map(Into::into).collect();
    if keys.is_empty() {
        return Err(SchemaError::EmptyRefKeys);
    }
    Ok(keys)
}

fn ref_values(keys: &[Value], mapping: &Map) -> Result<Vec<Value>, InvalidValue> {
    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();
    for key in keys {
        match mapping.get(key) {
            Some(value) => values.push(value.clone()),
            None => missing.push(key.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(InvalidValue::new(format!(
            "Missing ref_keys {}",
            missing.join(", ")
        )));
    }
    Ok(values)
}

/// Recompute the first reference key from the values of all of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Update {
    ref_keys: Vec<Value>,
    update: Callback<RefFn<Value>>,
    gate: Option<Callback<RefFn<bool>>>,
}

impl Update {
    pub fn new<I, K, F>(ref_keys: I, update: F) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let update: Arc<RefFn<Value>> = Arc::new(update);
        Ok(Self {
            ref_keys: collect_ref_keys(ref_keys)?,
            update: Callback::from(update),
            gate: None,
        })
    }

    /// Only update when `gate` holds. Without a gate the update always runs.
    pub fn gate<F>(mut self, gate: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        let gate: Arc<RefFn<bool>> = Arc::new(gate);
        self.gate = Some(Callback::from(gate));
        self
    }

    fn evaluate(&self, mapping: &mut Map) -> Result<(), InvalidValue> {
        let values = ref_values(&self.ref_keys, mapping)?;
        let open = self.gate.as_ref().map_or(true, |gate| (gate.get())(&values));
        if let (true, Some(target)) = (open, self.ref_keys.first()) {
            mapping.insert(target.clone(), (self.update.get())(&values));
        }
        Ok(())
    }
}

/// Fail with `message` unless the predicate holds for the reference values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Test {
    ref_keys: Vec<Value>,
    test: Callback<RefFn<bool>>,
    message: String,
}

impl Test {
    pub fn new<I, K, F>(ref_keys: I, test: F, message: impl Into<String>) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        let test: Arc<RefFn<bool>> = Arc::new(test);
        Ok(Self {
            ref_keys: collect_ref_keys(ref_keys)?,
            test: Callback::from(test),
            message: message.into(),
        })
    }

    fn evaluate(&self, mapping: &mut Map) -> Result<(), InvalidValue> {
        let values = ref_values(&self.ref_keys, mapping)?;
        if (self.test.get())(&values) {
            Ok(())
        } else {
            Err(InvalidValue::new(self.message.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::DictSpec;
    use crate::errors::CheckError;
    use crate::spec::SpecBuilder;
    use crate::value::Kind;
    use pretty_assertions::assert_eq;

    fn range_spec() -> DictSpec {
        DictSpec::new().key("low", Kind::Int).key("high", Kind::Int)
    }

    #[test]
    fn test_empty_ref_keys_rejected() {
        assert!(matches!(
            Update::new(Vec::<&str>::new(), |_| Value::Null),
            Err(SchemaError::EmptyRefKeys)
        ));
        assert!(matches!(
            Test::new(Vec::<&str>::new(), |_| true, "never"),
            Err(SchemaError::EmptyRefKeys)
        ));
    }

    #[test]
    fn test_update_rewrites_first_ref_key() {
        let clamp = Update::new(["high", "low"], |v| {
            let (high, low) = (v[0].as_i64().unwrap_or(0), v[1].as_i64().unwrap_or(0));
            Value::Int(high.max(low))
        })
        .unwrap();
        let spec = range_spec().post(clamp).build().unwrap();
        let checked = spec
            .check_value(&Value::map([("low", 5), ("high", 2)]))
            .unwrap();
        assert_eq!(checked, Value::map([("low", 5), ("high", 5)]));
    }

    #[test]
    fn test_update_gate() {
        let double = Update::new(["low"], |v| Value::Int(v[0].as_i64().unwrap_or(0) * 2))
            .unwrap()
            .gate(|v| v[0].as_i64().is_some_and(|i| i < 10));
        let spec = range_spec().post(double).build().unwrap();
        assert_eq!(
            spec.check_value(&Value::map([("low", 3), ("high", 4)])).unwrap(),
            Value::map([("low", 6), ("high", 4)])
        );
        assert_eq!(
            spec.check_value(&Value::map([("low", 30), ("high", 4)])).unwrap(),
            Value::map([("low", 30), ("high", 4)])
        );
    }

    #[test]
    fn test_failed_tests_aggregate() {
        let ordered = Test::new(
            ["low", "high"],
            |v| v[0].compare(&v[1]).is_some_and(|o| o.is_le()),
            "low must not exceed high",
        )
        .unwrap();
        let dangling = Test::new(["low", "missing", "gone"], |_| true, "unreachable").unwrap();
        let spec = range_spec().post(ordered).post(dangling).build().unwrap();

        let err = spec
            .check_value(&Value::map([("low", 5), ("high", 2)]))
            .unwrap_err();
        let CheckError::Invalid(err) = err else {
            panic!("expected an invalid value");
        };
        assert_eq!(
            err.to_string(),
            "Post processing has failed:\n\
             -- low must not exceed high\n\
             -- Missing ref_keys \"missing\", \"gone\""
        );
        assert_eq!(err.error_count(), 2);
    }

    #[test]
    fn test_post_rules_skipped_when_structure_fails() {
        let never = Test::new(["low"], |_| false, "should not run").unwrap();
        let spec = range_spec().post(never).build().unwrap();
        let err = spec
            .check_value(&Value::map([("low", 1)]))
            .unwrap_err()
            .into_invalid()
            .unwrap();
        assert_eq!(err.message(), "Does not conform with dict schema");
    }
}

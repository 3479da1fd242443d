//! [`IterSpec`]: homogeneous collections.

use tracing::debug;

use crate::descriptor::{check_value_types, BaseType, Types};
use crate::errors::{CheckError, CheckResult, Failure, InvalidValue, Location, SchemaError};
use crate::spec::{DefaultValue, Options, Spec, SpecBuilder, Unset};
use crate::specs::Rule;
use crate::value::Value;

/// Collection the checked elements are gathered into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Container {
    #[default]
    List,
    Tuple,
    Set,
}

impl Container {
    /// Type name of an [`IterSpec`] collecting into this container.
    pub fn name(self) -> &'static str {
        match self {
            Container::List => "list",
            Container::Tuple => "tuple",
            Container::Set => "set",
        }
    }

    pub fn collect(self, items: Vec<Value>) -> Value {
        match self {
            Container::List => Value::List(items),
            Container::Tuple => Value::Tuple(items),
            Container::Set => Value::Set(items.into_iter().collect()),
        }
    }
}

/// Elements of a list, tuple or set in iteration order.
fn elements(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) => Some(items.iter().collect()),
        Value::Set(items) => Some(items.iter().collect()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct IterRule {
    types: Vec<BaseType>,
    container: Container,
}

impl IterRule {
    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        let Some(items) = elements(value) else {
            return Err(InvalidValue::no_match("Must be iterable").into());
        };
        let mut checked = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            match check_value_types(&self.types, item) {
                Ok(value) => checked.push(value),
                Err(CheckError::Invalid(e)) => failures.push(Failure::caused(
                    Some(Location::Index(index)),
                    format!("Index {} is invalid", index),
                    e,
                )),
                Err(e) => return Err(e),
            }
        }
        if !failures.is_empty() {
            debug!(failures = failures.len(), "iterable does not conform");
            return Err(
                InvalidValue::aggregate("Items do not conform with iterable spec", failures).into(),
            );
        }
        Ok(self.container.collect(checked))
    }

    pub(crate) fn type_name(&self) -> String {
        self.container.name().to_string()
    }
}

/// Every element checked against the same union of descriptors.
///
/// A null descriptor among the element types admits null elements; it does
/// not make the spec optional.
pub struct IterSpec {
    types: Types,
    container: Container,
    options: Options,
}

impl IterSpec {
    pub fn new(types: impl Into<Types>) -> Self {
        Self {
            types: types.into(),
            container: Container::default(),
            options: Options::default(),
        }
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }
}

impl SpecBuilder for IterSpec {
    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn build(self) -> Result<Spec, SchemaError> {
        let rule = IterRule {
            types: self.types.canonicalize()?,
            container: self.container,
        };
        Spec::assemble(
            Rule::Iter(rule),
            self.options
                .resolve(DefaultValue::Value(Value::List(Vec::new())), Unset::Falsy),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use crate::value::Kind;

    #[test]
    fn test_reports_every_bad_index() {
        let spec = IterSpec::new(Kind::Int).build().unwrap();
        let err = spec
            .check_value(&Value::list([Value::Int(1), "2".into(), Value::Int(3), "4".into()]))
            .unwrap_err()
            .into_invalid()
            .unwrap();
        assert_eq!(err.error_count(), 2);
        assert_eq!(
            err.messages().collect::<Vec<_>>(),
            vec!["Index 1 is invalid: Must be int", "Index 3 is invalid: Must be int"]
        );
    }

    #[test]
    fn test_non_iterables_do_not_match() {
        let spec = IterSpec::new(Kind::Any).build().unwrap();
        for value in [Value::from("abc"), Value::map([("a", 1)]), Value::Int(3)] {
            let err = spec.check_value(&value).unwrap_err().into_invalid().unwrap();
            assert_eq!(err.to_string(), "Must be iterable");
            assert!(err.is_no_match());
        }
    }

    #[test]
    fn test_container_choice() {
        let spec = IterSpec::new(Kind::Int)
            .container(Container::Set)
            .build()
            .unwrap();
        assert_eq!(spec.type_name(), "set");
        assert_eq!(
            spec.check_value(&Value::list([3, 1, 3])).unwrap(),
            Value::set([1, 3])
        );

        let tuple = IterSpec::new(Kind::Int)
            .container(Container::Tuple)
            .build()
            .unwrap();
        assert_eq!(
            tuple.check_value(&Value::set([2, 1])).unwrap(),
            Value::tuple([1, 2])
        );
    }

    #[test]
    fn test_null_element_type_is_not_optionality() {
        let spec = IterSpec::new([Descriptor::Kind(Kind::Int), Descriptor::None])
            .build()
            .unwrap();
        assert!(!spec.is_optional());
        assert_eq!(
            spec.check_value(&Value::list([Value::Null, Value::Int(1)])).unwrap(),
            Value::list([Value::Null, Value::Int(1)])
        );
        assert!(spec.check_value(&Value::Null).is_err());
    }

    #[test]
    fn test_optional_default_is_empty_list() {
        let spec = IterSpec::new(Kind::Str).optional(true).build().unwrap();
        assert_eq!(spec.check_value(&Value::Null).unwrap(), Value::List(vec![]));
    }
}

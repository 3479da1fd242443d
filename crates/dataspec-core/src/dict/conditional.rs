//! Discriminator keys selecting an extra sub-schema.
//!
//! ```rust,ignore
//! let kind = ConditionalDictSpec::new()
//!     .case("http", DictSpec::new().key("url", Kind::Str).build()?)
//!     .case("file", Descriptor::mapping([("path", Kind::Str)]))
//!     .build()?;
//! let source = DictSpec::new()
//!     .conditional_key("kind", kind)
//!     .type_key(Kind::Str, Kind::Any)
//!     .build()?;
//! ```
//!
//! The sub-schema for the matching case is checked against the whole
//! enclosing mapping, not against the discriminator's value.

use std::collections::BTreeMap;

use tracing::trace;

use crate::descriptor::{must_be, BaseType, Descriptor};
use crate::dict::checker::Checker;
use crate::errors::{CheckError, CheckResult, InvalidValue, SchemaError};
use crate::spec::Spec;
use crate::value::Value;

/// A built discriminator, used with
/// [`DictSpec::conditional_key`](crate::DictSpec::conditional_key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Conditional {
    cases: BTreeMap<Value, Spec>,
    optional: bool,
    default: Value,
    apply_default_spec: bool,
}

impl Conditional {
    /// Whether the discriminator key may be absent.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Discriminator values with a sub-schema.
    pub fn cases(&self) -> impl Iterator<Item = &Value> {
        self.cases.keys()
    }

    /// Discriminator value written for an absent key.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub(crate) fn check(&self, checker: &mut Checker<'_>, value: &Value) -> CheckResult {
        let Some(rule) = self.cases.get(value).and_then(Spec::as_dict) else {
            // An optional discriminator accepts its own default, which is what
            // an absent key canonicalizes to.
            if self.optional && *value == self.default {
                return self.apply_default(checker);
            }
            return Err(InvalidValue::new(must_be(self.cases.keys())).into());
        };
        trace!(discriminator = %value, "applying conditional sub-schema");
        match checker.check_dict(rule, true) {
            Ok(()) => Ok(value.clone()),
            Err(CheckError::Invalid(e)) => Err(InvalidValue::wrap(
                format!("Does not conform with conditional spec for value {}", value),
                e,
            )
            .into()),
            Err(e) => Err(e),
        }
    }

    /// Value used when the discriminator key is absent, after applying the
    /// default case's sub-schema if requested.
    pub(crate) fn apply_default(&self, checker: &mut Checker<'_>) -> CheckResult {
        if self.apply_default_spec {
            if let Some(rule) = self.cases.get(&self.default).and_then(Spec::as_dict) {
                trace!(discriminator = %self.default, "applying default conditional sub-schema");
                checker.check_dict(rule, true)?;
            }
        }
        Ok(self.default.clone())
    }
}

/// Builder for a [`Conditional`].
#[derive(Debug, Clone, Default)]
pub struct ConditionalDictSpec {
    cases: Vec<(Value, Descriptor)>,
    optional: bool,
    default: Option<Value>,
    apply_default_spec: bool,
}

impl ConditionalDictSpec {
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            optional: false,
            default: None,
            apply_default_spec: false,
        }
    }

    /// When the discriminator equals `value`, the mapping must also satisfy
    /// `spec`, which must be a mapping spec without type keys.
    pub fn case(mut self, value: impl Into<Value>, spec: impl Into<Descriptor>) -> Self {
        self.cases.push((value.into(), spec.into()));
        self
    }

    /// Allow the discriminator key to be absent.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Value recorded for an absent discriminator. Defaults to null.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Also check the default case's sub-schema when the discriminator is
    /// absent.
    pub fn apply_default_spec(mut self, apply: bool) -> Self {
        self.apply_default_spec = apply;
        self
    }

    pub fn build(self) -> Result<Conditional, SchemaError> {
        let mut cases = BTreeMap::new();
        for (value, descriptor) in self.cases {
            let spec = match descriptor.canonicalize()? {
                BaseType::Spec(spec) => spec,
                _ => return Err(not_a_mapping(&value)),
            };
            match spec.as_dict() {
                None => return Err(not_a_mapping(&value)),
                Some(rule) if rule.has_type_keys() => {
                    return Err(SchemaError::Conditional(format!(
                        "type keys are not allowed in the sub-schema for case {}",
                        value
                    )))
                }
                Some(_) => {}
            }
            cases.insert(value, spec);
        }

        let default = self.default.unwrap_or(Value::Null);
        if self.apply_default_spec && !cases.contains_key(&default) {
            return Err(SchemaError::Conditional(format!(
                "default={} is not one of the cases and apply_default_spec is set",
                default
            )));
        }

        Ok(Conditional {
            cases,
            optional: self.optional,
            default,
            apply_default_spec: self.apply_default_spec,
        })
    }
}

fn not_a_mapping(value: &Value) -> SchemaError {
    SchemaError::Conditional(format!("case {} must be a mapping spec", value))
}

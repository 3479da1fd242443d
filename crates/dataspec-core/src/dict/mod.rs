//! Mapping specs.
//!
//! A [`DictSpec`] declares two tables of rules:
//!
//! - **value keys**: exact keys, each with the descriptor its value must
//!   satisfy, or a [`Conditional`] discriminator. Missing keys are filled from
//!   optional specs' defaults or reported.
//! - **type keys**: a key pattern and a value descriptor. Every key not
//!   claimed by a value-key rule is offered to the patterns in order.
//!
//! Keys left over after both passes are an error unless `unhandled_ok` is
//! set. Once the mapping is structurally valid, [`Post`] rules run against the
//! canonical result.

mod checker;
mod conditional;
mod post;

pub use conditional::{Conditional, ConditionalDictSpec};
pub use post::{Post, RefFn, Test, Update};

use crate::descriptor::{BaseType, Descriptor};
use crate::errors::{CheckResult, InvalidValue, SchemaError};
use crate::spec::{DefaultValue, Options, Spec, SpecBuilder, Unset};
use crate::specs::Rule;
use crate::value::{Kind, Map, Value};

use checker::Checker;

/// Key of a schema-style declaration: an exact key or a key pattern.
#[derive(Debug, Clone)]
pub enum DictKey {
    Value(Value),
    Pattern(Descriptor),
}

impl From<Value> for DictKey {
    fn from(value: Value) -> Self {
        DictKey::Value(value)
    }
}

impl From<&str> for DictKey {
    fn from(key: &str) -> Self {
        DictKey::Value(key.into())
    }
}

impl From<String> for DictKey {
    fn from(key: String) -> Self {
        DictKey::Value(key.into())
    }
}

impl From<i64> for DictKey {
    fn from(key: i64) -> Self {
        DictKey::Value(key.into())
    }
}

impl From<Kind> for DictKey {
    fn from(kind: Kind) -> Self {
        DictKey::Pattern(kind.into())
    }
}

impl From<Spec> for DictKey {
    fn from(spec: Spec) -> Self {
        DictKey::Pattern(spec.into())
    }
}

impl From<Descriptor> for DictKey {
    fn from(descriptor: Descriptor) -> Self {
        DictKey::Pattern(descriptor)
    }
}

/// What a value key is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Type(BaseType),
    Conditional(Conditional),
}

#[derive(Debug, Clone)]
enum PendingSlot {
    Type(Descriptor),
    Conditional(Conditional),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DictRule {
    value_keys: Vec<(Value, Slot)>,
    type_keys: Vec<(BaseType, BaseType)>,
    post: Vec<Post>,
    name: String,
    unhandled_ok: bool,
}

impl DictRule {
    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        let Some(mapping) = value.as_map() else {
            return Err(InvalidValue::no_match("Must be a mapping").into());
        };
        let mut checker = Checker::new(mapping);
        checker.check_dict(self, self.unhandled_ok)?;
        Ok(Value::Map(checker.into_output()))
    }

    pub(crate) fn type_name(&self) -> String {
        self.name.clone()
    }

    pub(crate) fn has_type_keys(&self) -> bool {
        !self.type_keys.is_empty()
    }

    /// Checked defaults of every value key, if every value key is an
    /// optional spec.
    fn composed_default(&self) -> Result<Option<Map>, SchemaError> {
        let mut defaults = Map::new();
        for (key, slot) in &self.value_keys {
            match slot {
                Slot::Type(BaseType::Spec(spec)) if spec.is_optional() => {
                    defaults.insert(key.clone(), spec.check_value(&spec.default_value())?);
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(defaults))
    }
}

/// Builder for a mapping spec.
#[derive(Debug, Clone)]
pub struct DictSpec {
    value_keys: Vec<(Value, PendingSlot)>,
    type_keys: Vec<(Descriptor, Descriptor)>,
    post: Vec<Post>,
    name: String,
    unhandled_ok: bool,
    auto_optional: bool,
    options: Options,
}

impl Default for DictSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl DictSpec {
    pub fn new() -> Self {
        Self {
            value_keys: Vec::new(),
            type_keys: Vec::new(),
            post: Vec::new(),
            name: "dict".to_string(),
            unhandled_ok: false,
            auto_optional: false,
            options: Options::default(),
        }
    }

    /// Require `key`, or fill it from `spec`'s default when `spec` is an
    /// optional spec.
    pub fn key(mut self, key: impl Into<Value>, spec: impl Into<Descriptor>) -> Self {
        self.value_keys
            .push((key.into(), PendingSlot::Type(spec.into())));
        self
    }

    /// Use `key` as a discriminator selecting an extra sub-schema.
    pub fn conditional_key(mut self, key: impl Into<Value>, conditional: Conditional) -> Self {
        self.value_keys
            .push((key.into(), PendingSlot::Conditional(conditional)));
        self
    }

    /// Accept any unclaimed key matching `pattern`, with a value matching
    /// `spec`.
    pub fn type_key(mut self, pattern: impl Into<Descriptor>, spec: impl Into<Descriptor>) -> Self {
        self.type_keys.push((pattern.into(), spec.into()));
        self
    }

    /// Schema-style declaration: exact keys become value keys, patterns
    /// become type keys.
    pub fn entry(self, key: impl Into<DictKey>, spec: impl Into<Descriptor>) -> Self {
        match key.into() {
            DictKey::Value(key) => self.key(key, spec),
            DictKey::Pattern(pattern) => self.type_key(pattern, spec),
        }
    }

    pub fn post(mut self, rule: impl Into<Post>) -> Self {
        self.post.push(rule.into());
        self
    }

    /// Name used as the spec's type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn unhandled_ok(mut self, unhandled_ok: bool) -> Self {
        self.unhandled_ok = unhandled_ok;
        self
    }

    /// Make the spec optional when every value key is an optional spec, with
    /// a default built from their defaults. A spec with only type keys
    /// becomes optional with an empty default.
    pub fn auto_optional(mut self, auto_optional: bool) -> Self {
        self.auto_optional = auto_optional;
        self
    }
}

impl SpecBuilder for DictSpec {
    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn build(mut self) -> Result<Spec, SchemaError> {
        if self.value_keys.is_empty() && self.type_keys.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        let value_keys = self
            .value_keys
            .into_iter()
            .map(|(key, slot)| -> Result<(Value, Slot), SchemaError> {
                let slot = match slot {
                    PendingSlot::Type(descriptor) => Slot::Type(descriptor.canonicalize()?),
                    PendingSlot::Conditional(conditional) => Slot::Conditional(conditional),
                };
                Ok((key, slot))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let type_keys = self
            .type_keys
            .into_iter()
            .map(|(pattern, spec)| -> Result<(BaseType, BaseType), SchemaError> {
                Ok((pattern.canonicalize()?, spec.canonicalize()?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rule = DictRule {
            value_keys,
            type_keys,
            post: self.post,
            name: self.name,
            unhandled_ok: self.unhandled_ok,
        };

        if self.auto_optional {
            if self.options.optional == Some(true) || self.options.default.is_some() {
                return Err(SchemaError::Conflict(
                    "auto_optional cannot be combined with optional or default".to_string(),
                ));
            }
            if rule.value_keys.is_empty() {
                self.options.optional = Some(true);
            } else if let Some(default) = rule.composed_default()? {
                self.options.optional = Some(true);
                self.options.default = Some(DefaultValue::Value(Value::Map(default)));
            }
        }

        Spec::assemble(
            Rule::Dict(rule),
            self.options
                .resolve(DefaultValue::Value(Value::Map(Map::new())), Unset::Falsy),
        )
    }
}

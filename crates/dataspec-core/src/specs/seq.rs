//! [`SeqSpec`]: fixed-length positional sequences.

use tracing::debug;

use crate::descriptor::{check_value_base_type, BaseType, Descriptor};
use crate::errors::{CheckError, CheckResult, Failure, InvalidValue, Location, SchemaError};
use crate::spec::{DefaultValue, Options, Spec, SpecBuilder, Unset};
use crate::specs::{Container, Rule};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SeqRule {
    positions: Vec<BaseType>,
    container: Container,
}

impl SeqRule {
    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        let Some(items) = value.as_slice() else {
            return Err(InvalidValue::no_match("Must be a sequence").into());
        };
        if items.len() != self.positions.len() {
            return Err(InvalidValue::new(format!(
                "Sequence must have exactly {} elements",
                self.positions.len()
            ))
            .into());
        }
        let mut checked = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (index, (base, item)) in self.positions.iter().zip(items).enumerate() {
            match check_value_base_type(base, item) {
                Ok(value) => checked.push(value),
                Err(CheckError::Invalid(e)) => failures.push(Failure::caused(
                    Some(Location::Index(index)),
                    format!("Sequence index {} is invalid", index),
                    e,
                )),
                Err(e) => return Err(e),
            }
        }
        if !failures.is_empty() {
            debug!(failures = failures.len(), "sequence does not conform");
            return Err(
                InvalidValue::aggregate("Sequence does not conform with spec", failures).into(),
            );
        }
        Ok(self.container.collect(checked))
    }

    pub(crate) fn type_name(&self) -> String {
        let names: Vec<String> = self.positions.iter().map(BaseType::type_name).collect();
        format!("sequence({})", names.join(", "))
    }

    /// Checked defaults of every position, if every position is an optional
    /// spec.
    fn composed_default(&self) -> Result<Option<Value>, SchemaError> {
        let mut defaults = Vec::with_capacity(self.positions.len());
        for base in &self.positions {
            match base.as_spec() {
                Some(spec) if spec.is_optional() => {
                    defaults.push(spec.check_value(&spec.default_value())?);
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(self.container.collect(defaults)))
    }
}

/// A sequence whose length equals the number of positions, each position
/// checked against its own descriptor.
pub struct SeqSpec {
    positions: Vec<Descriptor>,
    container: Container,
    auto_optional: bool,
    options: Options,
}

impl SeqSpec {
    pub fn new<I, D>(positions: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Descriptor>,
    {
        Self {
            positions: positions.into_iter().map(Into::into).collect(),
            container: Container::Tuple,
            auto_optional: false,
            options: Options::default(),
        }
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Make the spec optional when every position is an optional spec, with
    /// the positions' defaults as its default.
    pub fn auto_optional(mut self, auto_optional: bool) -> Self {
        self.auto_optional = auto_optional;
        self
    }
}

impl SpecBuilder for SeqSpec {
    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn build(mut self) -> Result<Spec, SchemaError> {
        let rule = SeqRule {
            positions: self
                .positions
                .into_iter()
                .map(Descriptor::canonicalize)
                .collect::<Result<_, _>>()?,
            container: self.container,
        };
        if self.auto_optional {
            if self.options.optional == Some(true) || self.options.default.is_some() {
                return Err(SchemaError::Conflict(
                    "auto_optional cannot be combined with optional or default".to_string(),
                ));
            }
            if rule.positions.is_empty() {
                return Err(SchemaError::Conflict(
                    "auto_optional needs at least one position".to_string(),
                ));
            }
            if let Some(default) = rule.composed_default()? {
                self.options.optional = Some(true);
                self.options.default = Some(DefaultValue::Value(default));
            }
        }
        Spec::assemble(
            Rule::Seq(rule),
            self.options
                .resolve(DefaultValue::Value(Value::List(Vec::new())), Unset::Falsy),
        )
    }
}

//! [`TypeSpec`]: a union of descriptors.

use crate::descriptor::{check_value_types, BaseType, Types};
use crate::errors::{CheckResult, SchemaError};
use crate::spec::{Common, DefaultValue, Options, Spec, SpecBuilder, Unset};
use crate::specs::Rule;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct UnionRule {
    types: Vec<BaseType>,
}

impl UnionRule {
    /// `optional` adds the null descriptor; a union containing it is optional.
    pub(crate) fn normalize(mut self, mut common: Common) -> (Self, Common) {
        if common.optional && !self.types.contains(&BaseType::None) {
            self.types.push(BaseType::None);
        }
        common.optional = self.types.contains(&BaseType::None);
        (self, common)
    }

    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        check_value_types(&self.types, value)
    }

    pub(crate) fn type_name(&self) -> String {
        let names: Vec<String> = self.types.iter().map(BaseType::type_name).collect();
        names.join("/")
    }
}

/// Any of several descriptors, tried in order.
pub struct TypeSpec {
    types: Types,
    options: Options,
}

impl TypeSpec {
    pub fn new(types: impl Into<Types>) -> Self {
        Self {
            types: types.into(),
            options: Options::default(),
        }
    }
}

impl SpecBuilder for TypeSpec {
    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn build(self) -> Result<Spec, SchemaError> {
        let rule = UnionRule {
            types: self.types.canonicalize()?,
        };
        Spec::assemble(
            Rule::Union(rule),
            self.options
                .resolve(DefaultValue::Value(Value::Null), Unset::Empty),
        )
    }
}

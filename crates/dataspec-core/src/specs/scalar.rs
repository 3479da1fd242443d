//! Single-type specs: [`Type`], [`CType`] and [`EnumSpec`].

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::descriptor::{check_value_base_type, BaseType, Descriptor};
use crate::errors::{CanonicalizeError, CheckError, CheckResult, InvalidValue, SchemaError};
use crate::spec::{Callback, CanonicalizeFn, Common, DefaultValue, Options, Spec, SpecBuilder, Unset};
use crate::specs::Rule;
use crate::value::Value;

/// How a recognized canonicalization failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Reclassify {
    /// The value was this type but failed refinement.
    Invalid,
    /// The value is treated as never having matched; unions move on.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Canonicalizer {
    f: Callback<CanonicalizeFn>,
    reclassify: Reclassify,
}

impl Canonicalizer {
    fn apply(&self, value: Value) -> CheckResult {
        match (self.f.get())(value) {
            Ok(value) => Ok(value),
            Err(CanonicalizeError::Other(e)) => Err(CheckError::Callback(Arc::from(e))),
            Err(e) => {
                let error =
                    InvalidValue::new(format!("{} during canonicalization: {}", e.class(), e));
                Err(match self.reclassify {
                    Reclassify::Invalid => error,
                    Reclassify::NoMatch => error.into_no_match(),
                }
                .into())
            }
        }
    }
}

fn canonicalize_with(canonicalizer: Option<&Canonicalizer>, value: Value) -> CheckResult {
    match canonicalizer {
        Some(c) => c.apply(value),
        None => Ok(value),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TypeRule {
    base: BaseType,
    canonicalizer: Option<Canonicalizer>,
}

impl TypeRule {
    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        check_value_base_type(&self.base, value)
    }

    pub(crate) fn canonicalize(&self, value: Value) -> CheckResult {
        canonicalize_with(self.canonicalizer.as_ref(), value)
    }

    pub(crate) fn type_name(&self) -> String {
        self.base.type_name()
    }
}

/// A single kind, boolean literal or null, with an optional canonicalizer.
///
/// A recognized canonicalizer failure is an ordinary validation failure:
/// inside a union, the union stops at this alternative.
pub struct Type {
    base: Descriptor,
    canonicalize: Option<Callback<CanonicalizeFn>>,
    options: Options,
}

impl Type {
    pub fn new(base: impl Into<Descriptor>) -> Self {
        Self {
            base: base.into(),
            canonicalize: None,
            options: Options::default(),
        }
    }

    pub fn canonicalize<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CanonicalizeError> + Send + Sync + 'static,
    {
        self.canonicalize = Some(Callback::canonicalizer(f));
        self
    }

    fn build_with(self, reclassify: Reclassify) -> Result<Spec, SchemaError> {
        let base = match self.base {
            Descriptor::Kind(kind) => BaseType::Kind(kind),
            Descriptor::Literal(b) => BaseType::Literal(b),
            Descriptor::None => BaseType::None,
            _ => {
                return Err(SchemaError::InvalidBaseType(
                    "Type only wraps a kind, a boolean literal or null".to_string(),
                ))
            }
        };
        let rule = TypeRule {
            base,
            canonicalizer: self
                .canonicalize
                .map(|f| Canonicalizer { f, reclassify }),
        };
        Spec::assemble(
            Rule::Type(rule),
            self.options
                .resolve(DefaultValue::Value(Value::Null), Unset::Empty),
        )
    }
}

impl SpecBuilder for Type {
    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn build(self) -> Result<Spec, SchemaError> {
        self.build_with(Reclassify::Invalid)
    }
}

/// Like [`Type`], but a recognized canonicalizer failure counts as "no type
/// match", so a union keeps trying later alternatives.
pub struct CType(Type);

impl CType {
    pub fn new(base: impl Into<Descriptor>) -> Self {
        CType(Type::new(base))
    }

    pub fn canonicalize<F>(self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CanonicalizeError> + Send + Sync + 'static,
    {
        CType(self.0.canonicalize(f))
    }
}

impl SpecBuilder for CType {
    fn options_mut(&mut self) -> &mut Options {
        self.0.options_mut()
    }

    fn build(self) -> Result<Spec, SchemaError> {
        self.0.build_with(Reclassify::NoMatch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct EnumRule {
    values: BTreeSet<Value>,
    canonicalizer: Option<Canonicalizer>,
}

impl EnumRule {
    /// Optionality lives in the value set: `optional` adds null, and a set
    /// containing null is optional.
    pub(crate) fn normalize(mut self, mut common: Common) -> (Self, Common) {
        if common.optional {
            self.values.insert(Value::Null);
        }
        common.optional = self.values.contains(&Value::Null);
        (self, common)
    }

    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        if self.values.contains(value) {
            Ok(value.clone())
        } else {
            Err(InvalidValue::no_match(format!("Must match {}", self.type_name())).into())
        }
    }

    pub(crate) fn canonicalize(&self, value: Value) -> CheckResult {
        canonicalize_with(self.canonicalizer.as_ref(), value)
    }

    pub(crate) fn type_name(&self) -> String {
        let values: Vec<String> = self.values.iter().map(Value::to_string).collect();
        format!("enum={}", values.join("/"))
    }
}

/// Membership in a fixed set of values.
pub struct EnumSpec {
    values: BTreeSet<Value>,
    canonicalize: Option<Callback<CanonicalizeFn>>,
    options: Options,
}

impl EnumSpec {
    pub fn new<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            canonicalize: None,
            options: Options::default(),
        }
    }

    pub fn canonicalize<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CanonicalizeError> + Send + Sync + 'static,
    {
        self.canonicalize = Some(Callback::canonicalizer(f));
        self
    }
}

impl SpecBuilder for EnumSpec {
    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    fn build(self) -> Result<Spec, SchemaError> {
        let rule = EnumRule {
            values: self.values,
            canonicalizer: self.canonicalize.map(|f| Canonicalizer {
                f,
                reclassify: Reclassify::Invalid,
            }),
        };
        Spec::assemble(
            Rule::Enum(rule),
            self.options
                .resolve(DefaultValue::Value(Value::Null), Unset::Falsy),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Kind;
    use std::fmt;

    #[derive(Debug)]
    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("broken canonicalizer")
        }
    }

    impl std::error::Error for Broken {}

    fn to_int(value: Value) -> Result<Value, CanonicalizeError> {
        match value {
            Value::Str(s) => Ok(Value::Int(s.trim().parse::<i64>()?)),
            other => Err(CanonicalizeError::wrong_type(format!("cannot parse {}", other))),
        }
    }

    #[test]
    fn test_type_canonicalizes_after_match() {
        let spec = Type::new(Kind::Str).canonicalize(to_int).build().unwrap();
        assert_eq!(spec.check_value(&" 42 ".into()).unwrap(), Value::Int(42));
        assert_eq!(spec.type_name(), "str");
    }

    #[test]
    fn test_type_reports_canonicalization_failure_as_invalid() {
        let spec = Type::new(Kind::Str).canonicalize(to_int).build().unwrap();
        let err = spec.check_value(&"abc".into()).unwrap_err().into_invalid().unwrap();
        assert!(!err.is_no_match());
        assert!(err
            .to_string()
            .starts_with("invalid value during canonicalization: "));
    }

    #[test]
    fn test_ctype_reports_canonicalization_failure_as_no_match() {
        let spec = CType::new(Kind::Str).canonicalize(to_int).build().unwrap();
        let err = spec.check_value(&"abc".into()).unwrap_err().into_invalid().unwrap();
        assert!(err.is_no_match());
    }

    #[test]
    fn test_other_canonicalizer_errors_pass_through() {
        let spec = Type::new(Kind::Str)
            .canonicalize(|_| Err(CanonicalizeError::other(Broken)))
            .build()
            .unwrap();
        let err = spec.check_value(&"x".into()).unwrap_err();
        assert!(matches!(err, CheckError::Callback(_)));
        assert!(err.to_string().contains("broken canonicalizer"));
    }

    #[test]
    fn test_type_rejects_nested_spec() {
        let inner = Type::new(Kind::Int).build().unwrap();
        assert!(matches!(
            Type::new(inner).build(),
            Err(SchemaError::InvalidBaseType(_))
        ));
    }

    #[test]
    fn test_optional_type_substitutes_default() {
        let spec = Type::new(Kind::Int).optional(true).default(8).build().unwrap();
        assert_eq!(spec.check_value(&Value::Null).unwrap(), Value::Int(8));
        assert_eq!(spec.check_value(&Value::Int(0)).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_invalid_default_is_schema_error() {
        let err = Type::new(Kind::Int)
            .optional(true)
            .default("eight")
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid schema, default value is spec-invalid: Must be int"
        );
    }

    #[test]
    fn test_optional_type_with_null_default_is_rejected() {
        // null is not an int, and the default is validated at construction
        assert!(Type::new(Kind::Int).optional(true).build().is_err());
        assert!(Type::new(Kind::Any).optional(true).build().is_ok());
    }

    #[test]
    fn test_enum_membership() {
        let spec = EnumSpec::new([1, 2, 3]).build().unwrap();
        assert_eq!(spec.check_value(&Value::Int(2)).unwrap(), Value::Int(2));
        let err = spec.check_value(&Value::Int(4)).unwrap_err().into_invalid().unwrap();
        assert_eq!(err.to_string(), "Must match enum=1/2/3");
        assert!(err.is_no_match());
    }

    #[test]
    fn test_optional_enum_adds_null() {
        let spec = EnumSpec::new(["a", "b"]).optional(true).build().unwrap();
        assert_eq!(spec.type_name(), "enum=null/\"a\"/\"b\"");
        assert_eq!(spec.check_value(&Value::Null).unwrap(), Value::Null);

        let implicit = EnumSpec::new([Value::Null, Value::from("a")]).build().unwrap();
        assert!(implicit.is_optional());
    }

    #[test]
    fn test_enum_canonicalizer_runs_after_membership() {
        let spec = EnumSpec::new(["on", "off"])
            .canonicalize(|v| Ok(Value::Bool(v.as_str() == Some("on"))))
            .build()
            .unwrap();
        assert_eq!(spec.check_value(&"on".into()).unwrap(), Value::Bool(true));
        assert_eq!(spec.check_value(&"off".into()).unwrap(), Value::Bool(false));
    }
}

//! Type descriptors and the base-type check.
//!
//! A [`BaseType`] is the canonical form of "something a value can be checked
//! against": a kind, a boolean literal, the null sentinel, or a nested spec.
//! A [`Descriptor`] is the shorthand accepted wherever a type is expected.
//! Shorthands (a list of types, a set of values, a key/type mapping or a
//! union) are turned into the equivalent spec when the enclosing spec is
//! built.

use std::fmt;

use tracing::trace;

use crate::dict::{DictKey, DictSpec};
use crate::errors::{CheckError, CheckResult, InvalidValue, SchemaError};
use crate::spec::{Spec, SpecBuilder};
use crate::specs::{EnumSpec, IterSpec, TypeSpec};
use crate::value::{Kind, Value};

/// Canonical type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Kind(Kind),
    /// Matches exactly this boolean.
    Literal(bool),
    /// Matches only null; marks unions as optional.
    None,
    Spec(Spec),
}

impl BaseType {
    pub fn type_name(&self) -> String {
        match self {
            BaseType::Kind(kind) => kind.name().to_string(),
            BaseType::Literal(b) => b.to_string(),
            BaseType::None => "null".to_string(),
            BaseType::Spec(spec) => spec.type_name(),
        }
    }

    pub fn as_spec(&self) -> Option<&Spec> {
        match self {
            BaseType::Spec(spec) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

impl From<Kind> for BaseType {
    fn from(kind: Kind) -> Self {
        BaseType::Kind(kind)
    }
}

impl From<bool> for BaseType {
    fn from(b: bool) -> Self {
        BaseType::Literal(b)
    }
}

impl From<Spec> for BaseType {
    fn from(spec: Spec) -> Self {
        BaseType::Spec(spec)
    }
}

/// Type descriptor as written by the user.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Kind(Kind),
    Literal(bool),
    None,
    Spec(Spec),
    /// Iterable of any of these types.
    List(Vec<Descriptor>),
    /// One of these values.
    Values(Vec<Value>),
    /// Mapping with these keys.
    Mapping(Vec<(DictKey, Descriptor)>),
    /// Any of these types.
    Union(Vec<Descriptor>),
}

impl Descriptor {
    pub fn list(types: impl Into<Types>) -> Self {
        Descriptor::List(types.into().0)
    }

    pub fn union(types: impl Into<Types>) -> Self {
        Descriptor::Union(types.into().0)
    }

    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Descriptor::Values(values.into_iter().map(Into::into).collect())
    }

    pub fn mapping<I, K, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<DictKey>,
        D: Into<Descriptor>,
    {
        Descriptor::Mapping(
            entries
                .into_iter()
                .map(|(k, d)| (k.into(), d.into()))
                .collect(),
        )
    }

    /// Turn the shorthand into its canonical form.
    pub fn canonicalize(self) -> Result<BaseType, SchemaError> {
        Ok(match self {
            Descriptor::Kind(kind) => BaseType::Kind(kind),
            Descriptor::Literal(b) => BaseType::Literal(b),
            Descriptor::None => BaseType::None,
            Descriptor::Spec(spec) => BaseType::Spec(spec),
            Descriptor::List(types) => BaseType::Spec(IterSpec::new(Types(types)).build()?),
            Descriptor::Values(values) => BaseType::Spec(EnumSpec::new(values).build()?),
            Descriptor::Union(types) => BaseType::Spec(TypeSpec::new(Types(types)).build()?),
            Descriptor::Mapping(entries) => {
                let spec = entries
                    .into_iter()
                    .fold(DictSpec::new(), |dict, (key, ty)| dict.entry(key, ty));
                BaseType::Spec(spec.build()?)
            }
        })
    }
}

impl From<Kind> for Descriptor {
    fn from(kind: Kind) -> Self {
        Descriptor::Kind(kind)
    }
}

impl From<bool> for Descriptor {
    fn from(b: bool) -> Self {
        Descriptor::Literal(b)
    }
}

impl From<Spec> for Descriptor {
    fn from(spec: Spec) -> Self {
        Descriptor::Spec(spec)
    }
}

impl From<&Spec> for Descriptor {
    fn from(spec: &Spec) -> Self {
        Descriptor::Spec(spec.clone())
    }
}

impl From<BaseType> for Descriptor {
    fn from(base: BaseType) -> Self {
        match base {
            BaseType::Kind(kind) => Descriptor::Kind(kind),
            BaseType::Literal(b) => Descriptor::Literal(b),
            BaseType::None => Descriptor::None,
            BaseType::Spec(spec) => Descriptor::Spec(spec),
        }
    }
}

/// One or more descriptors, in order.
#[derive(Debug, Clone, Default)]
pub struct Types(pub Vec<Descriptor>);

impl Types {
    pub(crate) fn canonicalize(self) -> Result<Vec<BaseType>, SchemaError> {
        self.0.into_iter().map(Descriptor::canonicalize).collect()
    }
}

impl From<Descriptor> for Types {
    fn from(descriptor: Descriptor) -> Self {
        Types(vec![descriptor])
    }
}

impl From<Kind> for Types {
    fn from(kind: Kind) -> Self {
        Types(vec![kind.into()])
    }
}

impl From<bool> for Types {
    fn from(b: bool) -> Self {
        Types(vec![b.into()])
    }
}

impl From<Spec> for Types {
    fn from(spec: Spec) -> Self {
        Types(vec![spec.into()])
    }
}

impl From<&Spec> for Types {
    fn from(spec: &Spec) -> Self {
        Types(vec![spec.into()])
    }
}

impl From<Vec<Descriptor>> for Types {
    fn from(descriptors: Vec<Descriptor>) -> Self {
        Types(descriptors)
    }
}

impl<const N: usize> From<[Descriptor; N]> for Types {
    fn from(descriptors: [Descriptor; N]) -> Self {
        Types(descriptors.into())
    }
}

impl<const N: usize> From<[Kind; N]> for Types {
    fn from(kinds: [Kind; N]) -> Self {
        Types(kinds.into_iter().map(Descriptor::Kind).collect())
    }
}

/// `Must be X` for one name, `Must be one of: a, b` for several.
pub(crate) fn must_be<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: fmt::Display,
{
    let names: Vec<String> = names.into_iter().map(|n| n.to_string()).collect();
    match names.as_slice() {
        [single] => format!("Must be {}", single),
        _ => format!("Must be one of: {}", names.join(", ")),
    }
}

/// Check `value` against one base type and return the checked value.
///
/// Kinds, literals and null only decide membership and return the value as
/// given. A nested spec runs its full check, so the result is canonical.
pub fn check_value_base_type(base: &BaseType, value: &Value) -> CheckResult {
    let matched = match base {
        BaseType::Kind(kind) => kind.matches(value),
        BaseType::Literal(b) => value.as_bool() == Some(*b),
        BaseType::None => value.is_null(),
        BaseType::Spec(spec) => return spec.check_value(value),
    };
    if matched {
        Ok(value.clone())
    } else {
        Err(InvalidValue::no_match(must_be([base])).into())
    }
}

/// Check `value` against alternatives in order.
///
/// An alternative that reports "no type match" is skipped. The first result
/// that is a success or any other failure is returned as is. When every
/// alternative is skipped the error names all of them.
pub fn check_value_types(types: &[BaseType], value: &Value) -> CheckResult {
    for base in types {
        match check_value_base_type(base, value) {
            Err(CheckError::Invalid(e)) if e.is_no_match() => {
                trace!(candidate = %base, "no type match, trying next alternative");
            }
            other => return other,
        }
    }
    Err(InvalidValue::no_match(must_be(types)).into())
}

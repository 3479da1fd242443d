//! Spec kinds other than mappings.
//!
//! Each kind has a public builder and a crate-private rule. [`Rule`] is the
//! closed set of rules a [`Spec`](crate::Spec) can carry, and dispatches the
//! structural check, canonicalization and naming to the right one.

mod iter;
mod scalar;
mod seq;
mod union;

pub use iter::{Container, IterSpec};
pub use scalar::{CType, EnumSpec, Type};
pub use seq::SeqSpec;
pub use union::TypeSpec;

pub(crate) use iter::IterRule;
pub(crate) use scalar::{EnumRule, TypeRule};
pub(crate) use seq::SeqRule;
pub(crate) use union::UnionRule;

use crate::dict::DictRule;
use crate::errors::CheckResult;
use crate::spec::Common;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Rule {
    Type(TypeRule),
    Enum(EnumRule),
    Union(UnionRule),
    Iter(IterRule),
    Seq(SeqRule),
    Dict(DictRule),
}

impl Rule {
    /// Reconcile the rule with the common settings before the spec is sealed.
    pub(crate) fn normalize(self, common: Common) -> (Rule, Common) {
        match self {
            Rule::Enum(rule) => {
                let (rule, common) = rule.normalize(common);
                (Rule::Enum(rule), common)
            }
            Rule::Union(rule) => {
                let (rule, common) = rule.normalize(common);
                (Rule::Union(rule), common)
            }
            other => (other, common),
        }
    }

    pub(crate) fn check(&self, value: &Value) -> CheckResult {
        match self {
            Rule::Type(rule) => rule.check(value),
            Rule::Enum(rule) => rule.check(value),
            Rule::Union(rule) => rule.check(value),
            Rule::Iter(rule) => rule.check(value),
            Rule::Seq(rule) => rule.check(value),
            Rule::Dict(rule) => rule.check(value),
        }
    }

    pub(crate) fn canonicalize(&self, value: Value) -> CheckResult {
        match self {
            Rule::Type(rule) => rule.canonicalize(value),
            Rule::Enum(rule) => rule.canonicalize(value),
            _ => Ok(value),
        }
    }

    pub(crate) fn type_name(&self) -> String {
        match self {
            Rule::Type(rule) => rule.type_name(),
            Rule::Enum(rule) => rule.type_name(),
            Rule::Union(rule) => rule.type_name(),
            Rule::Iter(rule) => rule.type_name(),
            Rule::Seq(rule) => rule.type_name(),
            Rule::Dict(rule) => rule.type_name(),
        }
    }
}

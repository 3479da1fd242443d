//! Declarative validation and canonicalization of loosely-typed data.
//!
//! This crate checks nested [`Value`] trees (typically loaded from YAML or
//! JSON configuration) against immutable, composable specs:
//!
//! - **Leaf specs**: [`Type`], [`CType`] and [`EnumSpec`], with optional
//!   canonicalizers and constraints
//! - **Unions**: [`TypeSpec`] tries alternatives in order
//! - **Collections**: [`IterSpec`] for homogeneous iterables, [`SeqSpec`] for
//!   fixed-length sequences
//! - **Mappings**: [`DictSpec`] with exact keys, key patterns, conditional
//!   sub-schemas ([`ConditionalDictSpec`]) and post rules ([`Update`],
//!   [`Test`])
//!
//! A check returns the canonical form of the value, or an [`InvalidValue`]
//! listing every failure found, each located by index or key.
//!
//! # Example
//!
//! ```rust,ignore
//! use dataspec_core::prelude::*;
//!
//! let server = DictSpec::new()
//!     .key("host", Kind::Str)
//!     .key("port", Type::new(Kind::Int).optional(true).default(80).build()?)
//!     .key("tags", Descriptor::list(Kind::Str))
//!     .build()?;
//!
//! let checked = server.check_value(&Value::map([("host", "web"), ("tags", Value::list(["a"]))]))?;
//! assert_eq!(checked.get("port"), Some(&Value::Int(80)));
//! ```
//!
//! # Serde (default feature)
//!
//! With the `serde` feature, [`Value`] implements `Serialize` and
//! `Deserialize` and converts from `serde_json::Value`.

mod constraint;
mod descriptor;
mod dict;
mod errors;
mod spec;
mod specs;
mod value;

pub mod prelude;

// Re-export public types
pub use constraint::Constraint;
pub use descriptor::{check_value_base_type, check_value_types, BaseType, Descriptor, Types};
pub use dict::{Conditional, ConditionalDictSpec, DictKey, DictSpec, Post, RefFn, Test, Update};
pub use errors::{
    CallbackError, CanonicalizeError, CheckError, CheckResult, Failure, InvalidValue, Issue,
    Location, SchemaError,
};
pub use spec::{
    Callback, CanonicalizeFn, DefaultValue, Options, PredicateFn, ProducerFn, Spec, SpecBuilder,
    Unset,
};
pub use specs::{CType, Container, EnumSpec, IterSpec, SeqSpec, Type, TypeSpec};
pub use value::{Kind, Map, Value};

// Serde integration (feature-gated)
#[cfg(feature = "serde")]
mod convert;
#[cfg(feature = "serde")]
pub use convert::ConvertError;

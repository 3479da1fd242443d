//! Everything needed to declare and check specs.
//!
//! ```rust,ignore
//! use dataspec_core::prelude::*;
//! ```

pub use crate::constraint::Constraint;
pub use crate::descriptor::{BaseType, Descriptor};
pub use crate::dict::{ConditionalDictSpec, DictKey, DictSpec, Test, Update};
pub use crate::errors::{CanonicalizeError, CheckError, InvalidValue, SchemaError};
pub use crate::spec::{DefaultValue, Spec, SpecBuilder, Unset};
pub use crate::specs::{CType, Container, EnumSpec, IterSpec, SeqSpec, Type, TypeSpec};
pub use crate::value::{Kind, Map, Value};

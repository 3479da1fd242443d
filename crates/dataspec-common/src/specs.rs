//! Ready-made specs for common configuration values.
//!
//! Each function builds a fresh [`Spec`]. Specs are cheap to clone, so build
//! once and share the result when the same spec is used in several places.

use std::net::{Ipv4Addr, Ipv6Addr};

use dataspec_core::{
    CType, CanonicalizeError, Constraint, Container, Descriptor, IterSpec, Kind, SchemaError, Spec,
    SpecBuilder, Type, TypeSpec, Value,
};

use crate::constraints;

fn text(value: &Value) -> Result<&str, CanonicalizeError> {
    value
        .as_str()
        .ok_or_else(|| CanonicalizeError::wrong_type(format!("expected a string, got {}", value)))
}

/// `kind` or null, defaulting to null.
fn optional(kind: Kind) -> Result<Spec, SchemaError> {
    TypeSpec::new([Descriptor::from(kind), Descriptor::None]).build()
}

pub fn optional_bool() -> Result<Spec, SchemaError> {
    optional(Kind::Bool)
}

pub fn optional_str() -> Result<Spec, SchemaError> {
    optional(Kind::Str)
}

pub fn optional_int() -> Result<Spec, SchemaError> {
    optional(Kind::Int)
}

pub fn optional_float() -> Result<Spec, SchemaError> {
    optional(Kind::Float)
}

/// An integer, or a string holding one (`"42"` becomes `42`).
pub fn user_integer() -> Result<Spec, SchemaError> {
    let parsed = CType::new(Kind::Str)
        .canonicalize(|v| Ok(Value::Int(text(&v)?.trim().parse::<i64>()?)))
        .build()?;
    TypeSpec::new([Descriptor::from(Kind::Int), parsed.into()]).build()
}

/// A float, or a string holding one (`"2.5"` becomes `2.5`).
pub fn user_float() -> Result<Spec, SchemaError> {
    let parsed = CType::new(Kind::Str)
        .canonicalize(|v| Ok(Value::Float(text(&v)?.trim().parse::<f64>()?)))
        .build()?;
    TypeSpec::new([Descriptor::from(Kind::Float), parsed.into()]).build()
}

/// [`user_integer`], falling back to [`user_float`].
pub fn number() -> Result<Spec, SchemaError> {
    TypeSpec::new([Descriptor::from(user_integer()?), user_float()?.into()]).build()
}

pub fn lowercased_str() -> Result<Spec, SchemaError> {
    Type::new(Kind::Str)
        .canonicalize(|v| Ok(Value::from(text(&v)?.to_lowercase())))
        .build()
}

pub fn str_list() -> Result<Spec, SchemaError> {
    IterSpec::new(Kind::Str).build()
}

pub fn str_set() -> Result<Spec, SchemaError> {
    IterSpec::new(Kind::Str).container(Container::Set).build()
}

pub fn lowercased_str_list() -> Result<Spec, SchemaError> {
    IterSpec::new(lowercased_str()?).build()
}

pub fn lowercased_str_set() -> Result<Spec, SchemaError> {
    IterSpec::new(lowercased_str()?)
        .container(Container::Set)
        .build()
}

/// A list of `kind`, or a single `kind` value wrapped into a one-element
/// list.
pub fn list_or_single(kind: Kind) -> Result<Spec, SchemaError> {
    let single = Type::new(kind)
        .canonicalize(|v| Ok(Value::List(vec![v])))
        .build()?;
    TypeSpec::new([Descriptor::from(IterSpec::new(kind).build()?), single.into()]).build()
}

pub fn str_list_or_single() -> Result<Spec, SchemaError> {
    list_or_single(Kind::Str)
}

/// A dotted-quad IPv4 address, normalized.
pub fn ipv4_address() -> Result<Spec, SchemaError> {
    Type::new(Kind::Str)
        .canonicalize(|v| Ok(Value::from(text(&v)?.parse::<Ipv4Addr>()?.to_string())))
        .build()
}

/// An IPv6 address in its compressed form (`0:0::1` becomes `::1`).
pub fn ipv6_address() -> Result<Spec, SchemaError> {
    Type::new(Kind::Str)
        .canonicalize(|v| Ok(Value::from(text(&v)?.parse::<Ipv6Addr>()?.to_string())))
        .build()
}

pub fn port_number_constraint() -> Constraint {
    Constraint::new(
        |v| v.as_i64().is_some_and(|port| (1..=65535).contains(&port)),
        "Must be in port number range 1-65535",
    )
}

/// A [`user_integer`] in 1-65535.
pub fn port_number() -> Result<Spec, SchemaError> {
    user_integer()?.add_constraints([port_number_constraint()])
}

pub fn word_constraint() -> Result<Constraint, SchemaError> {
    constraints::matching(r"^\w*$", "Must contain only word characters")
}

/// A string of word characters only (letters, digits, underscore).
pub fn word_str() -> Result<Spec, SchemaError> {
    Type::new(Kind::Str).constraints([word_constraint()?]).build()
}

pub fn word_str_minlength_3() -> Result<Spec, SchemaError> {
    word_str()?.add_constraints([constraints::min_len(3)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataspec_core::{CheckError, InvalidValue};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn invalid(result: Result<Value, CheckError>) -> InvalidValue {
        match result {
            Err(CheckError::Invalid(e)) => e,
            other => panic!("expected an invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_scalars_default_to_null() {
        for spec in [optional_bool(), optional_str(), optional_int(), optional_float()] {
            let spec = spec.unwrap();
            assert!(spec.is_optional());
            assert_eq!(spec.check_value(&Value::Null).unwrap(), Value::Null);
        }
        assert_eq!(optional_str().unwrap().type_name(), "str/null");
        assert_eq!(optional_bool().unwrap().check_value(&Value::Bool(false)).unwrap(), Value::Bool(false));
        assert_eq!(optional_int().unwrap().check_value(&Value::Int(0)).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_user_integer() {
        let spec = user_integer().unwrap();
        assert_eq!(spec.check_value(&Value::Int(7)).unwrap(), Value::Int(7));
        assert_eq!(spec.check_value(&Value::from(" 42 ")).unwrap(), Value::Int(42));
        let err = invalid(spec.check_value(&Value::from("forty")));
        assert_snapshot!(err.to_string(), @"Must be one of: int, str");
    }

    #[test]
    fn test_number_prefers_integers() {
        let spec = number().unwrap();
        assert_eq!(spec.check_value(&Value::from("3")).unwrap(), Value::Int(3));
        assert_eq!(spec.check_value(&Value::from("3.5")).unwrap(), Value::Float(3.5));
        assert_eq!(spec.check_value(&Value::Float(0.25)).unwrap(), Value::Float(0.25));
        assert!(spec.check_value(&Value::from("x")).is_err());
    }

    #[test]
    fn test_string_collections() {
        assert_eq!(
            lowercased_str_list()
                .unwrap()
                .check_value(&Value::list(["A", "b"]))
                .unwrap(),
            Value::list(["a", "b"])
        );
        assert_eq!(
            lowercased_str_set()
                .unwrap()
                .check_value(&Value::list(["A", "a"]))
                .unwrap(),
            Value::set(["a"])
        );
        assert_eq!(
            str_set().unwrap().check_value(&Value::tuple(["x", "x"])).unwrap(),
            Value::set(["x"])
        );
        let err = invalid(str_list().unwrap().check_value(&Value::list([Value::from("a"), Value::Int(1)])));
        assert_eq!(err.messages().collect::<Vec<_>>(), vec!["Index 1 is invalid: Must be str"]);
    }

    #[test]
    fn test_list_or_single() {
        let spec = str_list_or_single().unwrap();
        assert_eq!(spec.check_value(&Value::from("a")).unwrap(), Value::list(["a"]));
        assert_eq!(spec.check_value(&Value::list(["a", "b"])).unwrap(), Value::list(["a", "b"]));

        let ints = list_or_single(Kind::Int).unwrap();
        assert_eq!(ints.check_value(&Value::Int(1)).unwrap(), Value::list([1]));
        assert!(ints.check_value(&Value::from("1")).is_err());
    }

    #[test]
    fn test_ip_addresses() {
        let v4 = ipv4_address().unwrap();
        assert_eq!(v4.check_value(&Value::from("10.0.0.1")).unwrap(), Value::from("10.0.0.1"));
        let err = invalid(v4.check_value(&Value::from("10.0.0.256")));
        assert_snapshot!(err.to_string(), @"invalid value during canonicalization: invalid IPv4 address syntax");

        let v6 = ipv6_address().unwrap();
        assert_eq!(v6.check_value(&Value::from("0:0::1")).unwrap(), Value::from("::1"));
        assert!(v6.check_value(&Value::from("10.0.0.1")).is_err());
    }

    #[test]
    fn test_port_number() {
        let spec = port_number().unwrap();
        assert_eq!(spec.check_value(&Value::from("8080")).unwrap(), Value::Int(8080));
        let err = invalid(spec.check_value(&Value::Int(70000)));
        assert_snapshot!(err.to_string(), @"Does not meet value constraint: Must be in port number range 1-65535");
    }

    #[test]
    fn test_word_str() {
        let spec = word_str().unwrap();
        assert!(spec.check_value(&Value::from("snake_case_1")).is_ok());
        assert!(spec.check_value(&Value::from("")).is_ok());
        let err = invalid(spec.check_value(&Value::from("with space")));
        assert_snapshot!(err.to_string(), @"Does not meet value constraint: Must contain only word characters");

        let min3 = word_str_minlength_3().unwrap();
        let err = invalid(min3.check_value(&Value::from("a b")));
        assert_eq!(
            err.to_string(),
            "Does not meet value constraints:\n-- Must contain only word characters"
        );
        let err = invalid(min3.check_value(&Value::from("ab")));
        assert_eq!(err.messages().collect::<Vec<_>>(), vec!["Must have length >= 3"]);
    }
}

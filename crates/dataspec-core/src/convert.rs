//! Conversions between [`Value`] and serde data.
//!
//! `Value` implements `Serialize` and `Deserialize`, so it can be loaded from
//! any self-describing format (JSON, YAML, ...). Sequences load as lists and
//! mappings keep their keys as values, so YAML mappings with integer keys
//! survive the trip.

use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::value::{Map, Value};

/// A [`Value`] has no JSON counterpart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("JSON object keys must be strings, found {0}")]
    NonStringKey(String),

    #[error("JSON numbers must be finite, found {0}")]
    NonFiniteFloat(f64),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::new();
        while let Some((k, v)) = access.next_entry()? {
            map.insert(k, v);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = ConvertError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or(ConvertError::NonFiniteFloat(f))?,
            Value::Str(s) => serde_json::Value::String(s),
            Value::List(items) | Value::Tuple(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Set(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(map) => {
                let mut object = serde_json::Map::new();
                for (k, v) in map {
                    let Value::Str(key) = k else {
                        return Err(ConvertError::NonStringKey(k.to_string()));
                    };
                    object.insert(key, serde_json::Value::try_from(v)?);
                }
                serde_json::Value::Object(object)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"name": "web", "port": 80, "ratio": 0.5, "tags": ["a"], "extra": null}));
        assert_eq!(
            value,
            Value::map([
                ("name", Value::from("web")),
                ("port", Value::Int(80)),
                ("ratio", Value::Float(0.5)),
                ("tags", Value::list(["a"])),
                ("extra", Value::Null),
            ])
        );
    }

    #[test]
    fn test_to_json() {
        let value = Value::map([
            ("ids", Value::set([2, 1])),
            ("pair", Value::tuple([true, false])),
        ]);
        let json = serde_json::Value::try_from(value).unwrap();
        assert_eq!(json, json!({"ids": [1, 2], "pair": [true, false]}));
    }

    #[test]
    fn test_to_json_rejects_what_json_cannot_hold() {
        assert_eq!(
            serde_json::Value::try_from(Value::map([(1, 2)])),
            Err(ConvertError::NonStringKey("1".to_string()))
        );
        assert!(matches!(
            serde_json::Value::try_from(Value::list([f64::INFINITY])),
            Err(ConvertError::NonFiniteFloat(_))
        ));
    }

    #[test]
    fn test_yaml_keeps_non_string_keys() {
        let value: Value = serde_yaml::from_str("1: one\ntwo: [2, 2.5]\nthree: ~\n").unwrap();
        assert_eq!(
            value,
            Value::map([
                (Value::Int(1), Value::from("one")),
                (Value::from("two"), Value::list([Value::Int(2), Value::Float(2.5)])),
                (Value::from("three"), Value::Null),
            ])
        );
    }

    #[test]
    fn test_serialize_round_trips_through_json_text() {
        let value = Value::map([("a", Value::list([1, 2])), ("b", Value::Bool(true))]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"a":[1,2],"b":true}"#);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}

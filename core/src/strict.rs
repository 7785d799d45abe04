//! Typed conversion of decoded JSON with case-insensitive field matching.
//!
//! # Design
//! `CaseInsensitive` wraps a `serde_json::Value` and implements
//! `Deserializer`. When the target asks for a struct, serde hands over the
//! struct's declared field names; object keys that match one of them
//! ignoring ASCII case are renamed to the declared spelling before the
//! visitor sees them. Nested objects and arrays are wrapped again, so the
//! matching applies at every depth. Keys with an exact match are left alone.

use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Deserializer};
use serde_json::{Map, Value};

/// Deserialize `value` into `T`, optionally matching field names case-insensitively.
pub fn convert<T: DeserializeOwned>(value: Value, case_insensitive: bool) -> Result<T, serde_json::Error> {
    if case_insensitive && !value.is_string() {
        T::deserialize(CaseInsensitive(value))
    } else {
        serde_json::from_value(value)
    }
}

/// Case-insensitive view over a JSON value.
#[derive(Debug, Clone)]
pub struct CaseInsensitive(pub Value);

impl<'de> IntoDeserializer<'de, serde_json::Error> for CaseInsensitive {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn canonicalize(map: Map<String, Value>, fields: &'static [&'static str]) -> Vec<(String, CaseInsensitive)> {
    map.into_iter()
        .map(|(key, value)| {
            let key = if fields.contains(&key.as_str()) {
                key
            } else {
                fields
                    .iter()
                    .find(|f| f.eq_ignore_ascii_case(&key))
                    .map_or(key, |f| (*f).to_string())
            };
            (key, CaseInsensitive(value))
        })
        .collect()
}

fn visit_entries<'de, V: Visitor<'de>>(
    entries: Vec<(String, CaseInsensitive)>,
    visitor: V,
) -> Result<V::Value, serde_json::Error> {
    let mut map: MapDeserializer<'de, _, serde_json::Error> = MapDeserializer::new(entries.into_iter());
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

impl<'de> Deserializer<'de> for CaseInsensitive {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => {
                let mut seq: SeqDeserializer<_, serde_json::Error> =
                    SeqDeserializer::new(items.into_iter().map(CaseInsensitive));
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            Value::Object(map) => {
                let entries = map.into_iter().map(|(k, v)| (k, CaseInsensitive(v))).collect();
                visit_entries(entries, visitor)
            }
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visit_entries(canonicalize(map, fields), visitor),
            other => CaseInsensitive(other).deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(CaseInsensitive(other)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let value = match self.0 {
            Value::String(s) => Value::String(
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(&s))
                    .map_or(s, |v| (*v).to_string()),
            ),
            other => other,
        };
        value.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

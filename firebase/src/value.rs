//! Firestore's typed value encoding
//!
//! Every field on the wire is an object with exactly one key naming its type,
//! e.g. `{"stringValue": "Milk"}` or `{"integerValue": "2"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single Firestore field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// `null`
    NullValue(()),
    /// Boolean
    BooleanValue(bool),
    /// 64-bit integer, carried as a decimal string
    IntegerValue(#[serde(with = "integer_string")] i64),
    /// Double precision float
    DoubleValue(f64),
    /// RFC 3339 timestamp
    TimestampValue(DateTime<Utc>),
    /// UTF-8 string
    StringValue(String),
    /// Base64 encoded bytes
    BytesValue(String),
    /// Resource name of another document
    ReferenceValue(String),
    /// Latitude/longitude pair, kept opaque
    GeoPointValue(serde_json::Value),
    /// Array of values
    ArrayValue(ArrayValue),
    /// Nested map of values
    MapValue(MapValue),
}

/// Payload of [`Value::ArrayValue`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Elements; omitted on the wire when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// Payload of [`Value::MapValue`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// Entries; omitted on the wire when empty
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    /// String contents, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    /// Integer contents; whole doubles are accepted too
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // checked with fract() first
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::IntegerValue(n) => Some(*n),
            Self::DoubleValue(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            _ => None,
        }
    }

    /// Timestamp contents, if this is a timestamp
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::TimestampValue(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::StringValue(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::StringValue(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::IntegerValue(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::BooleanValue(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::TimestampValue(value)
    }
}

mod integer_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(n),
        }
    }
}

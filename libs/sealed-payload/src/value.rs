use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

/// Structured value decoded from a MessagePack document.
///
/// A closed union so conversion to JSON stays exhaustive. 64-bit integer
/// markers never produce [`Value::Integer`]: they decode to [`Value::String`]
/// holding the decimal digits.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Binary(Bytes),
    Array(Vec<Value>),
    /// Entries in wire order; duplicate keys are kept until JSON conversion
    Map(Vec<(String, Value)>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Convert to a JSON value.
    ///
    /// - Non-finite floats become `null`
    /// - Binary becomes an array of byte values
    /// - Timestamps become RFC 3339 UTC strings with millisecond precision
    /// - Duplicate map keys: the last value wins, the first position is kept
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Nil => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Integer(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::String(s) => Json::String(s.clone()),
            Self::Binary(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => {
                let mut object = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries {
                    object.insert(key.clone(), value.to_json());
                }
                Json::Object(object)
            }
            Self::Timestamp(ts) => Json::String(format_timestamp(ts)),
        }
    }
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! Attribute Values - Validated, Immutable Records
//!
//! An `AttributeRecord` is only ever produced by schema validation. Its keys
//! follow schema declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A leaf value: the only primitives the synthesis engine accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<usize> for Scalar {
    fn from(n: usize) -> Self {
        Scalar::Number((n as u64).into())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(Scalar),
    List(Vec<AttrValue>),
    /// Free-keyed map (tags); keys are kept exactly as supplied.
    Map(IndexMap<String, AttrValue>),
    Record(AttributeRecord),
}

impl AttrValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            AttrValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_record(&self) -> Option<&AttributeRecord> {
        match self {
            AttrValue::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            AttrValue::Scalar(s) => s.to_value(),
            AttrValue::List(items) => Value::Array(items.iter().map(AttrValue::to_value).collect()),
            AttrValue::Map(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_value())).collect(),
            ),
            AttrValue::Record(record) => Value::Object(record.to_map()),
        }
    }
}

/// The validated, defaulted result of applying a schema to raw input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRecord {
    fields: IndexMap<String, AttrValue>,
}

impl AttributeRecord {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: String, value: AttrValue) {
        self.fields.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        match self.get(key)?.as_scalar()? {
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.as_scalar()? {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn record(&self, key: &str) -> Option<&AttributeRecord> {
        self.get(key).and_then(AttrValue::as_record)
    }

    pub fn list(&self, key: &str) -> Option<&[AttrValue]> {
        self.get(key).and_then(AttrValue::as_list)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Export as a plain JSON map; re-validating it yields an equal record.
    pub fn to_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect()
    }
}

impl Serialize for AttributeRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Canonical key form: `ActionName`, `actionName`, `:action_name`,
/// `ACTION_NAME` and `action-name` all become `action_name`.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.strip_prefix(':').unwrap_or(raw);
    let mut out = String::with_capacity(trimmed.len() + 4);
    let mut prev: Option<char> = None;
    for c in trimmed.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
        } else if c.is_uppercase() {
            if matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Case- and separator-insensitive lookup form: `deLay_seconds`,
/// `DELAY-SECONDS` and `delaySeconds` all fold to `delayseconds`.
pub fn fold_key(raw: &str) -> String {
    raw.strip_prefix(':')
        .unwrap_or(raw)
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

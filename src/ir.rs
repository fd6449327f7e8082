//! Block IR - Ordered Trees for the Synthesis Engine
//!
//! Keys keep insertion order so the serialized form is stable for golden-file
//! comparison.

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Scalar;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IrValue {
    Scalar(Scalar),
    List(Vec<IrValue>),
    Node(IrNode),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IrNode {
    entries: IndexMap<String, IrValue>,
}

impl IrNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-inserting a key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: IrValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn merge(&mut self, other: IrNode) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, key: &str) -> Option<&IrValue> {
        self.entries.get(key)
    }

    pub fn node(&self, key: &str) -> Option<&IrNode> {
        match self.get(key)? {
            IrValue::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[IrValue]> {
        match self.get(key)? {
            IrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        match self.get(key)? {
            IrValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_homogeneous(&self) -> bool {
        self.entries.values().all(IrValue::is_homogeneous)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl IrValue {
    /// Every list in the tree holds elements of one shape.
    pub fn is_homogeneous(&self) -> bool {
        match self {
            IrValue::Scalar(_) => true,
            IrValue::Node(n) => n.is_homogeneous(),
            IrValue::List(items) => {
                let same_shape = items
                    .windows(2)
                    .all(|w| std::mem::discriminant(&w[0]) == std::mem::discriminant(&w[1]));
                same_shape && items.iter().all(IrValue::is_homogeneous)
            }
        }
    }
}

//! Builders - Attribute Records to Block IR
//!
//! Builders are pure: the same record always yields the same tree. Output keys
//! are the camelCase form of field names unless a mapping overrides them, and
//! absent fields are never emitted.

use std::sync::Arc;

use crate::ir::{IrNode, IrValue};
use crate::schema::{FieldKind, Schema};
use crate::value::{AttrValue, AttributeRecord};

pub trait Builder: Send + Sync {
    /// Writes this builder's keys into `node`.
    fn populate(&self, record: &AttributeRecord, node: &mut IrNode);

    fn build(&self, record: &AttributeRecord) -> IrNode {
        let mut node = IrNode::new();
        self.populate(record, &mut node);
        node
    }
}

/// `action_name` -> `actionName`
pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

enum Emit {
    Value,
    Child(Arc<dyn Builder>),
}

struct Mapping {
    field: String,
    key: String,
    emit: Emit,
}

/// Field-to-key mapping for one block. Keys are emitted in mapping order.
#[derive(Default)]
pub struct BlockBuilder {
    mappings: Vec<Mapping>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One mapping per schema field in declaration order; nested schemas get
    /// their own derived builders.
    pub fn from_schema(schema: &Schema) -> Self {
        schema
            .fields()
            .iter()
            .fold(Self::new(), |builder, field| match field.kind() {
                FieldKind::Nested(inner) => builder.child(field.name(), Self::from_schema(inner)),
                FieldKind::ArrayOf(element) => match element.as_ref() {
                    FieldKind::Nested(inner) => builder.child(field.name(), Self::from_schema(inner)),
                    _ => builder.value(field.name()),
                },
                _ => builder.value(field.name()),
            })
    }

    pub fn value(self, field: &str) -> Self {
        let key = to_camel_case(field);
        self.value_as(field, &key)
    }

    pub fn value_as(mut self, field: &str, key: &str) -> Self {
        self.mappings.push(Mapping {
            field: field.to_string(),
            key: key.to_string(),
            emit: Emit::Value,
        });
        self
    }

    /// Delegates a nested record, or each record of a list, to `builder`.
    pub fn child(self, field: &str, builder: impl Builder + 'static) -> Self {
        let key = to_camel_case(field);
        self.child_as(field, &key, builder)
    }

    pub fn child_as(mut self, field: &str, key: &str, builder: impl Builder + 'static) -> Self {
        self.mappings.push(Mapping {
            field: field.to_string(),
            key: key.to_string(),
            emit: Emit::Child(Arc::new(builder)),
        });
        self
    }
}

impl Builder for BlockBuilder {
    fn populate(&self, record: &AttributeRecord, node: &mut IrNode) {
        for mapping in &self.mappings {
            let Some(value) = record.get(&mapping.field) else {
                continue;
            };
            let emitted = match &mapping.emit {
                Emit::Value => lower(value),
                Emit::Child(child) => delegate(child.as_ref(), value),
            };
            node.insert(mapping.key.clone(), emitted);
        }
    }
}

fn delegate(child: &dyn Builder, value: &AttrValue) -> IrValue {
    match value {
        AttrValue::Record(r) => IrValue::Node(child.build(r)),
        AttrValue::List(items) => IrValue::List(items.iter().map(|item| delegate(child, item)).collect()),
        other => lower(other),
    }
}

/// Structural lowering without a dedicated builder.
fn lower(value: &AttrValue) -> IrValue {
    match value {
        AttrValue::Scalar(s) => IrValue::Scalar(s.clone()),
        AttrValue::List(items) => IrValue::List(items.iter().map(lower).collect()),
        AttrValue::Map(map) => {
            let mut node = IrNode::new();
            for (k, v) in map {
                node.insert(k.clone(), lower(v));
            }
            IrValue::Node(node)
        }
        AttrValue::Record(r) => {
            let mut node = IrNode::new();
            for (k, v) in r.iter() {
                node.insert(to_camel_case(k), lower(v));
            }
            IrValue::Node(node)
        }
    }
}

/// Several independent builders filling disjoint keys of one node.
#[derive(Default)]
pub struct Composite {
    parts: Vec<Box<dyn Builder>>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, part: impl Builder + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }
}

impl Builder for Composite {
    fn populate(&self, record: &AttributeRecord, node: &mut IrNode) {
        for part in &self.parts {
            let fragment = part.build(record);
            debug_assert!(
                fragment.keys().all(|key| node.get(key).is_none()),
                "composite parts overlap"
            );
            node.merge(fragment);
        }
    }
}

/// Places another builder's output under a single key, e.g. to wrap a group
/// of fields into a settings block.
pub struct Wrap<B> {
    key: String,
    inner: B,
}

impl<B: Builder> Wrap<B> {
    pub fn new(key: &str, inner: B) -> Self {
        Self { key: key.to_string(), inner }
    }
}

impl<B: Builder> Builder for Wrap<B> {
    fn populate(&self, record: &AttributeRecord, node: &mut IrNode) {
        let inner = self.inner.build(record);
        if !inner.is_empty() {
            node.insert(self.key.clone(), IrValue::Node(inner));
        }
    }
}

//! Schema Engine - Declarative Field Catalogs
//!
//! Validation is two explicit steps: `shape_check` applies every field spec in
//! declaration order, `check_rules` then runs the cross-field rules. The first
//! failure aborts the call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

use crate::constraint::{render_value, Constraint, ConstraintKind, Pattern};
use crate::error::{SchemaError, ValidationError};
use crate::reference::Token;
use crate::rules::CrossFieldRule;
use crate::value::{fold_key, normalize_key, AttrValue, AttributeRecord, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Bool,
}

/// Closed set of field shapes. Nested schemas are held behind `Arc`, so a
/// schema can only embed schemas that were fully built before it.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarType),
    Enum(Vec<String>),
    Pattern(Pattern),
    Bounded { min: i64, max: i64 },
    Nested(Arc<Schema>),
    ArrayOf(Box<FieldKind>),
    /// String-keyed map with free keys, e.g. resource tags.
    MapOf(Box<FieldKind>),
}

impl FieldKind {
    pub fn string() -> Self {
        FieldKind::Scalar(ScalarType::String)
    }

    pub fn integer() -> Self {
        FieldKind::Scalar(ScalarType::Integer)
    }

    pub fn number() -> Self {
        FieldKind::Scalar(ScalarType::Number)
    }

    pub fn boolean() -> Self {
        FieldKind::Scalar(ScalarType::Bool)
    }

    pub fn one_of(allowed: &[&str]) -> Self {
        FieldKind::Enum(allowed.iter().map(|s| s.to_string()).collect())
    }

    pub fn bounded(min: i64, max: i64) -> Self {
        FieldKind::Bounded { min, max }
    }

    pub fn nested(schema: &Arc<Schema>) -> Self {
        FieldKind::Nested(Arc::clone(schema))
    }

    pub fn array_of(element: FieldKind) -> Self {
        FieldKind::ArrayOf(Box::new(element))
    }

    pub fn map_of(value: FieldKind) -> Self {
        FieldKind::MapOf(Box::new(value))
    }

    /// Scalar-shaped kinds accept a reference token in place of a literal.
    fn accepts_token(&self) -> bool {
        matches!(
            self,
            FieldKind::Scalar(_) | FieldKind::Enum(_) | FieldKind::Pattern(_) | FieldKind::Bounded { .. }
        )
    }

    fn describe(&self) -> String {
        match self {
            FieldKind::Scalar(ScalarType::String) => "a string".to_string(),
            FieldKind::Scalar(ScalarType::Integer) => "an integer".to_string(),
            FieldKind::Scalar(ScalarType::Number) => "a number".to_string(),
            FieldKind::Scalar(ScalarType::Bool) => "a boolean".to_string(),
            FieldKind::Enum(allowed) => format!("one of [{}]", allowed.join(", ")),
            FieldKind::Pattern(p) => p.description().to_string(),
            FieldKind::Bounded { min, max } => format!("an integer between {min} and {max}"),
            FieldKind::Nested(schema) => format!("a `{}` object", schema.name()),
            FieldKind::ArrayOf(_) => "an array".to_string(),
            FieldKind::MapOf(_) => "an object".to_string(),
        }
    }

    /// Type check plus the kind's own rule (pattern, enum, bound).
    fn check_shape(&self, label: &str, value: &Value) -> Result<(), ValidationError> {
        let type_ok = match self {
            FieldKind::Scalar(ScalarType::String) | FieldKind::Enum(_) | FieldKind::Pattern(_) => {
                value.is_string()
            }
            FieldKind::Scalar(ScalarType::Integer) | FieldKind::Bounded { .. } => {
                value.is_i64() || value.is_u64()
            }
            FieldKind::Scalar(ScalarType::Number) => value.is_number(),
            FieldKind::Scalar(ScalarType::Bool) => value.is_boolean(),
            FieldKind::Nested(_) | FieldKind::MapOf(_) => value.is_object(),
            FieldKind::ArrayOf(_) => value.is_array(),
        };
        if !type_ok {
            return Err(violation(label, ConstraintKind::Type, self.describe(), value));
        }

        let rule_ok = match self {
            FieldKind::Enum(allowed) => value.as_str().is_some_and(|s| allowed.iter().any(|a| a == s)),
            FieldKind::Pattern(p) => value.as_str().is_some_and(|s| p.is_match(s)),
            FieldKind::Bounded { min, max } => value.as_i64().is_some_and(|n| n >= *min && n <= *max),
            _ => true,
        };
        if !rule_ok {
            let kind = match self {
                FieldKind::Enum(_) => ConstraintKind::Enum,
                FieldKind::Pattern(_) => ConstraintKind::Pattern,
                _ => ConstraintKind::SizeRange,
            };
            return Err(violation(label, kind, self.describe(), value));
        }
        Ok(())
    }

    /// Turns an already shape-checked value into an attribute value,
    /// recursing into nested schemas, array elements and map values.
    fn convert(&self, label: &str, value: &Value) -> Result<AttrValue, ValidationError> {
        match (self, value) {
            (FieldKind::Nested(schema), Value::Object(map)) => schema
                .validate(map)
                .map(AttrValue::Record)
                .map_err(|e| ValidationError::nested(label, None, e)),
            (FieldKind::ArrayOf(element), Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let converted = match (element.as_ref(), item) {
                        (FieldKind::Nested(schema), Value::Object(map)) => schema
                            .validate(map)
                            .map(AttrValue::Record)
                            .map_err(|e| ValidationError::nested(label, Some(i), e))?,
                        _ => element.check_value(&format!("{label}[{i}]"), item)?,
                    };
                    out.push(converted);
                }
                Ok(AttrValue::List(out))
            }
            (FieldKind::MapOf(entry), Value::Object(map)) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, item) in map {
                    let converted = entry.check_value(&format!("{label}.{key}"), item)?;
                    out.insert(key.clone(), converted);
                }
                Ok(AttrValue::Map(out))
            }
            (_, Value::Bool(b)) => Ok(AttrValue::Scalar(Scalar::Bool(*b))),
            (_, Value::Number(n)) => Ok(AttrValue::Scalar(Scalar::Number(n.clone()))),
            (_, Value::String(s)) => Ok(AttrValue::Scalar(Scalar::String(s.clone()))),
            _ => Err(violation(label, ConstraintKind::Type, self.describe(), value)),
        }
    }

    fn check_value(&self, label: &str, value: &Value) -> Result<AttrValue, ValidationError> {
        if let Some(token) = self.token_in(value) {
            return Ok(token);
        }
        self.check_shape(label, value)?;
        self.convert(label, value)
    }

    fn token_in(&self, value: &Value) -> Option<AttrValue> {
        let s = value.as_str()?;
        if self.accepts_token() && Token::parse(s).is_some() {
            Some(AttrValue::Scalar(Scalar::String(s.to_string())))
        } else {
            None
        }
    }

    fn verify(&self, field: &str) -> Result<(), SchemaError> {
        match self {
            FieldKind::Enum(allowed) if allowed.is_empty() => Err(SchemaError::EmptyEnum {
                field: field.to_string(),
            }),
            FieldKind::Bounded { min, max } if min > max => Err(SchemaError::InvertedRange {
                field: field.to_string(),
                min: *min,
                max: *max,
            }),
            FieldKind::ArrayOf(inner) | FieldKind::MapOf(inner) => inner.verify(field),
            _ => Ok(()),
        }
    }
}

fn violation(label: &str, constraint: ConstraintKind, expected: String, value: &Value) -> ValidationError {
    ValidationError::ConstraintViolation {
        field: label.to_string(),
        constraint,
        expected,
        value: render_value(value),
    }
}

/// Materialized when the key is absent. Thunks run on every call.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Static(Value),
    Thunk(fn() -> Value),
}

impl DefaultValue {
    fn materialize(&self) -> Value {
        match self {
            DefaultValue::Static(v) => v.clone(),
            DefaultValue::Thunk(f) => f(),
        }
    }
}

/// A field is required, optional, or optional with a default; never both
/// required and defaulted.
#[derive(Debug, Clone)]
pub enum Presence {
    Required,
    Optional,
    Defaulted(DefaultValue),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    presence: Presence,
    constraints: Vec<Constraint>,
}

impl FieldSpec {
    fn new(name: &str, kind: FieldKind, presence: Presence) -> Self {
        Self {
            name: normalize_key(name),
            kind,
            presence,
            constraints: vec![],
        }
    }

    pub fn required(name: &str, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::Required)
    }

    pub fn optional(name: &str, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::Optional)
    }

    pub fn defaulted(name: &str, kind: FieldKind, default: Value) -> Self {
        Self::new(name, kind, Presence::Defaulted(DefaultValue::Static(default)))
    }

    pub fn defaulted_with(name: &str, kind: FieldKind, default: fn() -> Value) -> Self {
        Self::new(name, kind, Presence::Defaulted(DefaultValue::Thunk(default)))
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn check(&self, value: &Value) -> Result<AttrValue, ValidationError> {
        if let Some(token) = self.kind.token_in(value) {
            return Ok(token);
        }
        self.kind.check_shape(&self.name, value)?;
        for constraint in &self.constraints {
            if !constraint.check(value) {
                return Err(violation(&self.name, constraint.kind(), constraint.expected(value), value));
            }
        }
        self.kind.convert(&self.name, value)
    }
}

pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    /// Folded field name -> index into `fields`.
    lookup: HashMap<String, usize>,
    strict: bool,
    rules: Vec<Arc<dyn CrossFieldRule>>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("strict", &self.strict)
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Schema {
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            fields: vec![],
            strict: false,
            rules: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Full validation: field checks, then cross-field rules.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<AttributeRecord, ValidationError> {
        let record = self.shape_check(raw)?;
        self.check_rules(&record)?;
        Ok(record)
    }

    /// Per-field validation in declaration order, with defaults filled in.
    pub fn shape_check(&self, raw: &Map<String, Value>) -> Result<AttributeRecord, ValidationError> {
        let input = self.canonical_input(raw)?;
        let mut record = AttributeRecord::new();

        for field in &self.fields {
            match input.get(field.name.as_str()) {
                Some(value) => {
                    let checked = field.check(value)?;
                    record.insert(field.name.clone(), checked);
                }
                None => match &field.presence {
                    Presence::Required => {
                        return Err(ValidationError::MissingField { field: field.name.clone() });
                    }
                    Presence::Defaulted(default) => {
                        trace!(schema = %self.name, field = %field.name, "filling default");
                        let checked = field.check(&default.materialize())?;
                        record.insert(field.name.clone(), checked);
                    }
                    Presence::Optional => {}
                },
            }
        }

        Ok(record)
    }

    pub fn check_rules(&self, record: &AttributeRecord) -> Result<(), ValidationError> {
        for rule in &self.rules {
            rule.check(record)?;
        }
        Ok(())
    }

    /// Re-keys raw input by canonical field name, matching keys without regard
    /// to case or separators; `null` counts as absent.
    fn canonical_input<'a>(
        &self,
        raw: &'a Map<String, Value>,
    ) -> Result<IndexMap<String, &'a Value>, ValidationError> {
        let mut input = IndexMap::with_capacity(raw.len());
        for (key, value) in raw {
            let Some(&index) = self.lookup.get(&fold_key(key)) else {
                if self.strict {
                    return Err(ValidationError::UnknownField { field: key.clone() });
                }
                trace!(schema = %self.name, key = %key, "ignoring unknown key");
                continue;
            };
            if value.is_null() {
                continue;
            }
            let canonical = self.fields[index].name.clone();
            if input.insert(canonical.clone(), value).is_some() {
                return Err(ValidationError::DuplicateField { field: canonical });
            }
        }
        Ok(input)
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    strict: bool,
    rules: Vec<Arc<dyn CrossFieldRule>>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Reject keys the schema does not declare.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Rules run in the order they are added.
    pub fn rule(mut self, rule: impl CrossFieldRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut lookup = HashMap::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            if lookup.insert(fold_key(&field.name), index).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            field.kind.verify(&field.name)?;
            for constraint in &field.constraints {
                constraint.verify(&field.name)?;
            }
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
            lookup,
            strict: self.strict,
            rules: self.rules,
        })
    }
}

//! Field Constraints - Stateless Leaf Validators
//!
//! Each constraint is a pure check over one raw value. Patterns always match
//! the whole string.

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Type,
    Pattern,
    Enum,
    SizeRange,
    Predicate,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Type => "type",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::Enum => "enum",
            ConstraintKind::SizeRange => "size",
            ConstraintKind::Predicate => "predicate",
        };
        f.write_str(name)
    }
}

/// A full-string regular expression with a human description of the shape it
/// accepts.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    description: String,
}

impl Pattern {
    pub fn new(source: &str, description: &str) -> Result<Self, SchemaError> {
        let anchored = format!("^(?:{source})$");
        let regex = Regex::new(&anchored).map_err(|e| SchemaError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
            description: description.to_string(),
        })
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A named check that no declarative constraint can express.
#[derive(Debug, Clone, Copy)]
pub struct Predicate {
    pub name: &'static str,
    pub expected: &'static str,
    pub check: fn(&Value) -> bool,
}

#[derive(Debug, Clone)]
pub enum Constraint {
    Pattern(Pattern),
    Enum(Vec<String>),
    /// Characters for strings, items for arrays and maps, magnitude for numbers.
    SizeRange { min: Option<i64>, max: Option<i64> },
    Predicate(Predicate),
}

impl Constraint {
    pub fn pattern(source: &str, description: &str) -> Result<Self, SchemaError> {
        Pattern::new(source, description).map(Constraint::Pattern)
    }

    pub fn one_of(allowed: &[&str]) -> Self {
        Constraint::Enum(allowed.iter().map(|s| s.to_string()).collect())
    }

    pub fn size(min: i64, max: i64) -> Self {
        Constraint::SizeRange { min: Some(min), max: Some(max) }
    }

    pub fn at_least(min: i64) -> Self {
        Constraint::SizeRange { min: Some(min), max: None }
    }

    pub fn at_most(max: i64) -> Self {
        Constraint::SizeRange { min: None, max: Some(max) }
    }

    pub fn predicate(name: &'static str, expected: &'static str, check: fn(&Value) -> bool) -> Self {
        Constraint::Predicate(Predicate { name, expected, check })
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Pattern(_) => ConstraintKind::Pattern,
            Constraint::Enum(_) => ConstraintKind::Enum,
            Constraint::SizeRange { .. } => ConstraintKind::SizeRange,
            Constraint::Predicate(_) => ConstraintKind::Predicate,
        }
    }

    pub fn check(&self, value: &Value) -> bool {
        match self {
            Constraint::Pattern(p) => value.as_str().is_some_and(|s| p.is_match(s)),
            Constraint::Enum(allowed) => {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return false,
                };
                allowed.iter().any(|a| *a == rendered)
            }
            Constraint::SizeRange { min, max } => match measure(value) {
                Some(size) => {
                    min.map_or(true, |m| size >= m as f64) && max.map_or(true, |m| size <= m as f64)
                }
                None => false,
            },
            Constraint::Predicate(p) => (p.check)(value),
        }
    }

    /// Describes the accepted shape; the unit depends on the value checked.
    pub fn expected(&self, value: &Value) -> String {
        match self {
            Constraint::Pattern(p) => p.description().to_string(),
            Constraint::Enum(allowed) => format!("one of [{}]", allowed.join(", ")),
            Constraint::SizeRange { min, max } => {
                let unit = match value {
                    Value::String(_) => " characters",
                    Value::Array(_) => " items",
                    Value::Object(_) => " entries",
                    _ => "",
                };
                match (min, max) {
                    (Some(lo), Some(hi)) => format!("{lo}-{hi}{unit}"),
                    (Some(lo), None) => format!("at least {lo}{unit}"),
                    (None, Some(hi)) => format!("at most {hi}{unit}"),
                    (None, None) => "any size".to_string(),
                }
            }
            Constraint::Predicate(p) => p.expected.to_string(),
        }
    }

    pub(crate) fn verify(&self, field: &str) -> Result<(), SchemaError> {
        match self {
            Constraint::Enum(allowed) if allowed.is_empty() => Err(SchemaError::EmptyEnum {
                field: field.to_string(),
            }),
            Constraint::SizeRange { min: Some(lo), max: Some(hi) } if lo > hi => {
                Err(SchemaError::InvertedRange {
                    field: field.to_string(),
                    min: *lo,
                    max: *hi,
                })
            }
            _ => Ok(()),
        }
    }
}

fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Compact rendering of an offending value for error messages.
pub(crate) fn render_value(value: &Value) -> String {
    const LIMIT: usize = 80;
    let rendered = value.to_string();
    if rendered.chars().count() > LIMIT {
        let truncated: String = rendered.chars().take(LIMIT).collect();
        format!("{truncated}...")
    } else {
        rendered
    }
}

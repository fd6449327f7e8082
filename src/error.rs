//! Error Types - Fail-Fast Validation Errors
//!
//! Exactly one error surfaces per validation call. Nested failures keep the
//! path to the offending leaf.

use thiserror::Error;

use crate::constraint::ConstraintKind;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    #[error("field `{field}` supplied more than once")]
    DuplicateField { field: String },

    #[error("field `{field}` failed {constraint} constraint: expected {expected}, got {value}")]
    ConstraintViolation {
        field: String,
        constraint: ConstraintKind,
        expected: String,
        value: String,
    },

    #[error("rule `{rule}` violated: {detail}")]
    CrossFieldViolation { rule: String, detail: String },

    #[error("invalid `{field}{}`: {source}", .index.map(|i| format!("[{i}]")).unwrap_or_default())]
    Nested {
        field: String,
        index: Option<usize>,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("invalid instance name `{name}`: expected a letter or underscore followed by letters, digits, `_` or `-`")]
    InvalidInstanceName { name: String },
}

impl ValidationError {
    pub fn nested(field: &str, index: Option<usize>, cause: ValidationError) -> Self {
        Self::Nested {
            field: field.to_string(),
            index,
            source: Box::new(cause),
        }
    }

    /// Dotted path to the offending leaf, e.g. `actions[0].container_action.image`.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut current = self;
        loop {
            match current {
                Self::Nested { field, index, source } => {
                    match index {
                        Some(i) => segments.push(format!("{field}[{i}]")),
                        None => segments.push(field.clone()),
                    }
                    current = source;
                }
                Self::MissingField { field }
                | Self::UnknownField { field }
                | Self::DuplicateField { field }
                | Self::ConstraintViolation { field, .. } => {
                    segments.push(field.clone());
                    break;
                }
                Self::CrossFieldViolation { .. } | Self::InvalidInstanceName { .. } => break,
            }
        }
        segments.join(".")
    }

    /// The innermost error, with every `Nested` wrapper removed.
    pub fn leaf(&self) -> &ValidationError {
        let mut current = self;
        while let Self::Nested { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Mistakes in a schema definition, caught when the catalog is assembled.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("schema `{schema}` declares field `{field}` more than once")]
    DuplicateField { schema: String, field: String },

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("enum for field `{field}` has no allowed values")]
    EmptyEnum { field: String },

    #[error("size range for field `{field}` has min {min} greater than max {max}")]
    InvertedRange { field: String, min: i64, max: i64 },
}

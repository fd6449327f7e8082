//! Shared field helpers for AWS resource schemas.

use serde_json::Value;

use crate::constraint::{Constraint, Pattern};
use crate::error::SchemaError;
use crate::reference::Token;
use crate::schema::{FieldKind, FieldSpec};
use crate::value::AttributeRecord;

pub const MAX_TAGS: i64 = 50;

pub fn arn() -> Result<FieldKind, SchemaError> {
    Pattern::new(
        r"arn:aws[a-zA-Z-]*:[a-zA-Z0-9-]+:[a-z0-9-]*:(\d{12})?:\S+",
        "an ARN (arn:<partition>:<service>:<region>:<account>:<resource>)",
    )
    .map(FieldKind::Pattern)
}

pub fn role_arn() -> Result<FieldKind, SchemaError> {
    Pattern::new(
        r"arn:aws[a-zA-Z-]*:iam::\d{12}:role/[\w+=,.@/-]+",
        "an IAM role ARN (arn:aws:iam::<account>:role/<name>)",
    )
    .map(FieldKind::Pattern)
}

/// 1 to `max` alphanumeric/underscore characters.
pub fn identifier(max: usize) -> Result<FieldKind, SchemaError> {
    Pattern::new(
        &format!("[a-zA-Z0-9_]{{1,{max}}}"),
        &format!("1-{max} alphanumeric/underscore characters"),
    )
    .map(FieldKind::Pattern)
}

/// 1 to `max` alphanumeric/hyphen/underscore characters.
pub fn name(max: usize) -> Result<FieldKind, SchemaError> {
    Pattern::new(
        &format!("[a-zA-Z0-9_-]{{1,{max}}}"),
        &format!("1-{max} alphanumeric/hyphen/underscore characters"),
    )
    .map(FieldKind::Pattern)
}

fn tag_keys_valid(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        map.keys().all(|k| {
            let len = k.chars().count();
            (1..=128).contains(&len) && !k.starts_with("aws:")
        })
    })
}

fn tag_values_valid(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.values().all(|v| v.as_str().map_or(true, |s| s.chars().count() <= 256)))
}

pub fn tags() -> FieldSpec {
    FieldSpec::optional("tags", FieldKind::map_of(FieldKind::string()))
        .constraint(Constraint::at_most(MAX_TAGS))
        .constraint(Constraint::predicate(
            "tag_keys",
            "tag keys of 1-128 characters not starting with `aws:`",
            tag_keys_valid,
        ))
        .constraint(Constraint::predicate(
            "tag_values",
            "tag values of at most 256 characters",
            tag_values_valid,
        ))
}

/// Literal string value of a field; `None` when absent or a reference token.
pub fn literal<'a>(record: &'a AttributeRecord, field: &str) -> Option<&'a str> {
    record.str(field).filter(|_| !is_token(record, field))
}

/// True when the field holds a reference token rather than a literal. Rules
/// must not guess what the token resolves to.
pub fn is_token(record: &AttributeRecord, field: &str) -> bool {
    record.str(field).is_some_and(|s| Token::parse(s).is_some())
}

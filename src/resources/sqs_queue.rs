//! `aws_sqs_queue`

use std::sync::Arc;

use serde_json::json;

use crate::catalog::ResourceDefinition;
use crate::constraint::Pattern;
use crate::error::SchemaError;
use crate::reference::ReferenceBinder;
use crate::rules::FnRule;
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::value::{AttrValue, AttributeRecord, Scalar};

use super::common::{arn, is_token, literal, tags};

pub const RESOURCE_TYPE: &str = "aws_sqs_queue";

fn redrive_policy() -> Result<Schema, SchemaError> {
    Schema::builder("redrive_policy")
        .field(FieldSpec::required("dead_letter_target_arn", arn()?))
        .field(FieldSpec::required("max_receive_count", FieldKind::bounded(1, 1000)))
        .strict()
        .build()
}

fn fifo_name_suffix(record: &AttributeRecord) -> Result<(), String> {
    if is_token(record, "fifo_queue") {
        return Ok(());
    }
    let fifo = record.bool("fifo_queue").unwrap_or(false);
    match literal(record, "name") {
        Some(name) if fifo && !name.ends_with(".fifo") => {
            Err(format!("FIFO queue name `{name}` must end with `.fifo`"))
        }
        Some(name) if !fifo && name.ends_with(".fifo") => {
            Err(format!("queue name `{name}` ends with `.fifo` but fifo_queue is false"))
        }
        _ => Ok(()),
    }
}

fn deduplication_requires_fifo(record: &AttributeRecord) -> Result<(), String> {
    if is_token(record, "fifo_queue") {
        return Ok(());
    }
    let fifo = record.bool("fifo_queue").unwrap_or(false);
    let dedup = record.bool("content_based_deduplication").unwrap_or(false);
    if dedup && !fifo {
        Err("content_based_deduplication is only valid for FIFO queues".to_string())
    } else {
        Ok(())
    }
}

/// The literal flag, or the token itself when it is only known later.
fn is_fifo(record: &AttributeRecord) -> Scalar {
    record
        .get("fifo_queue")
        .and_then(AttrValue::as_scalar)
        .cloned()
        .unwrap_or(Scalar::Bool(false))
}

pub fn schema() -> Result<Schema, SchemaError> {
    let queue_name = Pattern::new(
        r"[a-zA-Z0-9_-]{1,75}(\.fifo)?|[a-zA-Z0-9_-]{1,80}",
        "1-80 alphanumeric/hyphen/underscore characters, optionally ending in .fifo",
    )?;

    Schema::builder(RESOURCE_TYPE)
        .field(FieldSpec::optional("name", FieldKind::Pattern(queue_name)))
        .field(FieldSpec::defaulted("fifo_queue", FieldKind::boolean(), json!(false)))
        .field(FieldSpec::optional("content_based_deduplication", FieldKind::boolean()))
        .field(FieldSpec::defaulted("delay_seconds", FieldKind::bounded(0, 900), json!(0)))
        .field(FieldSpec::defaulted("max_message_size", FieldKind::bounded(1024, 262_144), json!(262_144)))
        .field(FieldSpec::defaulted(
            "message_retention_seconds",
            FieldKind::bounded(60, 1_209_600),
            json!(345_600),
        ))
        .field(FieldSpec::defaulted("receive_wait_time_seconds", FieldKind::bounded(0, 20), json!(0)))
        .field(FieldSpec::defaulted(
            "visibility_timeout_seconds",
            FieldKind::bounded(0, 43_200),
            json!(30),
        ))
        .field(FieldSpec::optional("redrive_policy", FieldKind::nested(&Arc::new(redrive_policy()?))))
        .field(tags())
        .rule(FnRule::new("fifo_name_suffix", fifo_name_suffix))
        .rule(FnRule::new("content_based_deduplication_requires_fifo", deduplication_requires_fifo))
        .build()
}

pub fn definition() -> Result<ResourceDefinition, SchemaError> {
    let binder = ReferenceBinder::new(&["id", "arn", "url"])
        .computed("is_fifo", is_fifo)
        .computed("has_dead_letter_queue", |r| r.contains("redrive_policy").into());

    Ok(ResourceDefinition::new(RESOURCE_TYPE, schema()?)
        .describe("Simple Queue Service queue")
        .with_binder(binder))
}

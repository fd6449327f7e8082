//! `aws_iotanalytics_dataset`
//!
//! Each action carries exactly one of a SQL query action or a container
//! action; the action builder delegates to a dedicated builder for each.

use std::sync::Arc;

use serde_json::json;

use crate::builder::BlockBuilder;
use crate::catalog::ResourceDefinition;
use crate::constraint::Constraint;
use crate::error::SchemaError;
use crate::reference::ReferenceBinder;
use crate::rules::{FnRule, PresenceCount, UniqueBy};
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::value::{AttrValue, AttributeRecord};

use super::common::{identifier, role_arn, tags};

pub const RESOURCE_TYPE: &str = "aws_iotanalytics_dataset";

fn query_action() -> Result<Schema, SchemaError> {
    let delta_time = Schema::builder("delta_time")
        .field(FieldSpec::required("offset_seconds", FieldKind::integer()))
        .field(FieldSpec::required("time_expression", FieldKind::string()).constraint(Constraint::size(1, 256)))
        .build()?;
    let filter = Schema::builder("query_filter")
        .field(FieldSpec::required("delta_time", FieldKind::nested(&Arc::new(delta_time))))
        .build()?;

    Schema::builder("query_action")
        .field(FieldSpec::required("sql_query", FieldKind::string()).constraint(Constraint::size(1, 4096)))
        .field(
            FieldSpec::optional("filters", FieldKind::array_of(FieldKind::nested(&Arc::new(filter))))
                .constraint(Constraint::at_most(1)),
        )
        .build()
}

fn container_action() -> Result<Schema, SchemaError> {
    let resource_configuration = Schema::builder("resource_configuration")
        .field(FieldSpec::required("compute_type", FieldKind::one_of(&["ACU_1", "ACU_2"])))
        .field(FieldSpec::required("volume_size_in_gb", FieldKind::bounded(1, 50)))
        .build()?;
    let variable = Schema::builder("variable")
        .field(FieldSpec::required("name", FieldKind::string()).constraint(Constraint::size(1, 256)))
        .field(FieldSpec::optional("string_value", FieldKind::string()).constraint(Constraint::at_most(1024)))
        .field(FieldSpec::optional("double_value", FieldKind::number()))
        .field(FieldSpec::optional("dataset_content_version_value", identifier(128)?))
        .rule(PresenceCount::exactly_one_of(&[
            "string_value",
            "double_value",
            "dataset_content_version_value",
        ]))
        .build()?;

    Schema::builder("container_action")
        .field(FieldSpec::required("image", FieldKind::string()).constraint(Constraint::size(1, 255)))
        .field(FieldSpec::required("execution_role_arn", role_arn()?))
        .field(FieldSpec::required(
            "resource_configuration",
            FieldKind::nested(&Arc::new(resource_configuration)),
        ))
        .field(
            FieldSpec::optional("variables", FieldKind::array_of(FieldKind::nested(&Arc::new(variable))))
                .constraint(Constraint::at_most(50)),
        )
        .rule(UniqueBy::field("variables", "name"))
        .build()
}

fn action() -> Result<Schema, SchemaError> {
    Schema::builder("action")
        .field(FieldSpec::required("action_name", identifier(128)?))
        .field(FieldSpec::optional("query_action", FieldKind::nested(&Arc::new(query_action()?))))
        .field(FieldSpec::optional("container_action", FieldKind::nested(&Arc::new(container_action()?))))
        .rule(PresenceCount::exactly_one_of(&["query_action", "container_action"]))
        .build()
}

fn trigger() -> Result<Schema, SchemaError> {
    let schedule = Schema::builder("schedule")
        .field(FieldSpec::required("expression", FieldKind::string()).constraint(Constraint::size(1, 256)))
        .build()?;
    let triggering_dataset = Schema::builder("triggering_dataset")
        .field(FieldSpec::required("name", identifier(128)?))
        .build()?;

    Schema::builder("trigger")
        .field(FieldSpec::optional("schedule", FieldKind::nested(&Arc::new(schedule))))
        .field(FieldSpec::optional("triggering_dataset", FieldKind::nested(&Arc::new(triggering_dataset))))
        .rule(PresenceCount::exactly_one_of(&["schedule", "triggering_dataset"]))
        .build()
}

fn retention_period() -> Result<Schema, SchemaError> {
    fn unlimited_excludes_days(record: &AttributeRecord) -> Result<(), String> {
        if record.bool("unlimited") == Some(true) && record.contains("number_of_days") {
            Err("number_of_days cannot be set when unlimited is true".to_string())
        } else {
            Ok(())
        }
    }

    Schema::builder("retention_period")
        .field(FieldSpec::defaulted("unlimited", FieldKind::boolean(), json!(false)))
        .field(FieldSpec::optional("number_of_days", FieldKind::bounded(1, i64::from(i32::MAX))))
        .rule(FnRule::new("unlimited_excludes_number_of_days", unlimited_excludes_days))
        .build()
}

pub fn schema() -> Result<Schema, SchemaError> {
    Schema::builder(RESOURCE_TYPE)
        .field(FieldSpec::required("dataset_name", identifier(128)?))
        .field(
            FieldSpec::required("actions", FieldKind::array_of(FieldKind::nested(&Arc::new(action()?))))
                .constraint(Constraint::size(1, 1)),
        )
        .field(
            FieldSpec::optional("triggers", FieldKind::array_of(FieldKind::nested(&Arc::new(trigger()?))))
                .constraint(Constraint::at_most(5)),
        )
        .field(FieldSpec::optional("retention_period", FieldKind::nested(&Arc::new(retention_period()?))))
        .field(tags())
        .rule(UniqueBy::field("actions", "action_name"))
        .build()
}

pub fn builder() -> BlockBuilder {
    let query_action = BlockBuilder::new().value("sql_query").child(
        "filters",
        BlockBuilder::new().child(
            "delta_time",
            BlockBuilder::new().value("offset_seconds").value("time_expression"),
        ),
    );
    let container_action = BlockBuilder::new()
        .value("image")
        .value("execution_role_arn")
        .child(
            "resource_configuration",
            BlockBuilder::new().value("compute_type").value("volume_size_in_gb"),
        )
        .child(
            "variables",
            BlockBuilder::new()
                .value("name")
                .value("string_value")
                .value("double_value")
                .value("dataset_content_version_value"),
        );
    let action = BlockBuilder::new()
        .value("action_name")
        .child("query_action", query_action)
        .child("container_action", container_action);
    let trigger = BlockBuilder::new()
        .child("schedule", BlockBuilder::new().value("expression"))
        .child("triggering_dataset", BlockBuilder::new().value("name"));

    BlockBuilder::new()
        .value("dataset_name")
        .child("actions", action)
        .child("triggers", trigger)
        .child(
            "retention_period",
            BlockBuilder::new().value("unlimited").value("number_of_days"),
        )
        .value("tags")
}

fn has_container_action(record: &AttributeRecord) -> bool {
    record
        .list("actions")
        .unwrap_or_default()
        .iter()
        .filter_map(AttrValue::as_record)
        .any(|action| action.contains("container_action"))
}

pub fn definition() -> Result<ResourceDefinition, SchemaError> {
    let binder = ReferenceBinder::new(&["id", "arn"])
        .computed("has_container_action", |r| has_container_action(r).into())
        .computed("trigger_count", |r| r.list("triggers").map_or(0, <[_]>::len).into());

    Ok(ResourceDefinition::new(RESOURCE_TYPE, schema()?)
        .describe("IoT Analytics dataset")
        .with_builder(builder())
        .with_binder(binder))
}

//! `aws_iotanalytics_pipeline`

use std::sync::Arc;

use crate::builder::{BlockBuilder, Builder};
use crate::catalog::ResourceDefinition;
use crate::constraint::Constraint;
use crate::error::SchemaError;
use crate::ir::{IrNode, IrValue};
use crate::reference::ReferenceBinder;
use crate::rules::{FnRule, PresenceCount, UniqueBy};
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::value::{AttrValue, AttributeRecord};

use super::common::{identifier, tags};

pub const RESOURCE_TYPE: &str = "aws_iotanalytics_pipeline";

const ACTIVITY_KINDS: [&str; 4] = ["channel", "datastore", "lambda", "add_attributes"];

fn activity() -> Result<Schema, SchemaError> {
    let channel = Schema::builder("channel_activity")
        .field(FieldSpec::required("channel_name", identifier(128)?))
        .build()?;
    let datastore = Schema::builder("datastore_activity")
        .field(FieldSpec::required("datastore_name", identifier(128)?))
        .build()?;
    let lambda = Schema::builder("lambda_activity")
        .field(FieldSpec::required("lambda_name", FieldKind::string()).constraint(Constraint::size(1, 64)))
        .field(FieldSpec::required("batch_size", FieldKind::bounded(1, 1000)))
        .build()?;

    Schema::builder("activity")
        .field(FieldSpec::required("name", identifier(128)?))
        .field(FieldSpec::required("order", FieldKind::bounded(1, 25)))
        .field(FieldSpec::optional("channel", FieldKind::nested(&Arc::new(channel))))
        .field(FieldSpec::optional("datastore", FieldKind::nested(&Arc::new(datastore))))
        .field(FieldSpec::optional("lambda", FieldKind::nested(&Arc::new(lambda))))
        .field(
            FieldSpec::optional("add_attributes", FieldKind::map_of(FieldKind::string()))
                .constraint(Constraint::size(1, 50)),
        )
        .rule(PresenceCount::exactly_one_of(&ACTIVITY_KINDS))
        .build()
}

fn activities(record: &AttributeRecord) -> impl Iterator<Item = &AttributeRecord> {
    record
        .list("activities")
        .unwrap_or_default()
        .iter()
        .filter_map(AttrValue::as_record)
}

fn requires_channel_and_datastore(record: &AttributeRecord) -> Result<(), String> {
    for kind in ["channel", "datastore"] {
        if !activities(record).any(|a| a.contains(kind)) {
            return Err(format!("a pipeline needs at least one `{kind}` activity"));
        }
    }
    Ok(())
}

pub fn schema() -> Result<Schema, SchemaError> {
    Schema::builder(RESOURCE_TYPE)
        .field(FieldSpec::required("pipeline_name", identifier(128)?))
        .field(
            FieldSpec::required("activities", FieldKind::array_of(FieldKind::nested(&Arc::new(activity()?))))
                .constraint(Constraint::size(1, 25)),
        )
        .field(tags())
        .rule(UniqueBy::field("activities", "order"))
        .rule(UniqueBy::field("activities", "name"))
        .rule(FnRule::new("requires_channel_and_datastore", requires_channel_and_datastore))
        .build()
}

/// Emits activities in execution order rather than input order.
pub struct PipelineBuilder {
    head: BlockBuilder,
    activity: BlockBuilder,
    tail: BlockBuilder,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        let activity = BlockBuilder::new()
            .value("name")
            .child("channel", BlockBuilder::new().value("channel_name"))
            .child("datastore", BlockBuilder::new().value("datastore_name"))
            .child("lambda", BlockBuilder::new().value("lambda_name").value("batch_size"))
            .value("add_attributes");
        Self {
            head: BlockBuilder::new().value("pipeline_name"),
            activity,
            tail: BlockBuilder::new().value("tags"),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for PipelineBuilder {
    fn populate(&self, record: &AttributeRecord, node: &mut IrNode) {
        self.head.populate(record, node);

        let mut ordered: Vec<&AttributeRecord> = activities(record).collect();
        // unique orders make this a total order
        ordered.sort_by_key(|a| a.i64("order").unwrap_or(i64::MAX));
        let emitted = ordered
            .into_iter()
            .map(|a| IrValue::Node(self.activity.build(a)))
            .collect();
        node.insert("pipelineActivities", IrValue::List(emitted));

        self.tail.populate(record, node);
    }
}

pub fn definition() -> Result<ResourceDefinition, SchemaError> {
    let binder = ReferenceBinder::new(&["id", "arn"])
        .computed("activity_count", |r| activities(r).count().into())
        .computed("has_lambda", |r| activities(r).any(|a| a.contains("lambda")).into());

    Ok(ResourceDefinition::new(RESOURCE_TYPE, schema()?)
        .describe("IoT Analytics pipeline")
        .with_builder(PipelineBuilder::new())
        .with_binder(binder))
}

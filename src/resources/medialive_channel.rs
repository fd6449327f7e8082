//! `aws_medialive_channel`
//!
//! The channel block aggregates concerns that evolve independently: core
//! channel settings, destinations, input attachments and encoder settings.
//! Each is a separate builder filling its own keys of one node; parts are
//! composed in schema declaration order.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use crate::builder::{BlockBuilder, Composite};
use crate::catalog::ResourceDefinition;
use crate::constraint::Constraint;
use crate::error::SchemaError;
use crate::reference::ReferenceBinder;
use crate::rules::{FnRule, UniqueBy};
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::value::{AttrValue, AttributeRecord};

use super::common::{literal, name, role_arn, tags};

pub const RESOURCE_TYPE: &str = "aws_medialive_channel";

fn input_specification() -> Result<Schema, SchemaError> {
    Schema::builder("input_specification")
        .field(FieldSpec::required("codec", FieldKind::one_of(&["MPEG2", "AVC", "HEVC"])))
        .field(FieldSpec::required(
            "maximum_bitrate",
            FieldKind::one_of(&["MAX_10_MBPS", "MAX_20_MBPS", "MAX_50_MBPS"]),
        ))
        .field(FieldSpec::required("input_resolution", FieldKind::one_of(&["SD", "HD", "UHD"])))
        .build()
}

fn destination() -> Result<Schema, SchemaError> {
    let settings = Schema::builder("destination_settings")
        .field(FieldSpec::required("url", FieldKind::string()).constraint(Constraint::size(1, 2048)))
        .field(FieldSpec::optional("stream_name", FieldKind::string()))
        .field(FieldSpec::optional("username", FieldKind::string()))
        .field(FieldSpec::optional("password_param", FieldKind::string()))
        .build()?;

    Schema::builder("destination")
        .field(FieldSpec::required("id", name(64)?))
        .field(
            FieldSpec::required("settings", FieldKind::array_of(FieldKind::nested(&Arc::new(settings))))
                .constraint(Constraint::size(1, 2)),
        )
        .build()
}

fn input_attachment() -> Result<Schema, SchemaError> {
    let input_settings = Schema::builder("input_settings")
        .field(FieldSpec::defaulted(
            "source_end_behavior",
            FieldKind::one_of(&["CONTINUE", "LOOP"]),
            json!("CONTINUE"),
        ))
        .field(FieldSpec::defaulted(
            "input_filter",
            FieldKind::one_of(&["AUTO", "DISABLED", "FORCED"]),
            json!("AUTO"),
        ))
        .build()?;

    Schema::builder("input_attachment")
        .field(FieldSpec::required("input_attachment_name", name(64)?))
        .field(FieldSpec::required("input_id", FieldKind::string()).constraint(Constraint::size(1, 64)))
        .field(FieldSpec::optional("input_settings", FieldKind::nested(&Arc::new(input_settings))))
        .build()
}

fn encoder_settings() -> Result<Schema, SchemaError> {
    let video = Schema::builder("video_description")
        .field(FieldSpec::required("name", name(64)?))
        .field(FieldSpec::optional("width", FieldKind::bounded(32, 8192)))
        .field(FieldSpec::optional("height", FieldKind::bounded(32, 8192)))
        .field(FieldSpec::defaulted("codec", FieldKind::one_of(&["H_264", "H_265"]), json!("H_264")))
        .build()?;
    let audio = Schema::builder("audio_description")
        .field(FieldSpec::required("name", name(64)?))
        .field(FieldSpec::required("audio_selector_name", FieldKind::string()))
        .build()?;
    let output_group = Schema::builder("output_group")
        .field(FieldSpec::optional("name", name(32)?))
        .field(FieldSpec::required("destination_ref_id", name(64)?))
        .build()?;

    Schema::builder("encoder_settings")
        .field(
            FieldSpec::required("video_descriptions", FieldKind::array_of(FieldKind::nested(&Arc::new(video))))
                .constraint(Constraint::at_least(1)),
        )
        .field(FieldSpec::optional(
            "audio_descriptions",
            FieldKind::array_of(FieldKind::nested(&Arc::new(audio))),
        ))
        .field(
            FieldSpec::required("output_groups", FieldKind::array_of(FieldKind::nested(&Arc::new(output_group))))
                .constraint(Constraint::at_least(1)),
        )
        .field(FieldSpec::defaulted(
            "timecode_source",
            FieldKind::one_of(&["EMBEDDED", "SYSTEMCLOCK", "ZEROBASED"]),
            json!("EMBEDDED"),
        ))
        .rule(UniqueBy::field("video_descriptions", "name"))
        .build()
}

fn records<'a>(record: &'a AttributeRecord, field: &str) -> impl Iterator<Item = &'a AttributeRecord> {
    record
        .list(field)
        .unwrap_or_default()
        .iter()
        .filter_map(AttrValue::as_record)
}

/// `None` when the channel class is a reference token.
fn pipelines(record: &AttributeRecord) -> Option<usize> {
    match literal(record, "channel_class")? {
        "SINGLE_PIPELINE" => Some(1),
        _ => Some(2),
    }
}

/// Falls back to the settings count of the first destination, which carries
/// one entry per pipeline once the class resolves.
fn pipelines_running_count(record: &AttributeRecord) -> usize {
    pipelines(record).unwrap_or_else(|| {
        records(record, "destinations")
            .next()
            .and_then(|d| d.list("settings"))
            .map_or(0, <[AttrValue]>::len)
    })
}

fn output_destinations_exist(record: &AttributeRecord) -> Result<(), String> {
    let declared: HashSet<&str> = records(record, "destinations")
        .filter_map(|d| literal(d, "id"))
        .collect();
    let Some(encoder) = record.record("encoder_settings") else {
        return Ok(());
    };
    for group in records(encoder, "output_groups") {
        if let Some(reference) = literal(group, "destination_ref_id") {
            if !declared.contains(reference) {
                return Err(format!("output group refers to undeclared destination `{reference}`"));
            }
        }
    }
    Ok(())
}

fn destination_settings_per_pipeline(record: &AttributeRecord) -> Result<(), String> {
    let Some(expected) = pipelines(record) else {
        return Ok(());
    };
    for destination in records(record, "destinations") {
        let count = destination.list("settings").map_or(0, <[AttrValue]>::len);
        if count != expected {
            let id = destination.str("id").unwrap_or("?");
            return Err(format!(
                "destination `{id}` has {count} settings; channel class needs {expected}"
            ));
        }
    }
    Ok(())
}

pub fn schema() -> Result<Schema, SchemaError> {
    Schema::builder(RESOURCE_TYPE)
        .field(FieldSpec::required("name", name(128)?))
        .field(FieldSpec::defaulted(
            "channel_class",
            FieldKind::one_of(&["STANDARD", "SINGLE_PIPELINE"]),
            json!("STANDARD"),
        ))
        .field(FieldSpec::optional("role_arn", role_arn()?))
        .field(FieldSpec::required(
            "input_specification",
            FieldKind::nested(&Arc::new(input_specification()?)),
        ))
        .field(
            FieldSpec::required("destinations", FieldKind::array_of(FieldKind::nested(&Arc::new(destination()?))))
                .constraint(Constraint::at_least(1)),
        )
        .field(
            FieldSpec::required(
                "input_attachments",
                FieldKind::array_of(FieldKind::nested(&Arc::new(input_attachment()?))),
            )
            .constraint(Constraint::at_least(1)),
        )
        .field(FieldSpec::required("encoder_settings", FieldKind::nested(&Arc::new(encoder_settings()?))))
        .field(FieldSpec::defaulted(
            "log_level",
            FieldKind::one_of(&["ERROR", "WARNING", "INFO", "DEBUG", "DISABLED"]),
            json!("DISABLED"),
        ))
        .field(tags())
        .rule(UniqueBy::field("destinations", "id"))
        .rule(UniqueBy::field("input_attachments", "input_attachment_name"))
        .rule(FnRule::new("output_destinations_exist", output_destinations_exist))
        .rule(FnRule::new("destination_settings_per_pipeline", destination_settings_per_pipeline))
        .build()
}

pub fn builder() -> Composite {
    let core = BlockBuilder::new()
        .value("name")
        .value("channel_class")
        .value("role_arn")
        .child(
            "input_specification",
            BlockBuilder::new().value("codec").value("maximum_bitrate").value("input_resolution"),
        );

    let destinations = BlockBuilder::new().child(
        "destinations",
        BlockBuilder::new().value("id").child(
            "settings",
            BlockBuilder::new()
                .value("url")
                .value("stream_name")
                .value("username")
                .value("password_param"),
        ),
    );

    let input_attachments = BlockBuilder::new().child(
        "input_attachments",
        BlockBuilder::new()
            .value("input_attachment_name")
            .value("input_id")
            .child(
                "input_settings",
                BlockBuilder::new().value("source_end_behavior").value("input_filter"),
            ),
    );

    let encoder = BlockBuilder::new().child(
        "encoder_settings",
        BlockBuilder::new()
            .child(
                "video_descriptions",
                BlockBuilder::new().value("name").value("width").value("height").value("codec"),
            )
            .child(
                "audio_descriptions",
                BlockBuilder::new().value("name").value("audio_selector_name"),
            )
            .child(
                "output_groups",
                BlockBuilder::new().value("name").value("destination_ref_id"),
            )
            .value("timecode_source"),
    );

    let trailer = BlockBuilder::new().value("log_level").value("tags");

    Composite::new()
        .with(core)
        .with(destinations)
        .with(input_attachments)
        .with(encoder)
        .with(trailer)
}

pub fn definition() -> Result<ResourceDefinition, SchemaError> {
    let binder = ReferenceBinder::new(&["id", "arn", "channel_id"])
        .computed("has_role", |r| r.contains("role_arn").into())
        .computed("pipelines_running_count", |r| pipelines_running_count(r).into());

    Ok(ResourceDefinition::new(RESOURCE_TYPE, schema()?)
        .describe("MediaLive channel")
        .with_builder(builder())
        .with_binder(binder))
}

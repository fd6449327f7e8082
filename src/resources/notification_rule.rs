//! `aws_codestarnotifications_notification_rule`

use std::sync::Arc;

use serde_json::json;

use crate::catalog::ResourceDefinition;
use crate::constraint::{Constraint, Pattern};
use crate::error::SchemaError;
use crate::reference::ReferenceBinder;
use crate::rules::UniqueBy;
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::value::AttrValue;

use super::common::{arn, tags};

pub const RESOURCE_TYPE: &str = "aws_codestarnotifications_notification_rule";

fn target() -> Result<Schema, SchemaError> {
    Schema::builder("target")
        .field(FieldSpec::required("address", arn()?))
        .field(FieldSpec::defaulted(
            "type",
            FieldKind::one_of(&["SNS", "AWSChatbotSlack"]),
            json!("SNS"),
        ))
        .strict()
        .build()
}

pub fn schema() -> Result<Schema, SchemaError> {
    let rule_name = Pattern::new(
        r"[A-Za-z0-9\-_ ]{1,64}",
        "1-64 alphanumeric/hyphen/underscore/space characters",
    )?;
    let event_type_id = Pattern::new(
        r"[a-z0-9-]+-[a-z0-9-]+",
        "an event type id such as codecommit-repository-comments-on-commits",
    )?;

    Schema::builder(RESOURCE_TYPE)
        .field(FieldSpec::required("name", FieldKind::Pattern(rule_name)))
        .field(FieldSpec::required("detail_type", FieldKind::one_of(&["BASIC", "FULL"])))
        .field(
            FieldSpec::required("event_type_ids", FieldKind::array_of(FieldKind::Pattern(event_type_id)))
                .constraint(Constraint::size(1, 200)),
        )
        .field(FieldSpec::required("resource", arn()?))
        .field(FieldSpec::defaulted(
            "status",
            FieldKind::one_of(&["ENABLED", "DISABLED"]),
            json!("ENABLED"),
        ))
        .field(
            FieldSpec::optional("targets", FieldKind::array_of(FieldKind::nested(&Arc::new(target()?))))
                .constraint(Constraint::at_most(10)),
        )
        .field(tags())
        .rule(UniqueBy::items("event_type_ids"))
        .rule(UniqueBy::field("targets", "address"))
        .build()
}

pub fn definition() -> Result<ResourceDefinition, SchemaError> {
    let binder = ReferenceBinder::new(&["id", "arn"])
        .computed("target_count", |r| r.list("targets").map_or(0, <[AttrValue]>::len).into())
        .computed("is_enabled", |r| (r.str("status") == Some("ENABLED")).into());

    Ok(ResourceDefinition::new(RESOURCE_TYPE, schema()?)
        .describe("CodeStar notification rule")
        .with_binder(binder))
}

//! `aws_api_gateway_domain_name`

use std::sync::Arc;

use serde_json::json;

use crate::catalog::ResourceDefinition;
use crate::constraint::{Constraint, Pattern};
use crate::error::SchemaError;
use crate::reference::{ReferenceBinder, Token};
use crate::rules::{FnRule, PresenceCount};
use crate::schema::{FieldKind, FieldSpec, Schema};
use crate::value::{AttrValue, AttributeRecord, Scalar};

use super::common::{arn, tags};

pub const RESOURCE_TYPE: &str = "aws_api_gateway_domain_name";

const CERTIFICATES: [&str; 2] = ["certificate_arn", "regional_certificate_arn"];

fn endpoint_configuration() -> Result<Schema, SchemaError> {
    Schema::builder("endpoint_configuration")
        .field(
            FieldSpec::required(
                "types",
                FieldKind::array_of(FieldKind::one_of(&["EDGE", "REGIONAL", "PRIVATE"])),
            )
            .constraint(Constraint::size(1, 1)),
        )
        .strict()
        .build()
}

fn endpoint_type(record: &AttributeRecord) -> Option<&str> {
    record
        .record("endpoint_configuration")?
        .list("types")?
        .first()
        .and_then(AttrValue::as_str)
}

fn regional_certificate_requires_regional_endpoint(record: &AttributeRecord) -> Result<(), String> {
    match endpoint_type(record).filter(|kind| Token::parse(kind).is_none()) {
        Some(kind) if record.contains("regional_certificate_arn") && kind != "REGIONAL" => Err(format!(
            "regional_certificate_arn requires a REGIONAL endpoint, found {kind}"
        )),
        Some(kind) if record.contains("certificate_arn") && kind != "EDGE" => Err(format!(
            "certificate_arn is only used by EDGE endpoints, found {kind}"
        )),
        _ => Ok(()),
    }
}

pub fn schema() -> Result<Schema, SchemaError> {
    let hostname = Pattern::new(
        r"(\*\.)?([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}",
        "a lowercase DNS name, optionally starting with a `*.` wildcard",
    )?;

    Schema::builder(RESOURCE_TYPE)
        .field(
            FieldSpec::required("domain_name", FieldKind::Pattern(hostname))
                .constraint(Constraint::at_most(253)),
        )
        .field(FieldSpec::optional("certificate_arn", arn()?))
        .field(FieldSpec::optional("regional_certificate_arn", arn()?))
        .field(FieldSpec::defaulted(
            "endpoint_configuration",
            FieldKind::nested(&Arc::new(endpoint_configuration()?)),
            json!({"types": ["EDGE"]}),
        ))
        .field(FieldSpec::defaulted(
            "security_policy",
            FieldKind::one_of(&["TLS_1_0", "TLS_1_2"]),
            json!("TLS_1_2"),
        ))
        .field(tags())
        .rule(PresenceCount::at_most_one_of(&CERTIFICATES))
        .rule(FnRule::new(
            "certificate_matches_endpoint_type",
            regional_certificate_requires_regional_endpoint,
        ))
        .build()
}

pub fn definition() -> Result<ResourceDefinition, SchemaError> {
    let binder = ReferenceBinder::new(&[
        "id",
        "arn",
        "cloudfront_domain_name",
        "cloudfront_zone_id",
        "regional_domain_name",
        "regional_zone_id",
    ])
    .computed("is_custom_certificate", |r| CERTIFICATES.iter().any(|c| r.contains(c)).into())
    .computed("endpoint_type", |r| Scalar::from(endpoint_type(r).unwrap_or("EDGE")));

    Ok(ResourceDefinition::new(RESOURCE_TYPE, schema()?)
        .describe("API Gateway custom domain name")
        .with_binder(binder))
}

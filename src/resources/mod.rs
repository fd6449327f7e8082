//! Built-in AWS resource definitions.
//!
//! Every schema here is an instance of the generic engine; nothing in this
//! module is special-cased by the validator or the builders.

pub mod api_gateway_domain;
pub mod common;
pub mod iotanalytics_dataset;
pub mod iotanalytics_pipeline;
pub mod medialive_channel;
pub mod notification_rule;
pub mod sqs_queue;

use tracing::info;

use crate::catalog::{Catalog, CatalogError, ResourceDefinition};
use crate::error::SchemaError;

pub fn builtin_definitions() -> Result<Vec<ResourceDefinition>, SchemaError> {
    Ok(vec![
        sqs_queue::definition()?,
        iotanalytics_dataset::definition()?,
        iotanalytics_pipeline::definition()?,
        notification_rule::definition()?,
        medialive_channel::definition()?,
        api_gateway_domain::definition()?,
    ])
}

/// Builds the catalog of built-in resources. Call once at startup and share
/// the result.
pub fn builtin_catalog() -> Result<Catalog, CatalogError> {
    let catalog = Catalog::new(builtin_definitions()?)?;
    info!(resources = catalog.len(), "resource catalog initialized");
    Ok(catalog)
}

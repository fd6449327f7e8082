//! Synthesis Pipeline - Single Entry Point
//!
//! CRITICAL: synthesize MUST call validate internally. No bypass.
//! raw map -> schema validation -> cross-field rules -> record -> block IR,
//! and record + instance name -> reference bundle.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{Catalog, ResourceDefinition};
use crate::error::ValidationError;
use crate::hashing::{compute_block_hash, compute_definition_hash};
use crate::ir::IrNode;
use crate::reference::{InstanceName, ReferenceBundle};
use crate::value::AttributeRecord;
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Resource {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),

    #[error("Invalid engine version: {0}")]
    InvalidEngineVersion(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PipelineError {
    /// True when the caller's input was at fault rather than the catalog.
    pub fn is_user_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_) | PipelineError::InvalidPayload(_))
    }
}

/// The hand-off to the synthesis engine plus the caller's reference bundle.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedResource {
    pub id: String,
    pub resource_type: String,
    pub instance_name: InstanceName,
    pub schema_version: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub block_hash: String,
    pub definition_hash: String,
    pub block: IrNode,
    pub references: ReferenceBundle,
}

/// The synthesis pipeline - single entry point for all resource definitions
pub struct SynthesisPipeline {
    catalog: Catalog,
}

impl SynthesisPipeline {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// List all registered resource types
    pub fn list_resources(&self) -> Vec<&ResourceDefinition> {
        self.catalog.list()
    }

    /// Get a specific resource definition
    pub fn get_resource(&self, resource_type: &str) -> Option<&ResourceDefinition> {
        self.catalog.get(resource_type)
    }

    /// Validate a raw attribute map against a resource schema
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self, resource_type: &str, raw: &Value) -> Result<AttributeRecord, PipelineError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let definition = self.definition(resource_type)?;
        self.check_engine_version(definition)?;

        let raw = raw.as_object().ok_or_else(|| {
            PipelineError::InvalidPayload(format!("expected a JSON object for `{resource_type}`"))
        })?;

        let record = definition.schema.shape_check(raw)?;
        debug!(%resource_type, fields = record.len(), "shape check passed");
        definition.schema.check_rules(&record)?;
        debug!(%resource_type, rules = definition.schema.rule_names().len(), "cross-field rules passed");
        Ok(record)
    }

    /// Synthesize a resource block and its references
    ///
    /// CRITICAL: This ALWAYS calls validate internally. No bypass possible.
    pub fn synthesize(
        &self,
        resource_type: &str,
        instance_name: &str,
        raw: &Value,
    ) -> Result<SynthesizedResource, PipelineError> {
        let definition = self.definition(resource_type)?;
        let instance_name = InstanceName::new(instance_name)?;

        // MANDATORY: Validation is always called. This is non-negotiable.
        let record = self.validate(resource_type, raw)?;

        let block = definition.builder.build(&record);
        debug_assert!(block.is_homogeneous(), "builder for {resource_type} emitted a mixed list");
        debug!(%resource_type, %instance_name, keys = block.len(), "block built");

        let references = definition.binder.bind(resource_type, &instance_name, &record);
        debug!(%resource_type, %instance_name, outputs = references.outputs.len(), "references bound");

        let block_hash = compute_block_hash(resource_type, instance_name.as_str(), &block)?;
        let schema_version = definition.schema_version.to_string();
        let definition_hash = compute_definition_hash(
            resource_type,
            &schema_version,
            instance_name.as_str(),
            &record,
            ENGINE_VERSION,
        )?;

        Ok(SynthesizedResource {
            id: Uuid::new_v4().to_string(),
            resource_type: resource_type.to_string(),
            instance_name,
            schema_version,
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            block_hash,
            definition_hash,
            block,
            references,
        })
    }

    fn definition(&self, resource_type: &str) -> Result<&ResourceDefinition, PipelineError> {
        self.catalog
            .get(resource_type)
            .ok_or_else(|| PipelineError::ResourceNotFound(resource_type.to_string()))
    }

    fn check_engine_version(&self, definition: &ResourceDefinition) -> Result<(), PipelineError> {
        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|e| PipelineError::InvalidEngineVersion(e.to_string()))?;

        if engine_ver < definition.engine_min_version {
            return Err(PipelineError::EngineVersionMismatch(
                definition.resource_type.clone(),
                definition.engine_min_version.to_string(),
                ENGINE_VERSION.to_string(),
            ));
        }

        Ok(())
    }
}

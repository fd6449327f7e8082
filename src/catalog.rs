//! Resource Catalog - Definitions Registered Once
//!
//! The catalog is assembled by an explicit initialization call and is
//! read-only afterwards. Concurrent readers need no locking.

use std::sync::Arc;

use indexmap::IndexMap;
use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::builder::{BlockBuilder, Builder};
use crate::error::SchemaError;
use crate::reference::ReferenceBinder;
use crate::schema::Schema;

pub type ResourceType = String;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Resource type registered twice: {0}")]
    DuplicateResource(String),

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Everything needed to validate, build and bind one resource type.
pub struct ResourceDefinition {
    pub resource_type: ResourceType,
    pub description: String,
    pub schema_version: Version,
    pub engine_min_version: Version,
    pub schema: Arc<Schema>,
    pub builder: Box<dyn Builder>,
    pub binder: ReferenceBinder,
}

impl ResourceDefinition {
    /// Defaults: builder derived from the schema, a single `id` output.
    pub fn new(resource_type: &str, schema: Schema) -> Self {
        let builder = BlockBuilder::from_schema(&schema);
        Self {
            resource_type: resource_type.to_string(),
            description: String::new(),
            schema_version: Version::new(1, 0, 0),
            engine_min_version: Version::new(1, 0, 0),
            schema: Arc::new(schema),
            builder: Box::new(builder),
            binder: ReferenceBinder::new(&["id"]),
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn versions(mut self, schema_version: Version, engine_min_version: Version) -> Self {
        self.schema_version = schema_version;
        self.engine_min_version = engine_min_version;
        self
    }

    pub fn with_builder(mut self, builder: impl Builder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    pub fn with_binder(mut self, binder: ReferenceBinder) -> Self {
        self.binder = binder;
        self
    }

    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            resource_type: self.resource_type.clone(),
            description: self.description.clone(),
            schema_version: self.schema_version.to_string(),
            fields: self.schema.fields().iter().map(|f| f.name().to_string()).collect(),
            rules: self.schema.rule_names().into_iter().map(str::to_string).collect(),
            outputs: self.binder.outputs().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub resource_type: ResourceType,
    pub description: String,
    pub schema_version: String,
    pub fields: Vec<String>,
    pub rules: Vec<String>,
    pub outputs: Vec<String>,
}

/// Resource catalog - immutable after construction
pub struct Catalog {
    definitions: IndexMap<ResourceType, ResourceDefinition>,
}

impl Catalog {
    /// Registers every definition in the order given.
    pub fn new(definitions: Vec<ResourceDefinition>) -> Result<Self, CatalogError> {
        let mut registered = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let resource_type = definition.resource_type.clone();
            if registered.contains_key(&resource_type) {
                warn!(%resource_type, "rejecting duplicate resource definition");
                return Err(CatalogError::DuplicateResource(resource_type));
            }
            debug!(%resource_type, fields = definition.schema.fields().len(), "registered resource definition");
            registered.insert(resource_type, definition);
        }
        Ok(Self { definitions: registered })
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourceDefinition> {
        self.definitions.get(resource_type)
    }

    pub fn list(&self) -> Vec<&ResourceDefinition> {
        self.definitions.values().collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

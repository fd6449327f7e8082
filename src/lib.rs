//! ResourceForge Core - Schema-Driven Infrastructure Definitions
//!
//! # Flow
//! 1. Raw input is checked against a declarative schema
//! 2. Defaults are filled and keys canonicalized into an attribute record
//! 3. Cross-field rules run over the completed record
//! 4. Builders lower the record into a block IR tree
//! 5. The binder exposes typed reference tokens for other resources
//!
//! Schemas are data. Adding a resource type means adding a schema, a builder
//! and a binder, never touching the validator.

pub mod value;
pub mod constraint;
pub mod error;
pub mod schema;
pub mod rules;
pub mod ir;
pub mod builder;
pub mod reference;
pub mod catalog;
pub mod hashing;
pub mod pipeline;
pub mod resources;

pub use value::{normalize_key, AttrValue, AttributeRecord, Scalar};
pub use constraint::{Constraint, ConstraintKind, Pattern};
pub use error::{SchemaError, ValidationError};
pub use schema::{FieldKind, FieldSpec, Presence, Schema, ScalarType};
pub use rules::{CrossFieldRule, FnRule, PresenceCount, UniqueBy};
pub use ir::{IrNode, IrValue};
pub use builder::{BlockBuilder, Builder, Composite, Wrap};
pub use reference::{InstanceName, ReferenceBinder, ReferenceBundle, Token};
pub use catalog::{Catalog, CatalogError, ResourceDefinition, ResourceSummary};
pub use hashing::{canonical_json, compute_block_hash, compute_definition_hash};
pub use pipeline::{PipelineError, SynthesisPipeline, SynthesizedResource};
pub use resources::builtin_catalog;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

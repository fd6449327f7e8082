//! Hashing System - SHA-256 for Synthesized Blocks
//!
//! Block hashes cover the IR exactly as emitted, key order included, so they
//! double as golden-file fingerprints.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

use crate::ir::IrNode;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(keys.into_iter().map(|k| (k.clone(), sort_value(&map[k]))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}

/// block_hash = sha256(resource_type + instance_name + ordered block JSON)
pub fn compute_block_hash(
    resource_type: &str,
    instance_name: &str,
    block: &IrNode,
) -> Result<String, serde_json::Error> {
    let ordered = to_string(block)?;
    let combined = format!("{}:{}:{}", resource_type, instance_name, ordered);
    Ok(sha256_hex(combined.as_bytes()))
}

/// Fingerprint of the validated input, independent of input key order.
/// definition_hash = sha256(resource_type + schema_version + instance_name + canonical_record + engine_version)
pub fn compute_definition_hash(
    resource_type: &str,
    schema_version: &str,
    instance_name: &str,
    record: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical_record = canonical_json(record)?;
    let combined = format!(
        "{}:{}:{}:{}:{}",
        resource_type, schema_version, instance_name, canonical_record, engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

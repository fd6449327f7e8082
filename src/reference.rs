//! Reference Binding - Symbolic Outputs
//!
//! Tokens stand in for attributes that only exist once the external engine
//! applies the resource. They are rendered as `${type.name.attribute}` and may
//! be placed verbatim in another resource's raw input.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::ValidationError;
use crate::value::{AttributeRecord, Scalar};

fn is_identifier(s: &str, allow_dash: bool) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || (allow_dash && c == '-'))
}

/// A resource instance name that is safe to embed in a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InstanceName(String);

impl InstanceName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        if is_identifier(name, true) {
            Ok(Self(name.to_string()))
        } else {
            Err(ValidationError::InvalidInstanceName { name: name.to_string() })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    resource_type: String,
    instance_name: String,
    attribute: String,
}

impl Token {
    pub fn new(resource_type: &str, instance_name: &InstanceName, attribute: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            instance_name: instance_name.as_str().to_string(),
            attribute: attribute.to_string(),
        }
    }

    /// Parses the interpolation form `${type.name.attribute}`.
    pub fn parse(s: &str) -> Option<Self> {
        let body = s.strip_prefix("${")?.strip_suffix('}')?;
        let mut parts = body.split('.');
        let (resource_type, instance_name, attribute) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some()
            || !is_identifier(resource_type, false)
            || !is_identifier(instance_name, true)
            || !is_identifier(attribute, false)
        {
            return None;
        }
        Some(Self {
            resource_type: resource_type.to_string(),
            instance_name: instance_name.to_string(),
            attribute: attribute.to_string(),
        })
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// `type.name.attribute`, without interpolation delimiters.
    pub fn canonical(&self) -> String {
        format!("{}.{}.{}", self.resource_type, self.instance_name, self.attribute)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}.{}}}", self.resource_type, self.instance_name, self.attribute)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A derived value computed from the record alone.
#[derive(Debug, Clone, Copy)]
pub struct ComputedProperty {
    pub name: &'static str,
    pub compute: fn(&AttributeRecord) -> Scalar,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceBundle {
    pub resource_type: String,
    pub instance_name: InstanceName,
    pub outputs: IndexMap<String, Token>,
    pub computed: IndexMap<String, Scalar>,
}

impl ReferenceBundle {
    pub fn output(&self, attribute: &str) -> Option<&Token> {
        self.outputs.get(attribute)
    }

    pub fn computed(&self, name: &str) -> Option<&Scalar> {
        self.computed.get(name)
    }
}

/// Per-resource-type list of exposed outputs plus computed properties.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBinder {
    outputs: Vec<String>,
    computed: Vec<ComputedProperty>,
}

impl ReferenceBinder {
    pub fn new(outputs: &[&str]) -> Self {
        Self {
            outputs: outputs.iter().map(|o| o.to_string()).collect(),
            computed: vec![],
        }
    }

    pub fn computed(mut self, name: &'static str, compute: fn(&AttributeRecord) -> Scalar) -> Self {
        self.computed.push(ComputedProperty { name, compute });
        self
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Total over validated records: binding never fails.
    pub fn bind(
        &self,
        resource_type: &str,
        instance_name: &InstanceName,
        record: &AttributeRecord,
    ) -> ReferenceBundle {
        let outputs = self
            .outputs
            .iter()
            .map(|attr| (attr.clone(), Token::new(resource_type, instance_name, attr)))
            .collect();
        let computed = self
            .computed
            .iter()
            .map(|p| (p.name.to_string(), (p.compute)(record)))
            .collect();
        ReferenceBundle {
            resource_type: resource_type.to_string(),
            instance_name: instance_name.clone(),
            outputs,
            computed,
        }
    }
}

//! Cross-Field Rules - Record-Level Invariants
//!
//! Rules see a record that already passed every field check. A schema holds an
//! explicit, ordered list of rules; the first failing rule aborts validation.

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::value::{AttrValue, AttributeRecord};

/// Cross-field rule trait - inspects several fields of one record
pub trait CrossFieldRule: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, record: &AttributeRecord) -> Result<(), ValidationError>;
}

fn violated(rule: &str, detail: String) -> ValidationError {
    ValidationError::CrossFieldViolation {
        rule: rule.to_string(),
        detail,
    }
}

/// JSON form of a value, so `"1"` and `1` never compare equal.
fn render(value: &AttrValue) -> String {
    value.to_value().to_string()
}

// --- Concrete Rules ---

/// Elements of a list must be pairwise distinct, either on a named sub-field
/// of each element record or on the elements themselves.
pub struct UniqueBy {
    name: String,
    list_field: String,
    key_field: Option<String>,
}

impl UniqueBy {
    pub fn field(list_field: &str, key_field: &str) -> Self {
        Self {
            name: format!("unique_{key_field}_in_{list_field}"),
            list_field: list_field.to_string(),
            key_field: Some(key_field.to_string()),
        }
    }

    pub fn items(list_field: &str) -> Self {
        Self {
            name: format!("unique_{list_field}"),
            list_field: list_field.to_string(),
            key_field: None,
        }
    }
}

impl CrossFieldRule for UniqueBy {
    fn name(&self) -> &str { &self.name }

    fn check(&self, record: &AttributeRecord) -> Result<(), ValidationError> {
        let Some(items) = record.list(&self.list_field) else {
            return Ok(());
        };

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (index, item) in items.iter().enumerate() {
            let projected = match &self.key_field {
                Some(key) => match item.as_record().and_then(|r| r.get(key)) {
                    Some(value) => value,
                    None => continue,
                },
                None => item,
            };
            let rendered = render(projected);
            if let Some(first) = seen.insert(rendered.clone(), index) {
                let subject = match &self.key_field {
                    Some(key) => format!("`{key}` value {rendered}"),
                    None => format!("value {rendered}"),
                };
                return Err(violated(
                    &self.name,
                    format!(
                        "duplicate {subject} in `{}` (elements {first} and {index})",
                        self.list_field
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Counts how many of a group of optional fields are present and checks the
/// count against an inclusive range.
pub struct PresenceCount {
    name: String,
    fields: Vec<String>,
    min: usize,
    max: usize,
}

impl PresenceCount {
    fn new(prefix: &str, fields: &[&str], min: usize, max: usize) -> Self {
        Self {
            name: format!("{prefix}_{}", fields.join("_")),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            min,
            max,
        }
    }

    pub fn exactly_one_of(fields: &[&str]) -> Self {
        Self::new("exactly_one_of", fields, 1, 1)
    }

    pub fn at_least_one_of(fields: &[&str]) -> Self {
        Self::new("at_least_one_of", fields, 1, fields.len())
    }

    pub fn at_most_one_of(fields: &[&str]) -> Self {
        Self::new("at_most_one_of", fields, 0, 1)
    }

    fn expectation(&self) -> String {
        match (self.min, self.max) {
            (1, 1) => "exactly one".to_string(),
            (0, 1) => "at most one".to_string(),
            (lo, hi) if hi == self.fields.len() => format!("at least {lo}"),
            (lo, hi) => format!("between {lo} and {hi}"),
        }
    }
}

impl CrossFieldRule for PresenceCount {
    fn name(&self) -> &str { &self.name }

    fn check(&self, record: &AttributeRecord) -> Result<(), ValidationError> {
        let present: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| record.contains(f))
            .map(String::as_str)
            .collect();

        if present.len() < self.min {
            return Err(violated(
                &self.name,
                format!(
                    "none of [{}] is set; expected {}",
                    self.fields.join(", "),
                    self.expectation()
                ),
            ));
        }
        if present.len() > self.max {
            return Err(violated(
                &self.name,
                format!("[{}] are all set; expected {}", present.join(", "), self.expectation()),
            ));
        }
        Ok(())
    }
}

/// A named one-off rule over a whole record.
pub struct FnRule {
    name: &'static str,
    check: fn(&AttributeRecord) -> Result<(), String>,
}

impl FnRule {
    pub fn new(name: &'static str, check: fn(&AttributeRecord) -> Result<(), String>) -> Self {
        Self { name, check }
    }
}

impl CrossFieldRule for FnRule {
    fn name(&self) -> &str { self.name }

    fn check(&self, record: &AttributeRecord) -> Result<(), ValidationError> {
        (self.check)(record).map_err(|detail| violated(self.name, detail))
    }
}

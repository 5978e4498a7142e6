//! Primary-key tuples addressed by single-record endpoints.

use crate::error::AppError;
use crate::model::{coerce_str, EntityDescriptor, Record};
use serde_json::Value;

/// Ordered (field, value) pairs, one per primary-key field in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyTuple(Vec<(String, Value)>);

impl KeyTuple {
    pub fn new(parts: Vec<(String, Value)>) -> Self {
        KeyTuple(parts)
    }

    /// Builds the key from decoded path variables. Each primary-key field must
    /// be present and parse as its declared type.
    pub fn from_path(entity: &EntityDescriptor, params: &[(String, String)]) -> Result<Self, AppError> {
        let mut parts = Vec::with_capacity(entity.primary_key().len());
        for field in entity.key_fields() {
            let raw = params
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| AppError::BadRequest(format!("missing key segment '{}'", field.name)))?;
            let value = coerce_str(field.field_type, raw).ok_or_else(|| {
                AppError::BadRequest(format!("invalid {} for '{}': {}", field.field_type, field.name, raw))
            })?;
            parts.push((field.name.clone(), value));
        }
        Ok(KeyTuple(parts))
    }

    /// Extracts the key of a stored record.
    pub fn from_record(entity: &EntityDescriptor, record: &Record) -> Self {
        KeyTuple(
            entity
                .primary_key()
                .iter()
                .map(|k| (k.clone(), record.get(k).cloned().unwrap_or(Value::Null)))
                .collect(),
        )
    }

    pub fn parts(&self) -> &[(String, Value)] {
        &self.0
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(name, value)| record.get(name).map(|v| v == value).unwrap_or(false))
    }
}

impl std::fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(_, v)| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        f.write_str(&parts.join("/"))
    }
}

//! Payload validation from field descriptors.

use crate::error::AppError;
use crate::model::{EntityDescriptor, FieldDescriptor, FieldVisibility, Record};
use serde_json::Value;

pub struct PayloadValidator;

impl PayloadValidator {
    /// Validate a create payload already restricted to creatable fields.
    /// Every required creatable field must be present and non-null.
    pub fn validate_create(
        entity: &EntityDescriptor,
        visibility: &FieldVisibility,
        payload: &Record,
    ) -> Result<(), AppError> {
        require(entity, visibility.creatable(), payload)?;
        validate_present(entity, payload)
    }

    /// Validate a replace payload already restricted to updatable fields.
    pub fn validate_replace(
        entity: &EntityDescriptor,
        visibility: &FieldVisibility,
        payload: &Record,
    ) -> Result<(), AppError> {
        require(entity, visibility.updatable(), payload)?;
        validate_present(entity, payload)
    }

    /// Validate only the fields present (for PATCH). Required is not enforced for missing fields.
    pub fn validate_patch(entity: &EntityDescriptor, payload: &Record) -> Result<(), AppError> {
        validate_present(entity, payload)
    }
}

fn require(entity: &EntityDescriptor, allowed: &[String], payload: &Record) -> Result<(), AppError> {
    for name in allowed {
        let Some(field) = entity.field(name) else { continue };
        // key fields are required unless the store assigns them
        let optional = field.nullable && !entity.is_primary_key(name);
        if optional || field.autoincrement {
            continue;
        }
        if payload.get(name).map_or(true, Value::is_null) {
            return Err(AppError::Validation(format!("{} is required", name)));
        }
    }
    Ok(())
}

fn validate_present(entity: &EntityDescriptor, payload: &Record) -> Result<(), AppError> {
    for (name, v) in payload {
        if let Some(field) = entity.field(name) {
            validate_field(field, v)?;
        }
    }
    Ok(())
}

fn validate_field(field: &FieldDescriptor, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        if field.nullable {
            return Ok(());
        }
        return Err(AppError::Validation(format!("{} must not be null", field.name)));
    }
    if !field.field_type.accepts(v) {
        return Err(AppError::Validation(format!(
            "{} must be a {}",
            field.name, field.field_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldType;
    use serde_json::json;

    fn todo() -> (EntityDescriptor, FieldVisibility) {
        let e = EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(FieldDescriptor::new("title", FieldType::String).not_null())
            .field(FieldDescriptor::new("count", FieldType::Integer))
            .primary_key(["id"])
            .build()
            .unwrap();
        let v = FieldVisibility::resolve(&e);
        (e, v)
    }

    fn rec(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn create_requires_non_nullable_fields() {
        let (e, v) = todo();
        assert!(PayloadValidator::validate_create(&e, &v, &rec(json!({"title": "t"}))).is_ok());
        let err = PayloadValidator::validate_create(&e, &v, &rec(json!({"count": 1}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "title is required"));
        assert!(PayloadValidator::validate_create(&e, &v, &rec(json!({"title": null}))).is_err());
    }

    #[test]
    fn types_are_checked() {
        let (e, v) = todo();
        let err = PayloadValidator::validate_create(&e, &v, &rec(json!({"title": "t", "count": "x"}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(PayloadValidator::validate_patch(&e, &rec(json!({"count": 2.5}))).is_err());
        assert!(PayloadValidator::validate_patch(&e, &rec(json!({"count": null}))).is_ok());
        assert!(PayloadValidator::validate_patch(&e, &rec(json!({"title": null}))).is_err());
    }

    #[test]
    fn patch_does_not_require_missing_fields() {
        let (e, v) = todo();
        assert!(PayloadValidator::validate_patch(&e, &Record::new()).is_ok());
        assert!(PayloadValidator::validate_replace(&e, &v, &Record::new()).is_err());
    }
}

//! Load entity config from a directory or an in-memory document and resolve it into descriptors.

use crate::config::resolved::{ResolvedEntity, ResolvedModel};
use crate::config::types::*;
use crate::config::{operations, validate};
use crate::error::ConfigError;
use crate::model::{EntityDescriptor, FieldDescriptor, Visibility};
use std::path::Path;
use std::sync::Arc;

/// File read from a config directory.
pub const ENTITIES_FILE: &str = "entities.json";

/// Parse a config document.
pub fn load_from_str(json: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(format!("{}: {}", ENTITIES_FILE, e)))
}

/// Read `entities.json` from `dir`.
pub fn load_from_path(dir: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = dir.as_ref().join(ENTITIES_FILE);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config = load_from_str(&raw)?;
    tracing::info!(path = %path.display(), entities = config.entities.len(), "config loaded");
    Ok(config)
}

/// Build the resolved model from config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;
    let mut entities = Vec::with_capacity(config.entities.len());
    for e in &config.entities {
        entities.push(ResolvedEntity {
            descriptor: Arc::new(descriptor_from_config(e)?),
            operations: operations(&e.operations),
        });
    }
    Ok(ResolvedModel { entities })
}

fn descriptor_from_config(e: &EntityConfig) -> Result<EntityDescriptor, ConfigError> {
    let mut builder = EntityDescriptor::builder(e.name.clone()).primary_key(e.primary_key.columns());
    if let Some(plural) = &e.plural_name {
        builder = builder.plural(plural.clone());
    }
    for f in &e.fields {
        builder = builder.field(field_from_config(f));
    }
    for index in &e.unique {
        builder = builder.unique(index.iter().cloned());
    }
    builder.build()
}

fn field_from_config(f: &FieldConfig) -> FieldDescriptor {
    let explicit = Visibility {
        hidden: f.hidden,
        no_create: f.no_create,
        no_update: f.no_update,
    };
    let visibility = f
        .comment
        .as_deref()
        .map(Visibility::from_comment)
        .unwrap_or_default()
        .union(explicit);
    let mut field = FieldDescriptor::new(f.name.clone(), f.field_type).visibility(visibility);
    if !f.nullable {
        field = field.not_null();
    }
    if f.autoincrement {
        field = field.autoincrement();
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Verb;

    const DOC: &str = r#"{
        "entities": [
            {
                "name": "todo",
                "primary_key": "id",
                "fields": [
                    {"name": "id", "type": "integer", "autoincrement": true},
                    {"name": "title", "type": "string", "nullable": false},
                    {"name": "secret", "type": "text", "comment": "Not Visible By API"}
                ],
                "unique": [["title"]]
            },
            {
                "name": "pair",
                "plural_name": "pairs",
                "primary_key": ["id", "idd"],
                "fields": [
                    {"name": "id", "type": "int"},
                    {"name": "idd", "type": "int", "no_update": true}
                ],
                "operations": ["get", "LIST"]
            }
        ]
    }"#;

    #[test]
    fn resolves_descriptors_and_operations() {
        let model = resolve(&load_from_str(DOC).unwrap()).unwrap();
        let todo = model.entity("todo").unwrap();
        assert_eq!(todo.operations, Verb::ALL.to_vec());
        assert_eq!(todo.descriptor.unique(), [vec!["title".to_string()]]);
        let secret = todo.descriptor.field("secret").unwrap();
        assert!(secret.visibility.hidden);
        assert!(!todo.descriptor.field("title").unwrap().nullable);

        let pair = model.entity("pair").unwrap();
        assert_eq!(pair.descriptor.primary_key(), ["id", "idd"]);
        assert_eq!(pair.operations, vec![Verb::List, Verb::Get]);
        assert!(pair.descriptor.field("idd").unwrap().visibility.no_update);
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(load_from_str("{"), Err(ConfigError::Load(_))));
        let dup = r#"{"entities": [
            {"name": "a", "primary_key": "id", "fields": [{"name": "id", "type": "integer"}]},
            {"name": "a", "primary_key": "id", "fields": [{"name": "id", "type": "integer"}]}
        ]}"#;
        assert!(matches!(resolve(&load_from_str(dup).unwrap()), Err(ConfigError::DuplicateEntity(_))));
        let bad_op = r#"{"entities": [
            {"name": "a", "primary_key": "id", "fields": [{"name": "id", "type": "integer"}], "operations": ["upsert"]}
        ]}"#;
        assert!(matches!(
            resolve(&load_from_str(bad_op).unwrap()),
            Err(ConfigError::UnknownOperation { .. })
        ));
        let bad_pk = r#"{"entities": [
            {"name": "a", "primary_key": "nope", "fields": [{"name": "id", "type": "integer"}]}
        ]}"#;
        assert!(matches!(
            resolve(&load_from_str(bad_pk).unwrap()),
            Err(ConfigError::InvalidPrimaryKey { .. })
        ));
    }

    #[test]
    fn missing_directory_is_a_load_error() {
        assert!(matches!(load_from_path("/nonexistent/entity-rest"), Err(ConfigError::Load(_))));
    }
}

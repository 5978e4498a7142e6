//! Entity and field descriptors: everything the engine knows about a record type.

use crate::error::ConfigError;
use crate::model::{canonicalize, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Column type for coercion, validation, filtering and DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[serde(alias = "text", alias = "varchar")]
    String,
    #[serde(alias = "int", alias = "bigint")]
    Integer,
    #[serde(alias = "decimal", alias = "double", alias = "numeric")]
    Float,
    #[serde(alias = "bool")]
    Boolean,
    Uuid,
    #[serde(alias = "timestamptz", alias = "datetime")]
    Timestamp,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    /// Whether a non-null JSON value is acceptable for this type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (FieldType::Float, Value::Number(_)) => true,
            (FieldType::Boolean, Value::Bool(_)) => true,
            (FieldType::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s).is_ok(),
            (FieldType::Timestamp, Value::String(s)) => {
                chrono::DateTime::parse_from_rfc3339(s).is_ok()
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::Timestamp => "timestamp",
        };
        f.write_str(s)
    }
}

/// Per-field API permissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// Never serialized by the default serializer.
    #[serde(default)]
    pub hidden: bool,
    /// Dropped from create payloads.
    #[serde(default)]
    pub no_create: bool,
    /// Dropped from replace and patch payloads.
    #[serde(default)]
    pub no_update: bool,
}

impl Visibility {
    /// Reads the column-comment convention: "not visible by api",
    /// "not create by api", "not update by api" (any combination, any case).
    pub fn from_comment(comment: &str) -> Self {
        let c = comment.to_lowercase();
        Visibility {
            hidden: c.contains("not visible by api"),
            no_create: c.contains("not create by api"),
            no_update: c.contains("not update by api"),
        }
    }

    pub fn union(self, other: Visibility) -> Self {
        Visibility {
            hidden: self.hidden || other.hidden,
            no_create: self.no_create || other.no_create,
            no_update: self.no_update || other.no_update,
        }
    }
}

/// Explicit value transformation run by the CRUD handlers (e.g. hashing on write).
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    /// Store assigns the value on insert; client-supplied values are discarded.
    pub autoincrement: bool,
    pub visibility: Visibility,
    pub on_write: Option<Transform>,
    pub on_read: Option<Transform>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            nullable: true,
            autoincrement: false,
            visibility: Visibility::default(),
            on_write: None,
            on_read: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self.nullable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visibility.hidden = true;
        self
    }

    pub fn no_create(mut self) -> Self {
        self.visibility.no_create = true;
        self
    }

    pub fn no_update(mut self) -> Self {
        self.visibility.no_update = true;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = self.visibility.union(visibility);
        self
    }

    pub fn on_write<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.on_write = Some(Arc::new(f));
        self
    }

    pub fn on_read<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.on_read = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("nullable", &self.nullable)
            .field("autoincrement", &self.autoincrement)
            .field("visibility", &self.visibility)
            .field("on_write", &self.on_write.is_some())
            .field("on_read", &self.on_read.is_some())
            .finish()
    }
}

/// Immutable description of one record type. Build with [`EntityDescriptor::builder`].
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    name: String,
    plural_name: String,
    fields: Vec<FieldDescriptor>,
    primary_key: Vec<String>,
    unique: Vec<Vec<String>>,
}

impl EntityDescriptor {
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            name: name.into(),
            plural_name: None,
            fields: Vec::new(),
            primary_key: Vec::new(),
            unique: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Declared unique indexes (each a list of column names).
    pub fn unique(&self) -> &[Vec<String>] {
        &self.unique
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.iter().any(|k| k == name)
    }

    pub fn autoincrement_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.autoincrement)
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.primary_key.iter().filter_map(|k| self.field(k))
    }

    /// Applies `on_read` transforms in place.
    pub fn apply_read(&self, record: &mut Record) {
        for field in &self.fields {
            if let Some(t) = &field.on_read {
                let current = record.get(&field.name).cloned().unwrap_or(Value::Null);
                record.insert(field.name.clone(), t(current));
            }
        }
    }

    /// Rewrites uuid and timestamp values into the form stores keep and
    /// filters compare against.
    pub fn canonicalize(&self, values: &mut Record) {
        for field in &self.fields {
            if let Some(v) = values.get_mut(&field.name) {
                *v = canonicalize(field.field_type, v.take());
            }
        }
    }

    /// Applies `on_write` transforms to the values present in `values`.
    pub fn apply_write(&self, values: &mut Record) {
        for field in &self.fields {
            if let Some(t) = &field.on_write {
                if let Some(v) = values.get_mut(&field.name) {
                    let taken = v.take();
                    *v = t(taken);
                }
            }
        }
    }
}

pub struct EntityBuilder {
    name: String,
    plural_name: Option<String>,
    fields: Vec<FieldDescriptor>,
    primary_key: Vec<String>,
    unique: Vec<Vec<String>>,
}

impl EntityBuilder {
    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural_name = Some(plural.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn unique<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique.push(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<EntityDescriptor, ConfigError> {
        let entity = self.name;
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields { entity });
        }
        let mut seen = HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    entity,
                    field: f.name.clone(),
                });
            }
        }
        if self.primary_key.is_empty() {
            return Err(ConfigError::EmptyPrimaryKey(entity));
        }
        for (i, pk) in self.primary_key.iter().enumerate() {
            if !seen.contains(pk.as_str()) {
                return Err(ConfigError::InvalidPrimaryKey {
                    entity,
                    column: pk.clone(),
                });
            }
            if self.primary_key[..i].contains(pk) {
                return Err(ConfigError::DuplicatePrimaryKey {
                    entity,
                    column: pk.clone(),
                });
            }
        }
        let auto: Vec<&FieldDescriptor> = self.fields.iter().filter(|f| f.autoincrement).collect();
        if auto.len() > 1 {
            return Err(ConfigError::InvalidAutoincrement {
                entity,
                column: auto[1].name.clone(),
                reason: "only one autoincrement field is allowed",
            });
        }
        if let Some(f) = auto.first() {
            if !self.primary_key.contains(&f.name) {
                return Err(ConfigError::InvalidAutoincrement {
                    entity,
                    column: f.name.clone(),
                    reason: "autoincrement field must be part of the primary key",
                });
            }
            if f.field_type != FieldType::Integer {
                return Err(ConfigError::InvalidAutoincrement {
                    entity,
                    column: f.name.clone(),
                    reason: "autoincrement field must be an integer",
                });
            }
        }
        for index in &self.unique {
            for col in index {
                if !seen.contains(col.as_str()) {
                    return Err(ConfigError::InvalidUniqueIndex {
                        entity,
                        column: col.clone(),
                    });
                }
            }
        }
        let plural_name = self.plural_name.unwrap_or_else(|| format!("{}s", entity));
        Ok(EntityDescriptor {
            name: entity,
            plural_name,
            fields: self.fields,
            primary_key: self.primary_key,
            unique: self.unique,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo() -> EntityBuilder {
        EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(FieldDescriptor::new("title", FieldType::String).not_null())
            .primary_key(["id"])
    }

    #[test]
    fn plural_defaults_to_trailing_s() {
        let e = todo().build().unwrap();
        assert_eq!(e.plural_name(), "todos");
        let e = todo().plural("todo-items").build().unwrap();
        assert_eq!(e.plural_name(), "todo-items");
    }

    #[test]
    fn primary_key_must_name_a_field() {
        let err = todo().primary_key(["missing"]).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrimaryKey { column, .. } if column == "missing"));
    }

    #[test]
    fn primary_key_columns_are_distinct() {
        let err = todo()
            .field(FieldDescriptor::new("idd", FieldType::Integer))
            .primary_key(["id", "idd", "id"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePrimaryKey { column, .. } if column == "id"));
    }

    #[test]
    fn fields_must_be_present_and_unique() {
        let err = EntityDescriptor::builder("x").primary_key(["id"]).build().unwrap_err();
        assert!(matches!(err, ConfigError::NoFields { .. }));
        let err = todo()
            .field(FieldDescriptor::new("title", FieldType::String))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateField { field, .. } if field == "title"));
    }

    #[test]
    fn autoincrement_outside_key_is_rejected() {
        let err = EntityDescriptor::builder("x")
            .field(FieldDescriptor::new("id", FieldType::Integer))
            .field(FieldDescriptor::new("seq", FieldType::Integer).autoincrement())
            .primary_key(["id"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAutoincrement { .. }));
    }

    #[test]
    fn comment_flags() {
        let v = Visibility::from_comment("title of Todo, NOT visible by api, not update by api");
        assert!(v.hidden);
        assert!(v.no_update);
        assert!(!v.no_create);
    }

    #[test]
    fn transforms_run_only_when_invoked() {
        let e = EntityDescriptor::builder("user")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(
                FieldDescriptor::new("token", FieldType::String)
                    .on_read(|v| if v.is_null() { Value::String(String::new()) } else { v }),
            )
            .field(FieldDescriptor::new("name", FieldType::String).on_write(|v| {
                Value::String(v.as_str().unwrap_or_default().to_uppercase())
            }))
            .primary_key(["id"])
            .build()
            .unwrap();

        let mut values = Record::new();
        values.insert("name".into(), Value::String("ada".into()));
        e.apply_write(&mut values);
        assert_eq!(values["name"], "ADA");
        assert!(!values.contains_key("token"));

        let mut record = Record::new();
        record.insert("id".into(), Value::from(1));
        record.insert("token".into(), Value::Null);
        e.apply_read(&mut record);
        assert_eq!(record["token"], "");
    }
}

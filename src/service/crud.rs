//! Generic CRUD execution against a record store.

use crate::error::AppError;
use crate::model::{EntityDescriptor, FieldVisibility, KeyTuple, Record};
use crate::query::QuerySpec;
use crate::service::PayloadValidator;
use crate::store::RecordStore;
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// Predicate, order, then offset/limit. Records come back with `on_read` applied.
    pub async fn list(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        spec: &QuerySpec,
    ) -> Result<Vec<Record>, AppError> {
        let mut rows = store.list(entity, spec).await?;
        for row in &mut rows {
            entity.apply_read(row);
        }
        Ok(rows)
    }

    /// Fetch one record by key.
    pub async fn get(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        key: &KeyTuple,
    ) -> Result<Record, AppError> {
        let mut row = store.get(entity, key).await?.ok_or_else(|| not_found(entity, key))?;
        entity.apply_read(&mut row);
        Ok(row)
    }

    /// Insert one record. Non-creatable fields are dropped; the store assigns
    /// the autoincrement key.
    pub async fn create(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        visibility: &FieldVisibility,
        payload: Record,
    ) -> Result<Record, AppError> {
        let mut values = visibility.retain_creatable(payload);
        PayloadValidator::validate_create(entity, visibility, &values)?;
        entity.canonicalize(&mut values);
        entity.apply_write(&mut values);
        let mut row = store.insert(entity, values).await?;
        entity.apply_read(&mut row);
        Ok(row)
    }

    /// Overwrite every updatable field; fields absent from the payload become null.
    pub async fn replace(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        visibility: &FieldVisibility,
        key: &KeyTuple,
        payload: Record,
    ) -> Result<Record, AppError> {
        let mut given = visibility.retain_updatable(payload);
        PayloadValidator::validate_replace(entity, visibility, &given)?;
        let mut values = Record::new();
        for name in visibility.updatable() {
            values.insert(name.clone(), given.remove(name).unwrap_or(Value::Null));
        }
        Self::write(store, entity, key, values).await
    }

    /// Overwrite only the updatable fields present in the payload.
    pub async fn patch(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        visibility: &FieldVisibility,
        key: &KeyTuple,
        payload: Record,
    ) -> Result<Record, AppError> {
        let values = visibility.retain_updatable(payload);
        PayloadValidator::validate_patch(entity, &values)?;
        Self::write(store, entity, key, values).await
    }

    pub async fn delete(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        key: &KeyTuple,
    ) -> Result<(), AppError> {
        if store.delete(entity, key).await? {
            Ok(())
        } else {
            Err(not_found(entity, key))
        }
    }

    async fn write(
        store: &dyn RecordStore,
        entity: &EntityDescriptor,
        key: &KeyTuple,
        mut values: Record,
    ) -> Result<Record, AppError> {
        entity.canonicalize(&mut values);
        entity.apply_write(&mut values);
        let mut row = store
            .update(entity, key, values)
            .await?
            .ok_or_else(|| not_found(entity, key))?;
        entity.apply_read(&mut row);
        Ok(row)
    }
}

fn not_found(entity: &EntityDescriptor, key: &KeyTuple) -> AppError {
    AppError::NotFound(format!("{} {}", entity.name(), key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, FieldType};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn todo() -> (EntityDescriptor, FieldVisibility) {
        let e = EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(FieldDescriptor::new("title", FieldType::String))
            .field(FieldDescriptor::new("description", FieldType::String))
            .field(
                FieldDescriptor::new("slug", FieldType::String)
                    .on_write(|v| match v {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    })
                    .on_read(|v| if v.is_null() { Value::String(String::new()) } else { v }),
            )
            .primary_key(["id"])
            .build()
            .unwrap();
        let v = FieldVisibility::resolve(&e);
        (e, v)
    }

    fn rec(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    fn key(id: i64) -> KeyTuple {
        KeyTuple::new(vec![("id".into(), json!(id))])
    }

    #[tokio::test]
    async fn replace_is_total_and_patch_merges() {
        let store = MemoryStore::new();
        let (e, v) = todo();
        CrudService::create(&store, &e, &v, rec(json!({"title": "t", "description": "d"})))
            .await
            .unwrap();

        let patched = CrudService::patch(&store, &e, &v, &key(1), rec(json!({"title": "u", "id": 7})))
            .await
            .unwrap();
        assert_eq!(patched["title"], "u");
        assert_eq!(patched["description"], "d");
        assert_eq!(patched["id"], 1);

        let replaced = CrudService::replace(&store, &e, &v, &key(1), rec(json!({"title": "r"})))
            .await
            .unwrap();
        assert_eq!(replaced["title"], "r");
        assert_eq!(replaced["description"], Value::Null);
    }

    #[tokio::test]
    async fn transforms_run_on_write_and_read() {
        let store = MemoryStore::new();
        let (e, v) = todo();
        let created = CrudService::create(&store, &e, &v, rec(json!({"title": "t"}))).await.unwrap();
        assert_eq!(created["slug"], "");
        let patched = CrudService::patch(&store, &e, &v, &key(1), rec(json!({"slug": "ABC"})))
            .await
            .unwrap();
        assert_eq!(patched["slug"], "abc");
    }

    #[tokio::test]
    async fn missing_keys_are_not_found() {
        let store = MemoryStore::new();
        let (e, v) = todo();
        assert!(matches!(CrudService::get(&store, &e, &key(999)).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            CrudService::patch(&store, &e, &v, &key(999), Record::new()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(CrudService::delete(&store, &e, &key(999)).await, Err(AppError::NotFound(_))));
    }
}

//! PostgreSQL adapter. One table per entity, named after the entity, in a
//! configurable schema.

use crate::error::StoreError;
use crate::model::{canonical_timestamp, EntityDescriptor, FieldDescriptor, FieldType, KeyTuple, Record};
use crate::query::QuerySpec;
use crate::sql::{self, QueryBuf};
use crate::store::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, "public")
    }

    pub fn with_schema(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn fetch_all(&self, entity: &EntityDescriptor, q: QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_record(entity, r)).collect()
    }

    async fn fetch_optional(&self, entity: &EntityDescriptor, q: QueryBuf) -> Result<Option<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| row_to_record(entity, &r)).transpose()
    }
}

fn row_to_record(entity: &EntityDescriptor, row: &PgRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for f in entity.fields() {
        record.insert(f.name.clone(), cell_to_value(row, f)?);
    }
    Ok(record)
}

/// Decodes one column. The select list casts each column to the type read here.
fn cell_to_value(row: &PgRow, field: &FieldDescriptor) -> Result<Value, StoreError> {
    let name = field.name.as_str();
    let value = match field.field_type {
        FieldType::String => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        FieldType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
        FieldType::Float => row
            .try_get::<Option<f64>, _>(name)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        FieldType::Uuid => row
            .try_get::<Option<uuid::Uuid>, _>(name)?
            .map(|u| Value::String(u.to_string())),
        FieldType::Timestamp => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(canonical_timestamp(&d))),
    };
    Ok(value.unwrap_or(Value::Null))
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list(&self, entity: &EntityDescriptor, query: &QuerySpec) -> Result<Vec<Record>, StoreError> {
        self.fetch_all(entity, sql::select_list(entity, &self.schema, query)).await
    }

    async fn get(&self, entity: &EntityDescriptor, key: &KeyTuple) -> Result<Option<Record>, StoreError> {
        self.fetch_optional(entity, sql::select_by_key(entity, &self.schema, key)).await
    }

    async fn insert(&self, entity: &EntityDescriptor, values: Record) -> Result<Record, StoreError> {
        let q = sql::insert(entity, &self.schema, &values);
        self.fetch_optional(entity, q)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no row", entity.name())))
    }

    async fn update(
        &self,
        entity: &EntityDescriptor,
        key: &KeyTuple,
        values: Record,
    ) -> Result<Option<Record>, StoreError> {
        self.fetch_optional(entity, sql::update(entity, &self.schema, key, &values)).await
    }

    async fn delete(&self, entity: &EntityDescriptor, key: &KeyTuple) -> Result<bool, StoreError> {
        let q = sql::delete(entity, &self.schema, key);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = p.bind(query);
        }
        Ok(query.fetch_optional(&self.pool).await?.is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

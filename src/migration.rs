//! DDL for entity tables: CREATE SCHEMA, then one CREATE TABLE IF NOT EXISTS per entity.

use crate::error::StoreError;
use crate::model::EntityDescriptor;
use crate::sql::{pg_column_type, qualified_table, quoted};
use sqlx::PgPool;
use std::sync::Arc;

/// CREATE TABLE statement for one entity: typed columns, NOT NULL, identity
/// for the autoincrement key, PRIMARY KEY and declared UNIQUE indexes.
pub fn create_table_sql(schema: &str, entity: &EntityDescriptor) -> String {
    let mut col_defs: Vec<String> = entity
        .fields()
        .iter()
        .map(|f| {
            if f.autoincrement {
                return format!("{} BIGINT GENERATED BY DEFAULT AS IDENTITY", quoted(&f.name));
            }
            let mut def = format!("{} {}", quoted(&f.name), pg_column_type(f.field_type));
            if !f.nullable {
                def.push_str(" NOT NULL");
            }
            def
        })
        .collect();

    let pk_cols: Vec<String> = entity.primary_key().iter().map(|s| quoted(s)).collect();
    col_defs.push(format!("PRIMARY KEY ({})", pk_cols.join(", ")));
    for u in entity.unique() {
        let cols: Vec<String> = u.iter().map(|s| quoted(s)).collect();
        col_defs.push(format!("UNIQUE ({})", cols.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(schema, entity.name()),
        col_defs.join(",\n  ")
    )
}

/// Creates `schema` and every missing entity table. Existing tables are left untouched.
pub async fn ensure_tables(
    pool: &PgPool,
    schema: &str,
    entities: &[Arc<EntityDescriptor>],
) -> Result<(), StoreError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for entity in entities {
        let sql = create_table_sql(schema, entity);
        tracing::debug!(entity = %entity.name(), sql = %sql, "ensure table");
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(schema = %schema, tables = entities.len(), "entity tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, FieldType};

    #[test]
    fn ddl_for_autoincrement_and_unique() {
        let e = EntityDescriptor::builder("todo")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
            .field(FieldDescriptor::new("title", FieldType::String).not_null())
            .field(FieldDescriptor::new("description", FieldType::String))
            .primary_key(["id"])
            .unique(["title", "description"])
            .build()
            .unwrap();
        assert_eq!(
            create_table_sql("public", &e),
            "CREATE TABLE IF NOT EXISTS \"public\".\"todo\" (\n  \
             \"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY,\n  \
             \"title\" TEXT NOT NULL,\n  \
             \"description\" TEXT,\n  \
             PRIMARY KEY (\"id\"),\n  \
             UNIQUE (\"title\", \"description\")\n)"
        );
    }
}

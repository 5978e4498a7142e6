//! In-process record store. Rows keep insertion order, which is the natural
//! order used to break ordering ties.

use crate::error::StoreError;
use crate::model::{compare_values, EntityDescriptor, KeyTuple, Record};
use crate::query::{Direction, QuerySpec};
use crate::store::RecordStore;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    rows: Vec<Record>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records for an entity.
    pub async fn len(&self, entity: &str) -> usize {
        self.tables.read().await.get(entity).map_or(0, |t| t.rows.len())
    }
}

/// SQL semantics: a null column never collides.
fn same_values(a: &Record, b: &Record, columns: &[String]) -> bool {
    columns.iter().all(|c| match (a.get(c), b.get(c)) {
        (Some(x), Some(y)) => !x.is_null() && x == y,
        _ => false,
    })
}

fn check_unique(entity: &EntityDescriptor, rows: &[Record], candidate: &Record, skip: Option<usize>) -> Result<(), StoreError> {
    for (i, row) in rows.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        if same_values(row, candidate, entity.primary_key()) {
            return Err(StoreError::Conflict(format!(
                "duplicate primary key for {}: {}",
                entity.name(),
                KeyTuple::from_record(entity, candidate)
            )));
        }
        for index in entity.unique() {
            if same_values(row, candidate, index) {
                return Err(StoreError::Conflict(format!(
                    "unique index ({}) violated on {}",
                    index.join(", "),
                    entity.name()
                )));
            }
        }
    }
    Ok(())
}

fn compare_rows(a: &Record, b: &Record, query: &QuerySpec) -> Ordering {
    for term in &query.order_by {
        let null = Value::Null;
        let ord = compare_values(a.get(&term.field).unwrap_or(&null), b.get(&term.field).unwrap_or(&null));
        let ord = match term.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, entity: &EntityDescriptor, query: &QuerySpec) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(entity.name()) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<&Record> = table
            .rows
            .iter()
            .filter(|r| query.predicate.as_ref().map_or(true, |p| p.matches(r)))
            .collect();
        // stable: equal rows keep insertion order
        rows.sort_by(|a, b| compare_rows(a, b, query));
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn get(&self, entity: &EntityDescriptor, key: &KeyTuple) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(entity.name())
            .and_then(|t| t.rows.iter().find(|r| key.matches(r)))
            .cloned())
    }

    async fn insert(&self, entity: &EntityDescriptor, mut values: Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.name().to_string()).or_default();
        let auto = entity.autoincrement_field();
        let assigned = table.next_id + 1;
        if let Some(f) = auto {
            values.insert(f.name.clone(), Value::from(assigned));
        }
        let row: Record = entity
            .fields()
            .iter()
            .map(|f| (f.name.clone(), values.get(&f.name).cloned().unwrap_or(Value::Null)))
            .collect();
        check_unique(entity, &table.rows, &row, None)?;
        if auto.is_some() {
            table.next_id = assigned;
        }
        table.rows.push(row.clone());
        tracing::debug!(entity = %entity.name(), key = %KeyTuple::from_record(entity, &row), "memory insert");
        Ok(row)
    }

    async fn update(
        &self,
        entity: &EntityDescriptor,
        key: &KeyTuple,
        values: Record,
    ) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(entity.name()) else {
            return Ok(None);
        };
        let Some(idx) = table.rows.iter().position(|r| key.matches(r)) else {
            return Ok(None);
        };
        let mut merged = table.rows[idx].clone();
        for (k, v) in values {
            if entity.field(&k).is_some() {
                merged.insert(k, v);
            }
        }
        check_unique(entity, &table.rows, &merged, Some(idx))?;
        table.rows[idx] = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, entity: &EntityDescriptor, key: &KeyTuple) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(entity.name()) else {
            return Ok(false);
        };
        match table.rows.iter().position(|r| key.matches(r)) {
            Some(idx) => {
                table.rows.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

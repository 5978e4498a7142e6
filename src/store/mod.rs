//! Record store seam: the persistence capability the CRUD handlers consume.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::StoreError;
use crate::model::{EntityDescriptor, KeyTuple, Record};
use crate::query::QuerySpec;
use async_trait::async_trait;

/// Storage for every registered entity. Implementations own transactions,
/// key assignment and uniqueness; the engine never caches records.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Predicate, then order, then offset/limit over the entity's collection.
    /// Ties keep the store's natural order.
    async fn list(&self, entity: &EntityDescriptor, query: &QuerySpec) -> Result<Vec<Record>, StoreError>;

    async fn get(&self, entity: &EntityDescriptor, key: &KeyTuple) -> Result<Option<Record>, StoreError>;

    /// Inserts `values` (absent fields become null) and returns the stored
    /// record including any store-assigned key. Uniqueness violations are
    /// [`StoreError::Conflict`].
    async fn insert(&self, entity: &EntityDescriptor, values: Record) -> Result<Record, StoreError>;

    /// Overwrites the given fields of an existing record. `None` when no record has `key`.
    async fn update(
        &self,
        entity: &EntityDescriptor,
        key: &KeyTuple,
        values: Record,
    ) -> Result<Option<Record>, StoreError>;

    /// `false` when no record has `key`.
    async fn delete(&self, entity: &EntityDescriptor, key: &KeyTuple) -> Result<bool, StoreError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//! In-memory record store.

use parking_lot::RwLock;

use passbook_core::store::{Record, RecordStore, StoreResult};

use crate::collections::Collections;

/// Process-local [`RecordStore`]. The reference backend for tests and
/// single-node deployments; writes are serialised by the lock, so it
/// never reports a write conflict on `put`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Record>> {
        Ok(self.inner.read().get_all(collection))
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Record>> {
        Ok(self.inner.read().find_one(collection, field, value))
    }

    async fn insert(&self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        self.inner.write().insert(collection, key, record)
    }

    async fn put(&self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        self.inner.write().put(collection, key, record);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.inner.write().delete(collection, key)
    }

    async fn increment_field(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        self.inner.write().increment(collection, key, field, delta)
    }
}

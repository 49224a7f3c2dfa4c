//! Local JSON file backend with version-checked writes.
//!
//! The whole database is one JSON document `{version, collections}`.
//! Every mutation loads the document, applies the change, and writes it
//! back via temp-file-and-rename — but only after re-reading the on-disk
//! version and confirming it still matches what was loaded. A mismatch
//! means another process wrote in between and surfaces as
//! [`StoreError::Conflict`] for the caller to retry. An in-process mutex
//! serialises local writers; cross-process races are detected, not
//! prevented.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use passbook_core::store::{Record, RecordStore, StoreError, StoreResult};

use crate::collections::Collections;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u64,
    collections: Collections,
}

/// [`RecordStore`] over a single JSON file on local disk.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> StoreResult<Snapshot> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Corrupt(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(e) => Err(StoreError::Unavailable(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Write `snapshot` back, refusing if the on-disk version no longer
    /// matches `expected_version`.
    async fn save(&self, snapshot: &Snapshot, expected_version: u64) -> StoreResult<()> {
        let current = self.load().await?;
        if current.version != expected_version {
            tracing::debug!(
                on_disk = current.version,
                expected = expected_version,
                "version check failed"
            );
            return Err(StoreError::Conflict(format!(
                "database file changed underneath writer (version {} != {})",
                current.version, expected_version
            )));
        }

        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Corrupt(format!("encode snapshot: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::Unavailable(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("rename {}: {e}", tmp.display())))
    }

    async fn mutate<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Collections) -> StoreResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.load().await?;
        let expected = snapshot.version;
        apply(&mut snapshot.collections)?;
        snapshot.version += 1;
        self.save(&snapshot, expected).await
    }
}

impl RecordStore for JsonFileStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Record>> {
        Ok(self.load().await?.collections.get_all(collection))
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Record>> {
        Ok(self.load().await?.collections.find_one(collection, field, value))
    }

    async fn insert(&self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        self.mutate(|collections| collections.insert(collection, key, record))
            .await
    }

    async fn put(&self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        self.mutate(|collections| {
            collections.put(collection, key, record);
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.mutate(|collections| collections.delete(collection, key))
            .await
    }

    async fn increment_field(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        self.mutate(|collections| collections.increment(collection, key, field, delta))
            .await
    }
}

//! In-document collection operations shared by all backends.

use std::collections::BTreeMap;

use passbook_core::store::{Record, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every collection of one logical database, keyed by collection name and
/// then record key. `BTreeMap` keeps scan order backend-stable so
/// `find_one` always returns the same record for the same data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Collections(pub(crate) BTreeMap<String, BTreeMap<String, Record>>);

impl Collections {
    pub(crate) fn get_all(&self, collection: &str) -> Vec<Record> {
        self.0
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn find_one(&self, collection: &str, field: &str, value: &str) -> Option<Record> {
        self.0.get(collection).and_then(|records| {
            records
                .values()
                .find(|record| record.get(field).and_then(Value::as_str) == Some(value))
                .cloned()
        })
    }

    pub(crate) fn insert(&mut self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        let records = self.0.entry(collection.to_string()).or_default();
        if records.contains_key(key) {
            return Err(StoreError::Conflict(format!(
                "key {key} already exists in {collection}"
            )));
        }
        records.insert(key.to_string(), record);
        Ok(())
    }

    pub(crate) fn put(&mut self, collection: &str, key: &str, record: Record) {
        self.0
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), record);
    }

    pub(crate) fn delete(&mut self, collection: &str, key: &str) -> StoreResult<()> {
        let removed = self
            .0
            .get_mut(collection)
            .and_then(|records| records.remove(key));
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            }),
        }
    }

    pub(crate) fn increment(
        &mut self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        let record = self
            .0
            .get_mut(collection)
            .and_then(|records| records.get_mut(key))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                key: key.to_string(),
            })?;

        let current = match record.get(field) {
            None => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                StoreError::Corrupt(format!("field {field} of {collection}/{key} is not numeric"))
            })?,
        };
        record.insert(field.to_string(), Value::from(current + delta));
        Ok(())
    }
}

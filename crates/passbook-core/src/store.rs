//! Record store contract.
//!
//! A record store persists JSON records grouped into named collections.
//! Backends range from an in-memory map to a single JSON document held by
//! a remote host that only offers compare-and-swap on a revision token, so
//! the contract is deliberately small: equality scans, keyed writes, and a
//! distinguishable conflict error the caller can retry on.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::PassbookError;

/// One persisted record: a JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Store-layer error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("record not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    /// The write lost to a concurrent writer (stale revision token) or
    /// the key already existed on an insert. The caller must re-run the
    /// whole read-check-write sequence, not just the write.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for PassbookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => PassbookError::BackendUnavailable(msg),
            StoreError::NotFound { collection, key } => PassbookError::NotFound {
                entity: "record".into(),
                id: format!("{collection}/{key}"),
            },
            StoreError::Conflict(msg) => PassbookError::Conflict { message: msg },
            StoreError::Corrupt(msg) => PassbookError::CorruptRecord(msg),
        }
    }
}

/// Keyed, pluggable record persistence.
///
/// All operations are async. `find_one` is an equality scan returning the
/// first match in backend-stable order; zero matches is a normal outcome,
/// not an error. Mutations on document-shaped backends are read-modify-write
/// of the whole document and may fail with [`StoreError::Conflict`].
pub trait RecordStore: Send + Sync {
    fn get_all(&self, collection: &str) -> impl Future<Output = StoreResult<Vec<Record>>> + Send;

    fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = StoreResult<Option<Record>>> + Send;

    /// Create-only write: fails with [`StoreError::Conflict`] if the key
    /// already exists.
    fn insert(
        &self,
        collection: &str,
        key: &str,
        record: Record,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Upsert.
    fn put(
        &self,
        collection: &str,
        key: &str,
        record: Record,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete(&self, collection: &str, key: &str) -> impl Future<Output = StoreResult<()>> + Send;

    /// Add `delta` to a numeric field. A missing field counts as zero;
    /// a non-numeric field is a corrupt record.
    fn increment_field(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Serialize a model into a stored record.
pub fn to_record<T: Serialize>(value: &T) -> StoreResult<Record> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Corrupt("record is not a JSON object".into())),
        Err(e) => Err(StoreError::Corrupt(format!("serialize record: {e}"))),
    }
}

/// Decode a stored record back into a model.
pub fn from_record<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    serde_json::from_value(serde_json::Value::Object(record))
        .map_err(|e| StoreError::Corrupt(format!("decode record: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::Account;
    use chrono::Utc;

    #[test]
    fn record_round_trip() {
        let account = Account {
            uid: "u".repeat(28),
            email: "alice@example.com".into(),
            credential: "$argon2id$fake".into(),
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        };

        let record = to_record(&account).unwrap();
        assert_eq!(
            record.get("email").and_then(|v| v.as_str()),
            Some("alice@example.com")
        );

        let decoded: Account = from_record(record).unwrap();
        assert_eq!(decoded.uid, account.uid);
        assert_eq!(decoded.email, account.email);
    }

    #[test]
    fn malformed_record_is_corrupt() {
        let mut record = Record::new();
        record.insert("email".into(), serde_json::json!(42));

        let result: StoreResult<Account> = from_record(record);
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn store_errors_map_into_core_taxonomy() {
        let err: PassbookError = StoreError::Conflict("stale revision".into()).into();
        assert!(matches!(err, PassbookError::Conflict { .. }));

        let err: PassbookError = StoreError::Unavailable("timeout".into()).into();
        assert!(matches!(err, PassbookError::BackendUnavailable(_)));
    }
}

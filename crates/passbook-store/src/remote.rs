//! Remote versioned-document backend.
//!
//! The file-over-remote-host pattern: the whole database is one JSON
//! document held by an HTTP host that returns a revision token on read
//! and rejects writes carrying a stale token (HTTP 409). Every mutation
//! is fetch → apply → conditional write; a rejected write surfaces as
//! [`StoreError::Conflict`] and the caller owns the retry. Without a
//! backend-native transaction this can narrow the lost-update window but
//! never fully close it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use passbook_core::store::{Record, RecordStore, StoreError, StoreResult};

use crate::collections::Collections;

/// Configuration for the remote document host.
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    /// Base URL of the document host, e.g. `https://host.example/v1/db/main`.
    pub base_url: String,
    /// Optional bearer token.
    pub token: Option<String>,
    /// Per-request timeout. Timeouts surface as `Unavailable`, never hang
    /// the request.
    pub timeout: Duration,
}

impl RemoteStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    revision: String,
    content: Collections,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    /// `None` on first write, when the document does not exist yet.
    revision: Option<&'a str>,
    content: &'a Collections,
}

/// [`RecordStore`] over a remote versioned document.
pub struct RemoteDocumentStore {
    http: reqwest::Client,
    config: RemoteStoreConfig,
    write_lock: Mutex<()>,
}

impl RemoteDocumentStore {
    pub fn new(config: RemoteStoreConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            config,
            write_lock: Mutex::new(()),
        })
    }

    fn document_url(&self) -> String {
        format!("{}/document", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch(&self) -> StoreResult<(Option<String>, Collections)> {
        let response = self
            .authorize(self.http.get(self.document_url()))
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Ok((None, Collections::default())),
            status if status.is_success() => {
                let body: FetchResponse = response.json().await.map_err(|e| {
                    StoreError::Corrupt(format!("decode document: {e}"))
                })?;
                Ok((Some(body.revision), body.content))
            }
            status => Err(StoreError::Unavailable(format!(
                "document fetch returned {status}"
            ))),
        }
    }

    async fn write(&self, revision: Option<&str>, content: &Collections) -> StoreResult<()> {
        let response = self
            .authorize(self.http.put(self.document_url()))
            .json(&WriteRequest { revision, content })
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            reqwest::StatusCode::CONFLICT => {
                tracing::debug!(revision = ?revision, "write rejected as stale");
                Err(StoreError::Conflict(
                    "document changed underneath writer (stale revision)".into(),
                ))
            }
            status if status.is_success() => Ok(()),
            status => Err(StoreError::Unavailable(format!(
                "document write returned {status}"
            ))),
        }
    }

    async fn mutate<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Collections) -> StoreResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let (revision, mut collections) = self.fetch().await?;
        apply(&mut collections)?;
        self.write(revision.as_deref(), &collections).await
    }
}

fn request_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Unavailable("request timed out".into())
    } else if err.is_decode() {
        StoreError::Corrupt(format!("decode response: {err}"))
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

impl RecordStore for RemoteDocumentStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Record>> {
        let (_, collections) = self.fetch().await?;
        Ok(collections.get_all(collection))
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Record>> {
        let (_, collections) = self.fetch().await?;
        Ok(collections.find_one(collection, field, value))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_url_ignores_trailing_slash() {
        let store =
            RemoteDocumentStore::new(RemoteStoreConfig::new("https://host.example/v1/db/")).unwrap();
        assert_eq!(store.document_url(), "https://host.example/v1/db/document");
    }

    #[test]
    fn write_request_shape() {
        let collections = Collections::default();
        let body = serde_json::to_value(WriteRequest {
            revision: Some("abc123"),
            content: &collections,
        })
        .unwrap();

        assert_eq!(body["revision"], "abc123");
        assert!(body["content"].is_object());
    }

    #[test]
    fn first_write_carries_null_revision() {
        let collections = Collections::default();
        let body = serde_json::to_value(WriteRequest {
            revision: None,
            content: &collections,
        })
        .unwrap();

        assert!(body["revision"].is_null());
    }
}

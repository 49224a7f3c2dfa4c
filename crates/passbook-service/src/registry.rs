//! Domain registry — tenant records and API-key gating.

use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;

use passbook_core::models::domain::{CreatedDomain, Domain};
use passbook_core::store::{self, RecordStore, StoreError};
use passbook_core::{PassbookError, PassbookResult, id, validate};

use crate::config::ServiceConfig;

/// Collection holding one record per domain, keyed by domain name.
pub const DOMAINS_COLLECTION: &str = "domains";

/// Manages tenant domain records. Every per-domain account operation goes
/// through [`DomainRegistry::validate`] before touching account data.
pub struct DomainRegistry<S> {
    store: Arc<S>,
    config: ServiceConfig,
}

impl<S: RecordStore> DomainRegistry<S> {
    pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Create a new domain and return its API key — the only time the key
    /// is ever disclosed.
    ///
    /// A store conflict on the document backends may be a stale-revision
    /// race with an unrelated writer rather than a duplicate name, so the
    /// whole read-check-write sequence is re-run like the account
    /// operations; only the re-check decides "already exists".
    pub async fn create_domain(&self, name: &str) -> PassbookResult<CreatedDomain> {
        if !validate::is_valid_domain_name(name) {
            return Err(PassbookError::InvalidInput {
                message: "domain name must match [A-Za-z0-9_-]+".into(),
            });
        }

        let mut attempt = 1;
        loop {
            if self
                .store
                .find_one(DOMAINS_COLLECTION, "name", name)
                .await?
                .is_some()
            {
                return Err(PassbookError::Conflict {
                    message: format!("domain {name} already exists"),
                });
            }

            let domain = Domain {
                name: name.to_string(),
                api_key: id::generate_api_key(),
                created_at: Utc::now(),
                user_count: 0,
            };
            let record = store::to_record(&domain)?;

            match self.store.insert(DOMAINS_COLLECTION, name, record).await {
                Ok(()) => {
                    tracing::info!(domain = name, "domain created");
                    return Ok(CreatedDomain {
                        name: domain.name,
                        api_key: domain.api_key,
                    });
                }
                Err(StoreError::Conflict(reason)) if attempt < self.config.max_write_attempts => {
                    tracing::debug!(
                        reason,
                        attempt,
                        operation = "create_domain",
                        "write conflict, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Check that `name` exists and `api_key` matches its stored key.
    pub async fn validate(&self, name: &str, api_key: &str) -> PassbookResult<Domain> {
        let record = self
            .store
            .find_one(DOMAINS_COLLECTION, "name", name)
            .await?
            .ok_or_else(|| PassbookError::NotFound {
                entity: "domain".into(),
                id: name.to_string(),
            })?;
        let domain: Domain = store::from_record(record)?;

        // Constant-time comparison; the key is a bearer secret.
        if domain
            .api_key
            .as_bytes()
            .ct_eq(api_key.as_bytes())
            .unwrap_u8()
            == 0
        {
            return Err(PassbookError::Unauthorized {
                reason: "invalid API key".into(),
            });
        }
        Ok(domain)
    }

    /// Best-effort adjustment of the advisory `user_count` counter.
    /// Failure is logged and never propagated; the counter may drift.
    pub async fn adjust_user_count(&self, name: &str, delta: i64) {
        if let Err(err) = self
            .store
            .increment_field(DOMAINS_COLLECTION, name, "user_count", delta)
            .await
        {
            tracing::warn!(domain = name, error = %err, "user_count update failed");
        }
    }
}

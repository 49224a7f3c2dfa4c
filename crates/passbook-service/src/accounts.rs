//! Account operations — create, sign-in, delete, resets, list.
//!
//! Every mutating operation runs as read → check → write. When the store
//! reports a write conflict the whole sequence is re-run from the read
//! (bounded by [`ServiceConfig::max_write_attempts`]), because the data
//! the checks were made against is stale. Two concurrent creates for the
//! same email remain a known race on backends without a native unique
//! index; the conflict-retry narrows the window but cannot close it.

use std::sync::Arc;

use chrono::Utc;

use passbook_core::models::account::{Account, AccountSummary, CreatedAccount};
use passbook_core::store::{self, RecordStore, StoreError};
use passbook_core::{PassbookError, PassbookResult, id, validate};

use crate::config::ServiceConfig;
use crate::password;
use crate::registry::DomainRegistry;

/// Collection used by single-tenant deployments.
pub const GLOBAL_USERS_COLLECTION: &str = "users";

fn users_collection(domain: &str) -> String {
    format!("domains/{domain}/users")
}

/// Which account collection an operation targets.
///
/// `Global` is the single-tenant mode with one implicit collection and no
/// key gating; `Domain` is validated against the registry first.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Global,
    Domain { name: &'a str, api_key: &'a str },
}

/// The account CRUD+auth operations, generic over the record store
/// backend selected at construction.
pub struct AccountService<S> {
    store: Arc<S>,
    registry: DomainRegistry<S>,
    config: ServiceConfig,
}

impl<S: RecordStore> AccountService<S> {
    pub fn new(store: Arc<S>, config: ServiceConfig) -> Self {
        let registry = DomainRegistry::new(store.clone(), config.clone());
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &DomainRegistry<S> {
        &self.registry
    }

    /// Resolve a scope to its account collection, gating domain scopes
    /// through the registry.
    async fn resolve(&self, scope: Scope<'_>) -> PassbookResult<(String, Option<String>)> {
        match scope {
            Scope::Global => Ok((GLOBAL_USERS_COLLECTION.to_string(), None)),
            Scope::Domain { name, api_key } => {
                let domain = self.registry.validate(name, api_key).await?;
                Ok((users_collection(&domain.name), Some(domain.name)))
            }
        }
    }

    async fn find_account(&self, collection: &str, email: &str) -> PassbookResult<Option<Account>> {
        match self.store.find_one(collection, "email", email).await? {
            Some(record) => Ok(Some(store::from_record(record)?)),
            None => Ok(None),
        }
    }

    fn account_not_found(email: &str) -> PassbookError {
        PassbookError::NotFound {
            entity: "account".into(),
            id: email.to_string(),
        }
    }

    async fn conflict_backoff(&self, reason: &str, attempt: u32, operation: &str) {
        tracing::debug!(reason, attempt, operation, "write conflict, retrying");
        tokio::time::sleep(self.config.retry_backoff).await;
    }

    /// Create an account. Fails if the email is malformed or already
    /// registered in the scoped collection.
    pub async fn create(
        &self,
        scope: Scope<'_>,
        email: &str,
        passwd: &str,
    ) -> PassbookResult<CreatedAccount> {
        if !validate::is_valid_email(email) {
            return Err(PassbookError::InvalidInput {
                message: "invalid email format".into(),
            });
        }
        let (collection, domain) = self.resolve(scope).await?;
        let credential = password::hash_password(passwd, self.config.pepper.as_deref())?;

        let mut attempt = 1;
        let account = loop {
            if self.find_account(&collection, email).await?.is_some() {
                return Err(PassbookError::Conflict {
                    message: "email already registered".into(),
                });
            }

            let account = Account {
                uid: id::generate_uid(),
                email: email.to_string(),
                credential: credential.clone(),
                created_at: Utc::now(),
                updated_at: None,
                last_login: None,
            };
            let record = store::to_record(&account)?;
            match self.store.insert(&collection, &account.uid, record).await {
                Ok(()) => break account,
                Err(StoreError::Conflict(reason)) if attempt < self.config.max_write_attempts => {
                    self.conflict_backoff(&reason, attempt, "create").await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(name) = domain.as_deref() {
            self.registry.adjust_user_count(name, 1).await;
        }
        tracing::info!(uid = %account.uid, "account created");
        Ok(CreatedAccount {
            uid: account.uid,
            email: account.email,
        })
    }

    /// Check credentials and stamp `last_login`.
    pub async fn sign_in(
        &self,
        scope: Scope<'_>,
        email: &str,
        passwd: &str,
    ) -> PassbookResult<AccountSummary> {
        let (collection, _) = self.resolve(scope).await?;

        let mut attempt = 1;
        loop {
            let mut account = self
                .find_account(&collection, email)
                .await?
                .ok_or_else(|| Self::account_not_found(email))?;

            let valid = password::verify_password(
                passwd,
                &account.credential,
                self.config.pepper.as_deref(),
            )?;
            if !valid {
                return Err(PassbookError::Unauthorized {
                    reason: "wrong password".into(),
                });
            }

            account.last_login = Some(Utc::now());
            let record = store::to_record(&account)?;
            match self.store.put(&collection, &account.uid, record).await {
                Ok(()) => {
                    tracing::info!(uid = %account.uid, "sign-in");
                    return Ok(account.into());
                }
                Err(StoreError::Conflict(reason)) if attempt < self.config.max_write_attempts => {
                    self.conflict_backoff(&reason, attempt, "sign_in").await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Remove an account after the same lookup and password check as
    /// sign-in.
    pub async fn delete(&self, scope: Scope<'_>, email: &str, passwd: &str) -> PassbookResult<()> {
        let (collection, domain) = self.resolve(scope).await?;

        let mut attempt = 1;
        loop {
            let account = self
                .find_account(&collection, email)
                .await?
                .ok_or_else(|| Self::account_not_found(email))?;

            let valid = password::verify_password(
                passwd,
                &account.credential,
                self.config.pepper.as_deref(),
            )?;
            if !valid {
                return Err(PassbookError::Unauthorized {
                    reason: "wrong password".into(),
                });
            }

            match self.store.delete(&collection, &account.uid).await {
                Ok(()) => {
                    if let Some(name) = domain.as_deref() {
                        self.registry.adjust_user_count(name, -1).await;
                    }
                    tracing::info!(uid = %account.uid, "account deleted");
                    return Ok(());
                }
                // Lost a race with a concurrent delete.
                Err(StoreError::NotFound { .. }) => return Err(Self::account_not_found(email)),
                Err(StoreError::Conflict(reason)) if attempt < self.config.max_write_attempts => {
                    self.conflict_backoff(&reason, attempt, "delete").await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Overwrite the credential for `email`.
    ///
    /// Deliberately performs no current-password check; this preserves
    /// the observed contract of the system being replaced.
    pub async fn reset_password(
        &self,
        scope: Scope<'_>,
        email: &str,
        new_password: &str,
    ) -> PassbookResult<()> {
        let (collection, _) = self.resolve(scope).await?;
        let credential = password::hash_password(new_password, self.config.pepper.as_deref())?;

        let mut attempt = 1;
        loop {
            let mut account = self
                .find_account(&collection, email)
                .await?
                .ok_or_else(|| Self::account_not_found(email))?;

            account.credential = credential.clone();
            account.updated_at = Some(Utc::now());
            let record = store::to_record(&account)?;
            match self.store.put(&collection, &account.uid, record).await {
                Ok(()) => {
                    tracing::info!(uid = %account.uid, "password reset");
                    return Ok(());
                }
                Err(StoreError::Conflict(reason)) if attempt < self.config.max_write_attempts => {
                    self.conflict_backoff(&reason, attempt, "reset_password").await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Change the email on an account, enforcing in-domain uniqueness of
    /// the new address.
    pub async fn reset_email(
        &self,
        scope: Scope<'_>,
        old_email: &str,
        new_email: &str,
    ) -> PassbookResult<()> {
        if !validate::is_valid_email(new_email) {
            return Err(PassbookError::InvalidInput {
                message: "invalid email format".into(),
            });
        }
        let (collection, _) = self.resolve(scope).await?;

        let mut attempt = 1;
        loop {
            if self.find_account(&collection, new_email).await?.is_some() {
                return Err(PassbookError::Conflict {
                    message: "email already registered".into(),
                });
            }
            let mut account = self
                .find_account(&collection, old_email)
                .await?
                .ok_or_else(|| Self::account_not_found(old_email))?;

            account.email = new_email.to_string();
            account.updated_at = Some(Utc::now());
            let record = store::to_record(&account)?;
            match self.store.put(&collection, &account.uid, record).await {
                Ok(()) => {
                    tracing::info!(uid = %account.uid, "email reset");
                    return Ok(());
                }
                Err(StoreError::Conflict(reason)) if attempt < self.config.max_write_attempts => {
                    self.conflict_backoff(&reason, attempt, "reset_email").await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// All accounts in the scoped collection, credentials excluded.
    /// Never mutates any record.
    pub async fn list(&self, scope: Scope<'_>) -> PassbookResult<Vec<AccountSummary>> {
        let (collection, _) = self.resolve(scope).await?;
        let records = self.store.get_all(&collection).await?;
        records
            .into_iter()
            .map(|record| store::from_record::<Account>(record).map(AccountSummary::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}

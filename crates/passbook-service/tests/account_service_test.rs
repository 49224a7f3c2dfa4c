//! Integration tests for the account service against the in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use passbook_core::PassbookError;
use passbook_core::store::{Record, RecordStore, StoreError, StoreResult};
use passbook_service::{AccountService, Scope, ServiceConfig};
use passbook_store::MemoryStore;

fn service() -> AccountService<MemoryStore> {
    let config = ServiceConfig {
        retry_backoff: Duration::from_millis(1),
        ..Default::default()
    };
    AccountService::new(Arc::new(MemoryStore::new()), config)
}

/// Helper: create a domain and return its API key.
async fn create_domain(service: &AccountService<MemoryStore>, name: &str) -> String {
    service
        .registry()
        .create_domain(name)
        .await
        .unwrap()
        .api_key
}

#[tokio::test]
async fn email_unique_per_domain() {
    let service = service();
    let key = create_domain(&service, "shop").await;
    let scope = Scope::Domain {
        name: "shop",
        api_key: &key,
    };

    service.create(scope, "a@b.com", "pw1").await.unwrap();
    let second = service.create(scope, "a@b.com", "pw2").await;
    assert!(matches!(second, Err(PassbookError::Conflict { .. })));

    // The failed create must not have mutated state.
    let users = service.list(scope).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn same_email_allowed_across_domains() {
    let service = service();
    let key_a = create_domain(&service, "domain-a").await;
    let key_b = create_domain(&service, "domain-b").await;

    service
        .create(
            Scope::Domain {
                name: "domain-a",
                api_key: &key_a,
            },
            "alice@example.com",
            "pw-a",
        )
        .await
        .unwrap();
    service
        .create(
            Scope::Domain {
                name: "domain-b",
                api_key: &key_b,
            },
            "alice@example.com",
            "pw-b",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn credential_round_trip() {
    let service = service();
    service
        .create(Scope::Global, "alice@example.com", "correct horse")
        .await
        .unwrap();

    let signed_in = service
        .sign_in(Scope::Global, "alice@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(signed_in.email, "alice@example.com");

    let wrong = service
        .sign_in(Scope::Global, "alice@example.com", "battery staple")
        .await;
    assert!(matches!(wrong, Err(PassbookError::Unauthorized { .. })));
}

#[tokio::test]
async fn wrong_password_leaves_record_untouched() {
    let service = service();
    service
        .create(Scope::Global, "bob@example.com", "pw")
        .await
        .unwrap();

    let _ = service.sign_in(Scope::Global, "bob@example.com", "nope").await;

    let users = service.list(Scope::Global).await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].last_login.is_none());
}

#[tokio::test]
async fn list_is_idempotent() {
    let service = service();
    let key = create_domain(&service, "shop").await;
    let scope = Scope::Domain {
        name: "shop",
        api_key: &key,
    };
    for i in 0..3 {
        service
            .create(scope, &format!("user-{i}@example.com"), "pw")
            .await
            .unwrap();
    }

    let first = service.list(scope).await.unwrap();
    let second = service.list(scope).await.unwrap();
    assert_eq!(first.len(), 3);
    let uids = |users: &[passbook_core::models::account::AccountSummary]| {
        users.iter().map(|u| u.uid.clone()).collect::<Vec<_>>()
    };
    assert_eq!(uids(&first), uids(&second));
}

#[tokio::test]
async fn domain_gating() {
    let service = service();
    let _key = create_domain(&service, "shop").await;

    // Syntactically valid but wrong key.
    let bad_key = "A".repeat(43);
    let wrong_key = service
        .list(Scope::Domain {
            name: "shop",
            api_key: &bad_key,
        })
        .await;
    assert!(matches!(wrong_key, Err(PassbookError::Unauthorized { .. })));

    // Domain that was never created.
    let missing = service
        .list(Scope::Domain {
            name: "never-created",
            api_key: &bad_key,
        })
        .await;
    assert!(matches!(missing, Err(PassbookError::NotFound { .. })));
}

#[tokio::test]
async fn invalid_inputs_rejected() {
    let service = service();

    let bad_email = service.create(Scope::Global, "not-an-email", "pw").await;
    assert!(matches!(bad_email, Err(PassbookError::InvalidInput { .. })));

    let bad_name = service.registry().create_domain("no spaces!").await;
    assert!(matches!(bad_name, Err(PassbookError::InvalidInput { .. })));

    let duplicate = {
        service.registry().create_domain("shop").await.unwrap();
        service.registry().create_domain("shop").await
    };
    assert!(matches!(duplicate, Err(PassbookError::Conflict { .. })));
}

#[tokio::test]
async fn reset_email_flows() {
    let service = service();
    service
        .create(Scope::Global, "old@example.com", "pw")
        .await
        .unwrap();
    service
        .create(Scope::Global, "taken@example.com", "pw")
        .await
        .unwrap();

    let to_taken = service
        .reset_email(Scope::Global, "old@example.com", "taken@example.com")
        .await;
    assert!(matches!(to_taken, Err(PassbookError::Conflict { .. })));

    let from_missing = service
        .reset_email(Scope::Global, "ghost@example.com", "new@example.com")
        .await;
    assert!(matches!(from_missing, Err(PassbookError::NotFound { .. })));

    let malformed = service
        .reset_email(Scope::Global, "old@example.com", "not-an-email")
        .await;
    assert!(matches!(malformed, Err(PassbookError::InvalidInput { .. })));

    service
        .reset_email(Scope::Global, "old@example.com", "new@example.com")
        .await
        .unwrap();
    service
        .sign_in(Scope::Global, "new@example.com", "pw")
        .await
        .unwrap();
}

/// The concrete end-to-end scenario: domain, create, sign-in, wrong
/// password, password reset, delete.
#[tokio::test]
async fn full_account_lifecycle() {
    let service = service();
    let key = create_domain(&service, "shop").await;
    assert_eq!(key.len(), 43);
    let scope = Scope::Domain {
        name: "shop",
        api_key: &key,
    };

    let created = service.create(scope, "a@b.com", "pw1").await.unwrap();
    assert_eq!(created.uid.len(), 28);
    assert!(created.uid.chars().all(|c| c.is_ascii_alphanumeric()));

    let signed_in = service.sign_in(scope, "a@b.com", "pw1").await.unwrap();
    let last_login = signed_in.last_login.expect("last_login set on sign-in");
    assert!(last_login > signed_in.created_at);

    let wrong = service.sign_in(scope, "a@b.com", "wrongpw").await;
    assert!(matches!(wrong, Err(PassbookError::Unauthorized { .. })));

    service.reset_password(scope, "a@b.com", "pw2").await.unwrap();
    assert!(service.sign_in(scope, "a@b.com", "pw1").await.is_err());
    service.sign_in(scope, "a@b.com", "pw2").await.unwrap();

    service.delete(scope, "a@b.com", "pw2").await.unwrap();
    let gone = service.sign_in(scope, "a@b.com", "pw2").await;
    assert!(matches!(gone, Err(PassbookError::NotFound { .. })));
}

#[tokio::test]
async fn delete_requires_password() {
    let service = service();
    service
        .create(Scope::Global, "alice@example.com", "pw")
        .await
        .unwrap();

    let wrong = service.delete(Scope::Global, "alice@example.com", "nope").await;
    assert!(matches!(wrong, Err(PassbookError::Unauthorized { .. })));
    assert_eq!(service.list(Scope::Global).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Conflict retry
// ---------------------------------------------------------------------------

/// Store wrapper that fails the first `conflicts` writes with a conflict,
/// simulating a versioned backend losing races to a concurrent writer.
struct FlakyStore {
    inner: MemoryStore,
    conflicts: AtomicU32,
}

impl FlakyStore {
    fn new(conflicts: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            conflicts: AtomicU32::new(conflicts),
        }
    }

    fn maybe_conflict(&self) -> StoreResult<()> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Conflict("injected stale revision".into()));
        }
        Ok(())
    }
}

impl RecordStore for FlakyStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Record>> {
        self.inner.get_all(collection).await
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Record>> {
        self.inner.find_one(collection, field, value).await
    }

    async fn insert(&self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        self.maybe_conflict()?;
        self.inner.insert(collection, key, record).await
    }

    async fn put(&self, collection: &str, key: &str, record: Record) -> StoreResult<()> {
        self.maybe_conflict()?;
        self.inner.put(collection, key, record).await
    }

    async fn delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        self.maybe_conflict()?;
        self.inner.delete(collection, key).await
    }

    async fn increment_field(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> StoreResult<()> {
        self.inner.increment_field(collection, key, field, delta).await
    }
}

fn flaky_service(conflicts: u32) -> AccountService<FlakyStore> {
    let config = ServiceConfig {
        retry_backoff: Duration::from_millis(1),
        ..Default::default()
    };
    AccountService::new(Arc::new(FlakyStore::new(conflicts)), config)
}

#[tokio::test]
async fn create_retries_through_transient_conflicts() {
    // Two conflicts, three allowed attempts: the create should land.
    let service = flaky_service(2);
    let created = service
        .create(Scope::Global, "alice@example.com", "pw")
        .await
        .unwrap();
    assert_eq!(created.uid.len(), 28);
}

#[tokio::test]
async fn create_domain_retries_through_transient_conflicts() {
    // A stale-revision race on a never-created domain must not be
    // misreported as "already exists"; the re-run create should land.
    let service = flaky_service(1);
    let created = service.registry().create_domain("shop").await.unwrap();
    assert_eq!(created.name, "shop");
    assert_eq!(created.api_key.len(), 43);

    // A genuine duplicate is still a business conflict.
    let duplicate = service.registry().create_domain("shop").await;
    assert!(matches!(duplicate, Err(PassbookError::Conflict { .. })));
}

#[tokio::test]
async fn persistent_conflict_is_surfaced() {
    let service = flaky_service(u32::MAX);
    let result = service.create(Scope::Global, "alice@example.com", "pw").await;
    assert!(matches!(result, Err(PassbookError::Conflict { .. })));
}

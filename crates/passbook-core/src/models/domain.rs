//! Tenant domain model.
//!
//! A domain is a named partition of the account collection with its own
//! bearer secret. The same email may exist in any number of domains
//! independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored domain record.
///
/// `name` is globally unique and immutable. `api_key` is generated at
/// creation, disclosed exactly once, and required on every subsequent
/// per-domain operation. `user_count` is advisory — it may drift and is
/// never used to enforce quota or uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub user_count: i64,
}

/// Returned exactly once, at domain creation time. No other operation
/// discloses the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedDomain {
    pub name: String,
    pub api_key: String,
}

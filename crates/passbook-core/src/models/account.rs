//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored account record.
///
/// `uid` and `email` are each unique within one domain's collection; no
/// invariant holds across domains. `credential` is an Argon2id PHC string
/// and never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub credential: String,
    pub created_at: DateTime<Utc>,
    /// Set by the reset-password and reset-email operations.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set on every successful sign-in.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Client-facing view of an account — everything except the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub uid: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            uid: account.uid,
            email: account.email,
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }
}

/// Result of a successful create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub uid: String,
    pub email: String,
}

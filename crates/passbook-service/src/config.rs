//! Service configuration.

use std::time::Duration;

/// Configuration shared by the account service and domain registry.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum attempts for a mutating operation that keeps hitting write
    /// conflicts before the conflict is surfaced to the caller.
    pub max_write_attempts: u32,
    /// Sleep between conflict retries.
    pub retry_backoff: Duration,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 3,
            retry_backoff: Duration::from_millis(50),
            pepper: None,
        }
    }
}

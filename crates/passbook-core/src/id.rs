//! Identifier and API-key generation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of an account identifier.
pub const UID_LEN: usize = 28;

/// Generate an account identifier: 28 characters drawn uniformly from the
/// 62-character alphanumeric alphabet (~166 bits of entropy).
///
/// Collisions are negligible at this entropy, but callers still treat a
/// duplicate-key insert as a retry signal rather than an impossibility.
pub fn generate_uid() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(UID_LEN)
        .map(char::from)
        .collect()
}

/// Generate a domain API key: 32 random bytes, base64url-encoded without
/// padding (43 characters, 256 bits).
pub fn generate_api_key() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

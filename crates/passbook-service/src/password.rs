//! Password hashing and verification using Argon2id.
//!
//! Argon2id with OWASP-recommended parameters (memory: 19 MiB,
//! iterations: 2, parallelism: 1) and a random per-hash salt. An
//! optional pepper (server-side secret) can be supplied through
//! [`ServiceConfig`](crate::ServiceConfig).

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand::Rng;

use passbook_core::PassbookError;

fn argon2() -> Result<Argon2<'static>, PassbookError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| PassbookError::Internal(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a plaintext password into an Argon2id PHC-format string.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, PassbookError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| PassbookError::Internal(format!("salt encode error: {e}")))?;
    let hash = argon2()?
        .hash_password(input, &salt)
        .map_err(|e| PassbookError::Internal(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or an error if
/// the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, PassbookError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| PassbookError::CorruptRecord(format!("invalid credential format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PassbookError::Internal(format!("verify error: {e}"))),
    }
}

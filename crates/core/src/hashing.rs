//! Salted-hash helpers for one-time codes and account passwords.
//!
//! Verification recomputes the digest and compares the two fixed-length
//! digests, so the comparison leaks nothing about how much of the secret
//! matched (hash-then-compare is timing-safe by construction).

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generates a 32-hex-character random salt.
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Hex SHA-256 of `salt ++ secret`.
pub fn hash_secret(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks `secret` against a stored hex digest for the given salt.
pub fn verify_secret(salt: &str, secret: &str, expected_hex: &str) -> bool {
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize().as_slice() == expected.as_slice()
}

/// Encodes a password as `<salt>$<hash>` for the `app_user.password_hash`
/// column.
pub fn make_password(raw: &str) -> String {
    let salt = generate_salt();
    let digest = hash_secret(&salt, raw);
    format!("{salt}${digest}")
}

/// Checks a raw password against a stored `<salt>$<hash>` value.
pub fn check_password(raw: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => verify_secret(salt, raw, digest),
        None => false,
    }
}

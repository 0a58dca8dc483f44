//! OTP generation and storage.
//!
//! DESIGN
//! ======
//! Codes are plain uniform decimal digits held in the session-scoped store
//! under `otp_<phone>`, one live code per phone number (a new code simply
//! overwrites the old). This stands in for a backend that would send and
//! verify codes over SMS; nothing here is cryptographic, and verification is
//! exact string equality with no normalization.

use rand::Rng;

use crate::storage::{KvStore, StorageError};

/// Verification code length used by the auth flow.
pub const OTP_LEN: usize = 6;

fn otp_key(phone: &str) -> String {
    format!("otp_{phone}")
}

/// Generate a code of `length` independently uniform decimal digits.
/// Leading zeros are allowed.
#[must_use]
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Store `code` for `phone`, replacing any previous code.
///
/// # Errors
///
/// Returns an error if the store cannot persist the write.
pub fn store_otp(store: &mut KvStore, phone: &str, code: &str) -> Result<(), StorageError> {
    store.set(&otp_key(phone), code)
}

/// Return the live code for `phone`, if any.
#[must_use]
pub fn retrieve_otp(store: &KvStore, phone: &str) -> Option<String> {
    store.get(&otp_key(phone)).map(str::to_owned)
}

/// Delete the code for `phone`. Idempotent.
///
/// # Errors
///
/// Returns an error if the store cannot persist the removal.
pub fn clear_otp(store: &mut KvStore, phone: &str) -> Result<(), StorageError> {
    store.remove(&otp_key(phone))
}

/// Exact string comparison — no trimming, no case folding.
#[must_use]
pub fn verify_otp(submitted: &str, expected: &str) -> bool {
    submitted == expected
}

#[cfg(test)]
#[path = "otp_test.rs"]
mod tests;

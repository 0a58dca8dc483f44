//! User profile store.
//!
//! DESIGN
//! ======
//! Registered users live as one JSON array under the `users` key in the
//! app-lifetime store, uniquely keyed by phone number. Every operation is a
//! read-modify-write of the whole blob; `AppState`'s lock around the store
//! keeps that cycle atomic. Profiles are created on first verified signup,
//! overwritten by a later signup for the same phone, and never deleted.

use serde::{Deserialize, Serialize};

use crate::storage::{KvStore, StorageError};

/// Storage key for the profile collection.
pub const USERS_KEY: &str = "users";

/// Errors from profile store operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("profile serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Marketplace side of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Farmer,
    Buyer,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Buyer => "buyer",
        }
    }

    /// Parse the stored string form. Anything but the two known roles is
    /// `None` — there is deliberately no empty-string sentinel variant.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "farmer" => Some(Self::Farmer),
            "buyer" => Some(Self::Buyer),
            _ => None,
        }
    }
}

/// A registered user's durable identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub phone_number: String,
    pub full_name: String,
    pub state: String,
    pub city: String,
    pub role: UserRole,
    /// Unix milliseconds at creation time.
    pub created_at: i64,
}

/// Current wall-clock time as unix milliseconds.
#[must_use]
pub fn now_unix_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub(crate) fn load_all(store: &KvStore) -> Result<Vec<UserProfile>, ProfileError> {
    match store.get(USERS_KEY) {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Vec::new()),
    }
}

/// Linear scan of the collection by phone number equality.
///
/// # Errors
///
/// Returns an error if the stored blob cannot be parsed.
pub fn find_profile(store: &KvStore, phone: &str) -> Result<Option<UserProfile>, ProfileError> {
    Ok(load_all(store)?.into_iter().find(|p| p.phone_number == phone))
}

/// Replace the entry whose phone number matches, or append if none does,
/// then persist the whole collection.
///
/// # Errors
///
/// Returns an error if the blob cannot be parsed, re-serialized, or written.
pub fn upsert_profile(store: &mut KvStore, profile: &UserProfile) -> Result<(), ProfileError> {
    let mut profiles = load_all(store)?;
    match profiles.iter_mut().find(|p| p.phone_number == profile.phone_number) {
        Some(existing) => *existing = profile.clone(),
        None => profiles.push(profile.clone()),
    }
    store.set(USERS_KEY, &serde_json::to_string(&profiles)?)?;
    Ok(())
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;

//! Session draft store.
//!
//! In-progress auth form input is cached field-by-field in the
//! session-scoped store so the multi-step login/signup/OTP flow survives a
//! reload mid-way. Purely a convenience cache — never a credential — and
//! cleared wholesale on successful authentication.

use crate::storage::{KvStore, StorageError};

const PHONE_KEY: &str = "auth_phone";
const NAME_KEY: &str = "auth_name";
const STATE_KEY: &str = "auth_state";
const CITY_KEY: &str = "auth_city";
const ROLE_KEY: &str = "auth_role";

const DRAFT_KEYS: [&str; 5] = [PHONE_KEY, NAME_KEY, STATE_KEY, CITY_KEY, ROLE_KEY];

/// One persisted form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Phone,
    Name,
    State,
    City,
    Role,
}

impl DraftField {
    fn key(self) -> &'static str {
        match self {
            Self::Phone => PHONE_KEY,
            Self::Name => NAME_KEY,
            Self::State => STATE_KEY,
            Self::City => CITY_KEY,
            Self::Role => ROLE_KEY,
        }
    }
}

/// Everything the user has typed so far, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthDraft {
    pub phone_number: Option<String>,
    pub full_name: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub role: Option<String>,
}

/// Persist a single field as the user types it.
///
/// # Errors
///
/// Returns an error if the store cannot persist the write.
pub fn save_draft_field(store: &mut KvStore, field: DraftField, value: &str) -> Result<(), StorageError> {
    store.set(field.key(), value)
}

/// Load whatever draft fields are present.
#[must_use]
pub fn load_draft(store: &KvStore) -> AuthDraft {
    AuthDraft {
        phone_number: store.get(PHONE_KEY).map(str::to_owned),
        full_name: store.get(NAME_KEY).map(str::to_owned),
        state: store.get(STATE_KEY).map(str::to_owned),
        city: store.get(CITY_KEY).map(str::to_owned),
        role: store.get(ROLE_KEY).map(str::to_owned),
    }
}

/// Remove every draft key. Idempotent.
///
/// # Errors
///
/// Returns an error if the store cannot persist a removal.
pub fn clear_draft(store: &mut KvStore) -> Result<(), StorageError> {
    for key in DRAFT_KEYS {
        store.remove(key)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;

//! Session context — the process-wide authenticated identity.
//!
//! ARCHITECTURE
//! ============
//! One `SessionContext` exists for the app's lifetime; screens get a clone of
//! the handle instead of reaching into ambient global state. `init` hydrates
//! from the app-lifetime store, and `login`/`logout` are the only mutators —
//! both mirror their effect to the durable keys so the session survives a
//! restart.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::services::profile::UserRole;
use crate::state::AppState;
use crate::storage::{KvStore, StorageError};

const AUTH_FLAG_KEY: &str = "isAuthenticated";
const ROLE_KEY: &str = "userRole";
const PHONE_KEY: &str = "phoneNumber";
const NAME_KEY: &str = "fullName";
const STATE_KEY: &str = "state";
const CITY_KEY: &str = "city";

const SESSION_KEYS: [&str; 6] = [AUTH_FLAG_KEY, ROLE_KEY, PHONE_KEY, NAME_KEY, STATE_KEY, CITY_KEY];

/// Errors from session context operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A point-in-time copy of the session fields.
///
/// Invariant: `is_authenticated` implies `role.is_some()` and a non-empty
/// `phone_number`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub role: Option<UserRole>,
    pub phone_number: String,
    pub full_name: String,
    pub state: String,
    pub city: String,
}

/// Cloneable handle to the single in-memory session.
#[derive(Clone)]
pub struct SessionContext {
    app: AppState,
    inner: Arc<RwLock<SessionSnapshot>>,
}

impl SessionContext {
    /// Build the context, hydrating from the durable store.
    ///
    /// The session is restored only when the authenticated flag is `"true"`
    /// AND a role parses AND a phone number is present; partially present
    /// keys leave the session unauthenticated.
    pub async fn init(app: AppState) -> Self {
        let snapshot = {
            let local = app.local.read().await;
            hydrate(&local)
        };
        if snapshot.is_authenticated {
            info!(phone = %snapshot.phone_number, "session restored from durable store");
        }
        Self { app, inner: Arc::new(RwLock::new(snapshot)) }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_authenticated
    }

    /// Authenticate the session and mirror it to the durable store.
    ///
    /// Phone and role are always written; name/state/city only when
    /// non-empty (a login flow does not collect them — the fields keep
    /// whatever the store already holds).
    ///
    /// # Errors
    ///
    /// Returns an error if a durable write fails.
    pub async fn login(
        &self,
        phone: &str,
        role: UserRole,
        full_name: &str,
        state: &str,
        city: &str,
    ) -> Result<(), SessionError> {
        {
            let mut local = self.app.local.write().await;
            local.set(AUTH_FLAG_KEY, "true")?;
            local.set(ROLE_KEY, role.as_str())?;
            local.set(PHONE_KEY, phone)?;
            if !full_name.is_empty() {
                local.set(NAME_KEY, full_name)?;
            }
            if !state.is_empty() {
                local.set(STATE_KEY, state)?;
            }
            if !city.is_empty() {
                local.set(CITY_KEY, city)?;
            }
        }

        let mut inner = self.inner.write().await;
        inner.is_authenticated = true;
        inner.role = Some(role);
        inner.phone_number = phone.to_owned();
        if !full_name.is_empty() {
            inner.full_name = full_name.to_owned();
        }
        if !state.is_empty() {
            inner.state = state.to_owned();
        }
        if !city.is_empty() {
            inner.city = city.to_owned();
        }

        info!(%phone, role = role.as_str(), "session authenticated");
        Ok(())
    }

    /// Clear the in-memory session and remove every mirrored durable key.
    ///
    /// # Errors
    ///
    /// Returns an error if a durable removal fails.
    pub async fn logout(&self) -> Result<(), SessionError> {
        {
            let mut local = self.app.local.write().await;
            for key in SESSION_KEYS {
                local.remove(key)?;
            }
        }
        *self.inner.write().await = SessionSnapshot::default();
        info!("session logged out");
        Ok(())
    }
}

fn hydrate(local: &KvStore) -> SessionSnapshot {
    if local.get(AUTH_FLAG_KEY) != Some("true") {
        return SessionSnapshot::default();
    }
    let Some(role) = local.get(ROLE_KEY).and_then(UserRole::parse) else {
        return SessionSnapshot::default();
    };
    let phone = local.get(PHONE_KEY).unwrap_or_default();
    if phone.is_empty() {
        return SessionSnapshot::default();
    }

    SessionSnapshot {
        is_authenticated: true,
        role: Some(role),
        phone_number: phone.to_owned(),
        full_name: local.get(NAME_KEY).unwrap_or_default().to_owned(),
        state: local.get(STATE_KEY).unwrap_or_default().to_owned(),
        city: local.get(CITY_KEY).unwrap_or_default().to_owned(),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is cloned into every service that needs storage. The two
//! `KvStore` scopes sit behind `Arc<RwLock>` so all reads and writes of the
//! profile collection and the OTP records serialize through a single owner —
//! the read-modify-write cycles those stores rely on are atomic by
//! construction, even on a multi-threaded runtime.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::services::scanner::CropAnalyzer;
use crate::storage::KvStore;

/// Shared handles to both storage scopes plus optional capabilities.
/// Clone is cheap — everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// App-lifetime store: profiles and the mirrored session keys.
    pub local: Arc<RwLock<KvStore>>,
    /// Session-lifetime store: OTP records and auth form drafts.
    pub session: Arc<RwLock<KvStore>>,
    /// Optional crop analyzer. `None` if the API key is not configured.
    pub analyzer: Option<Arc<dyn CropAnalyzer>>,
}

impl AppState {
    #[must_use]
    pub fn new(local: KvStore, session: KvStore, analyzer: Option<Arc<dyn CropAnalyzer>>) -> Self {
        Self {
            local: Arc::new(RwLock::new(local)),
            session: Arc::new(RwLock::new(session)),
            analyzer,
        }
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Fully in-memory state for tests: both scopes unbacked, no analyzer.
    #[must_use]
    pub fn in_memory_state() -> AppState {
        AppState::new(KvStore::in_memory(), KvStore::in_memory(), None)
    }
}

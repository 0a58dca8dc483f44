//! Domain services for the marketplace core.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the auth flow's business logic and its persistence
//! concerns so screens stay focused on rendering and input handling. The
//! stores (`otp`, `profile`, `draft`) are free functions over a `KvStore`
//! scope; `auth` and `session` carry the stateful pieces.

pub mod auth;
pub mod draft;
pub mod otp;
pub mod profile;
pub mod scanner;
pub mod session;

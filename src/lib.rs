//! AgriConnect core — the stateful heart of a demo farmer/buyer marketplace.
//!
//! Screens (login, signup, OTP entry, dashboards, the crop scanner) are
//! expected to live elsewhere; this crate provides what they consume: the
//! phone-number auth state machine, the durable profile and OTP stores, the
//! transient signup draft cache, the process-wide session context, and the
//! client for the external crop-analysis service.

pub mod services;
pub mod state;
pub mod storage;

//! Storage backends and the route-guard predicate.
//!
//! Neither module holds session state; both take what they need from the
//! caller or from `AuthState`.

pub mod auth;
pub mod storage;

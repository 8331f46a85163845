//! Networking modules for the authentication service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` holds the service seam and its HTTP client; `types` defines the
//! wire schema and the user record the store keeps.

pub mod api;
pub mod types;

//! # auth-store
//!
//! Client-side authentication state for the web front end.
//!
//! An [`AuthStore`](state::auth::AuthStore) holds the signed-in user and
//! session token, calls the remote auth service for login and registration,
//! mirrors the session into durable key-value storage, and publishes every
//! change to watchers.

pub mod config;
pub mod net;
pub mod state;
pub mod util;

pub use state::auth::{AuthState, AuthStore};

//! Login redirect check for guarded routes.
//!
//! A pure function of `AuthState`, so a router can call it on every
//! snapshot from `AuthStore::subscribe` without touching the store.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::state::auth::AuthState;

/// Path guarded routes send signed-out users to.
pub const LOGIN_PATH: &str = "/login";

/// Whether a guarded route should redirect to [`LOGIN_PATH`].
///
/// Never redirects mid-login so a pending request can settle first.
#[must_use]
pub fn should_redirect_unauth(state: &AuthState) -> bool {
    !state.is_loading && !state.is_authenticated()
}

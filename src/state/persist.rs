//! Persisted auth envelope.
//!
//! The store mirrors `user`, `token` and `isAuthenticated` under
//! [`PERSIST_KEY`](crate::util::storage::PERSIST_KEY) as
//! `{"state": {...}, "version": N}`, the same shape browser sessions already
//! hold. Loading state never leaves memory.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use serde::{Deserialize, Serialize};

use super::auth::AuthState;
use crate::net::types::User;

/// Envelope version written by this build. Other versions are discarded.
pub const PERSIST_VERSION: u32 = 0;

/// Reasons a stored envelope is not applied.
#[derive(Debug, thiserror::Error)]
pub enum RehydrateError {
    #[error("persisted auth state is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("persisted auth state has version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

/// The subset of [`AuthState`] that survives a reload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAuth {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl PersistedAuth {
    /// Overlay the restored session onto `state`. `is_loading` is untouched.
    ///
    /// The authenticated flag is derived from `token`; a stored flag that
    /// disagrees is reported and dropped.
    pub fn apply_to(self, state: &mut AuthState) {
        if self.is_authenticated != self.token.is_some() {
            tracing::warn!(
                stored_flag = self.is_authenticated,
                has_token = self.token.is_some(),
                "persisted isAuthenticated disagrees with token; deriving from token"
            );
        }
        state.user = self.user;
        state.token = self.token;
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    state: PersistedAuth,
    version: u32,
}

/// Select the persisted fields of `state`.
#[must_use]
pub fn partialize(state: &AuthState) -> PersistedAuth {
    PersistedAuth {
        user: state.user.clone(),
        token: state.token.clone(),
        is_authenticated: state.is_authenticated(),
    }
}

/// Serialize the persisted subset of `state` into an envelope string.
///
/// # Errors
///
/// Returns a serde error if the user record cannot be encoded.
pub fn encode(state: &AuthState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope { state: partialize(state), version: PERSIST_VERSION })
}

/// Parse an envelope string written by [`encode`].
///
/// # Errors
///
/// Returns [`RehydrateError`] if the JSON is malformed or was written under a
/// different version.
pub fn decode(raw: &str) -> Result<PersistedAuth, RehydrateError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    if envelope.version != PERSIST_VERSION {
        return Err(RehydrateError::VersionMismatch { found: envelope.version, expected: PERSIST_VERSION });
    }
    Ok(envelope.state)
}

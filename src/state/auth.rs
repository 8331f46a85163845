//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware components to coordinate login
//! redirects and identity-dependent rendering. Consumers obtain an
//! `AuthStore` handle from whoever constructed it and watch it for changes.
//!
//! DESIGN
//! ======
//! Every action funnels through `set`: mutate, write the persisted envelope,
//! then `notify` watchers with the new snapshot, all under the state lock so
//! storage and watchers see mutations in the order they were applied. The
//! lock is never held across an `.await`, so readers see `is_loading` while a
//! login or registration is pending. In-flight actions are not serialized
//! against each other; whichever settles last wins.
//!
//! Storage backends run under that lock and must not call back into the
//! store. `FileStorage` writes block for one small file rewrite.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::persist;
use crate::config::AuthConfig;
use crate::net::api::{AuthService, HttpAuthService};
use crate::net::types::{
    ApiError, LoginRequest, RegisterRequest, Role, User, UserPatch, redact_email,
};
use crate::util::storage::{ACCESS_TOKEN_KEY, PERSIST_KEY, Storage, StorageError, open_storage};

/// Authentication state tracking the current user, token and loading status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// True only while a login or registration call is in flight.
    pub is_loading: bool,
}

impl AuthState {
    /// Signed in exactly when a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Errors building a store from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StoreInitError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// =============================================================================
// STORE
// =============================================================================

/// Shared handle to one authentication state record.
///
/// Cloning is cheap; all clones see and mutate the same state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<AuthState>,
    changes: watch::Sender<AuthState>,
    service: Arc<dyn AuthService>,
    storage: Arc<dyn Storage>,
    hydrated: AtomicBool,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("AuthStore")
            .field("user_id", &state.user.as_ref().map(|u| u.id.as_str()))
            .field("is_authenticated", &state.is_authenticated())
            .field("is_loading", &state.is_loading)
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Create a store and restore any session persisted in `storage`.
    #[must_use]
    pub fn new(service: Arc<dyn AuthService>, storage: Arc<dyn Storage>) -> Self {
        let (changes, _) = watch::channel(AuthState::default());
        let store = Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(AuthState::default()),
                changes,
                service,
                storage,
                hydrated: AtomicBool::new(false),
            }),
        };
        store.rehydrate();
        store
    }

    /// Build the HTTP service and storage backend from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the storage
    /// file cannot be read.
    pub fn from_config(config: &AuthConfig) -> Result<Self, StoreInitError> {
        let service = HttpAuthService::from_config(config)?;
        let storage = open_storage(config.storage_path.as_deref())?;
        tracing::info!(base_url = service.base_url(), "auth store configured");
        Ok(Self::new(Arc::new(service), storage))
    }

    /// Build a store from `AUTH_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or initialization fails.
    pub fn from_env() -> Result<Self, StoreInitError> {
        let config = AuthConfig::from_env()?;
        Self::from_config(&config)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock_state().user.clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.lock_state().token.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock_state().is_authenticated()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock_state().is_loading
    }

    /// Watch for state changes. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.changes.subscribe()
    }

    /// Whether the last rehydration pass has finished.
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        self.inner.hydrated.load(Ordering::Acquire)
    }

    // =========================================================================
    // REMOTE ACTIONS
    // =========================================================================

    /// Sign in with credentials.
    ///
    /// On success the user, token and `accessToken` storage key are set. On
    /// failure only the loading flag changes.
    ///
    /// # Errors
    ///
    /// Returns the auth service's error unchanged.
    pub async fn login(&self, payload: &LoginRequest) -> Result<(), ApiError> {
        tracing::debug!(email = %redact_email(&payload.email), "login started");
        self.set(|state| state.is_loading = true);

        let response = match self.inner.service.login(payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, email = %redact_email(&payload.email), "login failed");
                self.set(|state| state.is_loading = false);
                return Err(e);
            }
        };

        let user = User::from_record(response.user);
        let token = response.access_token;
        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

        self.set(|state| {
            state.user = Some(user);
            state.token = Some(token.clone());
            state.is_loading = false;
        });
        self.write_access_token(&token);
        Ok(())
    }

    /// Create an account and sign it in.
    ///
    /// Unlike [`login`](Self::login), this leaves the `accessToken` storage
    /// key alone; the token only reaches storage inside the persisted
    /// envelope.
    ///
    /// # Errors
    ///
    /// Returns the auth service's error unchanged.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<(), ApiError> {
        tracing::debug!(email = %redact_email(&payload.email), "register started");
        self.set(|state| state.is_loading = true);

        let response = match self.inner.service.register(payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, email = %redact_email(&payload.email), "register failed");
                self.set(|state| state.is_loading = false);
                return Err(e);
            }
        };

        let user = User::from_record(response.user);
        tracing::info!(user_id = %user.id, role = %user.role, "register succeeded");

        self.set(|state| {
            state.user = Some(user);
            state.token = Some(response.token);
            state.is_loading = false;
        });
        Ok(())
    }

    // =========================================================================
    // LOCAL ACTIONS
    // =========================================================================

    /// Sign out locally. The server session is not invalidated.
    pub fn logout(&self) {
        self.remove_access_token();
        self.set(|state| {
            state.user = None;
            state.token = None;
        });
        tracing::info!("logged out");
    }

    /// Install an already-validated session, e.g. from a redirect flow.
    pub fn set_auth(&self, user: User, token: impl Into<String>) {
        let token = token.into();
        self.write_access_token(&token);
        tracing::info!(user_id = %user.id, "session installed");
        self.set(|state| {
            state.user = Some(user);
            state.token = Some(token);
        });
    }

    /// Overlay `patch` onto the current user. No-op when signed out.
    pub fn update_profile(&self, patch: UserPatch) {
        self.set(|state| {
            if let Some(user) = state.user.as_mut() {
                patch.apply_to(user);
            }
        });
    }

    /// Replace the current user's role. No-op when signed out.
    pub fn switch_role(&self, role: Role) {
        self.set(|state| {
            if let Some(user) = state.user.as_mut() {
                user.role = role;
            }
        });
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Re-read the persisted envelope and apply it. `is_loading` is kept.
    ///
    /// Missing, malformed or foreign-version data leaves state as it is.
    pub fn rehydrate(&self) {
        self.inner.hydrated.store(false, Ordering::Release);

        let restored = self
            .inner
            .storage
            .get_item(PERSIST_KEY)
            .and_then(|raw| match persist::decode(&raw) {
                Ok(restored) => Some(restored),
                Err(e) => {
                    tracing::warn!(error = %e, key = PERSIST_KEY, "discarding persisted auth state");
                    None
                }
            });

        if let Some(restored) = restored {
            tracing::debug!(has_token = restored.token.is_some(), "auth state rehydrated");
            self.set(|state| restored.apply_to(state));
        }

        self.inner.hydrated.store(true, Ordering::Release);
    }

    /// Delete the persisted envelope. In-memory state is untouched and the
    /// next action writes it again.
    pub fn clear_storage(&self) {
        if let Err(e) = self.inner.storage.remove_item(PERSIST_KEY) {
            tracing::warn!(error = %e, key = PERSIST_KEY, "clearing persisted auth state failed");
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate, persist, notify. The lock spans all three, so storage and
    /// watchers see mutations in the order they were applied.
    fn set(&self, mutate: impl FnOnce(&mut AuthState)) {
        let mut state = self.lock_state();
        mutate(&mut state);
        self.persist(&state);
        self.notify(state.clone());
    }

    fn persist(&self, state: &AuthState) {
        let raw = match persist::encode(state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "encoding auth state failed");
                return;
            }
        };
        if let Err(e) = self.inner.storage.set_item(PERSIST_KEY, &raw) {
            tracing::warn!(error = %e, key = PERSIST_KEY, "persisting auth state failed");
        }
    }

    fn notify(&self, snapshot: AuthState) {
        self.inner.changes.send_replace(snapshot);
    }

    fn write_access_token(&self, token: &str) {
        if let Err(e) = self.inner.storage.set_item(ACCESS_TOKEN_KEY, token) {
            tracing::warn!(error = %e, key = ACCESS_TOKEN_KEY, "storing access token failed");
        }
    }

    fn remove_access_token(&self) {
        if let Err(e) = self.inner.storage.remove_item(ACCESS_TOKEN_KEY) {
            tracing::warn!(error = %e, key = ACCESS_TOKEN_KEY, "removing access token failed");
        }
    }
}

//! Authentication service client.
//!
//! DESIGN
//! ======
//! `AuthService` is the seam the store talks through; `HttpAuthService` is the
//! reqwest-backed implementation and tests substitute their own. Endpoint
//! formatting and body parsing are pure functions for testability.
//!
//! On wasm32 the service futures are `?Send`: the browser fetch client is
//! single-threaded and its futures never cross threads.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, non-2xx statuses and undecodable bodies each map to a
//! distinct `ApiError` variant. Nothing here retries.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{ApiError, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::config::{AuthConfig, AuthTimeouts};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// Remote authentication operations the store depends on.
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a user record and access token.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails, is rejected, or the
    /// response is malformed.
    async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails, is rejected, or the
    /// response is malformed.
    async fn register(&self, payload: &RegisterRequest) -> Result<RegisterResponse, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// JSON-over-HTTP auth service client.
pub struct HttpAuthService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthService {
    /// Build a client rooted at `base_url` (e.g. `https://example.test/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeouts: AuthTimeouts) -> Result<Self, ApiError> {
        let builder = reqwest::Client::builder();
        // The browser fetch client has no timeout or connect-timeout knobs.
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(std::time::Duration::from_secs(timeouts.request_secs))
            .connect_timeout(std::time::Duration::from_secs(timeouts.connect_secs));
        #[cfg(target_arch = "wasm32")]
        let _ = timeouts;
        let http = builder
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    /// Build a client from parsed store config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ApiError> {
        Self::new(config.api_base_url.clone(), config.timeouts)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint(&self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::ApiRequest(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::ApiRequest(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::ApiResponse { status: status.as_u16(), body: text });
        }

        parse_body(&text)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
impl AuthService for HttpAuthService {
    async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post_json(LOGIN_PATH, payload).await
    }

    async fn register(&self, payload: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post_json(REGISTER_PATH, payload).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::ApiParse(e.to_string()))
}

//! Store configuration parsed from environment variables.

use std::path::PathBuf;

use crate::net::types::ApiError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_AUTH_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_AUTH_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub api_base_url: String,
    pub timeouts: AuthTimeouts,
    pub storage_path: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { api_base_url: DEFAULT_API_BASE_URL.to_owned(), timeouts: AuthTimeouts::default(), storage_path: None }
    }
}

impl AuthConfig {
    /// Build typed store config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_API_BASE_URL`: default `http://localhost:3000/api`
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    /// - `AUTH_STORAGE_PATH`: JSON file backing durable storage; in-memory when absent
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ConfigParse`] if the base URL is not `http(s)://`.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_base_url = parse_base_url(std::env::var("AUTH_API_BASE_URL").ok().as_deref())?;
        let timeouts = AuthTimeouts {
            request_secs: env_parse_u64("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_AUTH_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_AUTH_CONNECT_TIMEOUT_SECS),
        };
        let storage_path = std::env::var("AUTH_STORAGE_PATH")
            .ok()
            .map(|raw| raw.trim().to_owned())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self { api_base_url, timeouts, storage_path })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ApiError> {
    let url = raw.map_or(DEFAULT_API_BASE_URL, str::trim).trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_owned())
    } else {
        Err(ApiError::ConfigParse(format!("AUTH_API_BASE_URL must start with http:// or https://, got '{url}'")))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

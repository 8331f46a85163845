//! Wire DTOs and domain records for the auth service boundary.
//!
//! DESIGN
//! ======
//! The service speaks a loose JSON shape (numeric or string ids, optional
//! profile fields, free-form role strings). `UserRecord` captures that shape
//! as-is; `User::from_record` is the single total mapping into the strongly
//! typed record the store keeps and persists.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while talking to the authentication service.
///
/// The store hands these back to callers untouched.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The HTTP request never produced a response (DNS, connect, timeout).
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The service returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status of a rejected response, if the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// ROLE
// =============================================================================

/// The two account roles a user can switch between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Customer,
    Organizer,
}

impl Role {
    /// Parse a wire role string, ignoring ASCII case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("customer") {
            Some(Self::Customer)
        } else if raw.eq_ignore_ascii_case("organizer") {
            Some(Self::Organizer)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Organizer => "ORGANIZER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// USER
// =============================================================================

/// The signed-in identity as held by the store and persisted across reloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Service-assigned identifier, always in string form.
    pub id: String,
    /// Display name. Empty when the service omitted it.
    pub name: String,
    /// Contact email, if known.
    #[serde(default)]
    pub email: Option<String>,
    /// Active role.
    #[serde(default)]
    pub role: Role,
    /// Avatar image URL, if available.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Phone number, if available.
    #[serde(default)]
    pub phone: Option<String>,
}

impl User {
    /// Map a service user record into a `User`.
    ///
    /// Fallbacks for absent fields:
    /// - `name` → empty string
    /// - `role` → [`Role::Customer`], also for unrecognized role strings
    /// - `email`, `avatar_url`, `phone` stay `None`
    ///
    /// Fields the record carries beyond these are dropped.
    #[must_use]
    pub fn from_record(record: UserRecord) -> Self {
        let role = match record.role.as_deref() {
            None => Role::default(),
            Some(raw) => Role::parse(raw).unwrap_or_else(|| {
                tracing::warn!(user_id = %record.id, role = raw, "unknown role from auth service; using default");
                Role::default()
            }),
        };

        Self {
            id: record.id,
            name: record.name.unwrap_or_default(),
            email: record.email,
            role,
            avatar_url: record.avatar_url,
            phone: record.phone,
        }
    }
}

/// A partial user used by profile edits. `None` leaves a field unchanged.
///
/// Nullable fields take `Some(None)` to clear the value; in JSON that is an
/// explicit `null`, while a missing key leaves the field alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<Option<String>>,
}

impl UserPatch {
    /// Overlay every `Some` field onto `user`.
    pub fn apply_to(self, user: &mut User) {
        if let Some(id) = self.id {
            user.id = id;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(avatar_url) = self.avatar_url {
            user.avatar_url = avatar_url;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Credentials for `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up data for `POST /auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("phone", &self.phone)
            .finish()
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// A user as the auth service describes it, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Identifier; the service may send it as a number or a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login response: a flat user record with the access token alongside.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserRecord,
    pub access_token: String,
}

/// Registration response: the token and a nested user record.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: UserRecord,
}

/// A present key (even `null`) becomes `Some`; `default` covers a missing one.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Mask the local part of an email for logs: `alice@example.com` becomes
/// `a***@example.com`.
pub(crate) fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{first}***@{domain}"),
            None => format!("***@{domain}"),
        },
        None => "***".to_owned(),
    }
}

/// Accept a JSON string or integer-compatible number and render it as a string.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int.to_string());
            }
            if let Some(uint) = number.as_u64() {
                return Ok(uint.to_string());
            }
            #[allow(clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64()
                && float.is_finite()
                && float.fract() == 0.0
                && float.abs() < 9_007_199_254_740_992.0
            {
                return Ok((float as i64).to_string());
            }
            Err(D::Error::custom("expected integer-compatible id"))
        }
        _ => Err(D::Error::custom("expected string or number id")),
    }
}

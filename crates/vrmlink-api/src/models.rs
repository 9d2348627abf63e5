// VRM API response types
//
// The VRM cloud API wraps most payloads in a `{ success: bool, ... }`
// envelope, with the payload fields inlined next to the flag rather than
// nested. `Envelope<T>` models that shape via `#[serde(flatten)]`.
// Fields use `#[serde(default)]` liberally because the API is
// inconsistent about field presence across endpoints.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

// ── Response envelope ────────────────────────────────────────────────

/// Standard VRM API response envelope.
///
/// ```json
/// { "success": true, "tokens": [...] }
/// { "success": false, "errors": "...", "error_code": "..." }
/// ```
///
/// Endpoints that omit the flag (diagnostics) deserialize with
/// `success` defaulting to `true`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

fn default_true() -> bool {
    true
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success == false` into an
    /// [`Error::Api`] that carries whatever detail the API provided.
    pub fn into_data(self, operation: &str) -> Result<T, Error> {
        if self.success {
            return Ok(self.data);
        }

        let mut message = format!("{operation} failed");
        if let Some(code) = self.error_code {
            message.push_str(&format!(" ({code})"));
        }
        if let Some(errors) = self.errors {
            message.push_str(&format!(": {errors}"));
        }
        Err(Error::Api { message })
    }
}

// ── Login ────────────────────────────────────────────────────────────

/// Payload of `POST /auth/login`. Success marker is the `status` field,
/// not the usual `success` flag.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "idUser", default)]
    pub id_user: Option<i64>,
}

/// A successful login: the short-lived bearer token plus the user id
/// every other endpoint is scoped by.
#[derive(Debug, Clone)]
pub struct LoginOk {
    pub token: String,
    pub id_user: i64,
}

// ── Access tokens ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokensPayload {
    #[serde(default)]
    pub tokens: Vec<AccessTokenRecord>,
}

/// One entry from the access-token listing. Only the display name and id
/// matter for duplicate detection and revocation.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenRecord {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "idAccessToken")]
    pub id_access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenCreatedPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "idAccessToken", default)]
    pub id_access_token: Option<String>,
}

/// Empty payload for endpoints that return only the envelope flag.
#[derive(Debug, Deserialize)]
pub struct EmptyPayload {}

// ── Installations ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InstallationsPayload {
    #[serde(default)]
    pub records: Vec<Installation>,
}

/// One installation ("site") visible to the user.
#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    #[serde(rename = "idSite")]
    pub id_site: i64,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Diagnostics ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DiagnosticsPayload {
    #[serde(default)]
    pub records: Vec<DiagnosticRecord>,
}

/// One raw telemetry tuple from the diagnostics endpoint. A device is
/// identified by its label plus instance number; multiple records share
/// that pair, one per field.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticRecord {
    #[serde(rename = "Device")]
    pub device: String,
    pub instance: i64,
    #[serde(default)]
    pub description: String,
    /// Passed through untyped -- the API mixes numbers and strings here.
    #[serde(rename = "rawValue", default)]
    pub raw_value: Value,
}

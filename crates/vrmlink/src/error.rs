//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vrmlink_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("VRM login failed")]
    #[diagnostic(
        code(vrmlink::auth_failed),
        help(
            "Verify VRM_USERNAME and VRM_PASSWORD.\n\
             The bridge does not retry a rejected login."
        )
    )]
    AuthFailed,

    #[error("an access token named '{name}' already exists on the VRM account")]
    #[diagnostic(
        code(vrmlink::duplicate_token),
        help(
            "Revoke the token in the VRM portal, pick a different VRM_TOKEN_NAME,\n\
             or set VRM_REVOKE_DUPLICATE_TOKEN=true to replace it automatically."
        )
    )]
    DuplicateToken { name: String },

    #[error("access token operation failed")]
    #[diagnostic(code(vrmlink::token_operation))]
    TokenOperation {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Bridge ───────────────────────────────────────────────────────

    #[error("bridge error: {message}")]
    #[diagnostic(code(vrmlink::bridge))]
    Bridge { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(vrmlink::config),
        help("Settings come from the config file and VRM_-prefixed environment variables.")
    )]
    Config(#[from] vrmlink_config::ConfigError),

    // ── Transport setup ──────────────────────────────────────────────

    #[error("failed to build the HTTP client")]
    #[diagnostic(code(vrmlink::http_client))]
    HttpClient {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed => exit_code::AUTH,
            Self::DuplicateToken { .. } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateToken { name } => CliError::DuplicateToken { name },

            CoreError::TokenOperation { source } => CliError::TokenOperation {
                source: source.into(),
            },

            other => CliError::Bridge {
                message: other.to_string(),
            },
        }
    }
}

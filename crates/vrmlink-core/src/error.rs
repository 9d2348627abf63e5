use thiserror::Error;

/// Error taxonomy for the bridge's business logic.
///
/// The split mirrors how failures propagate: duplicate-token conflicts
/// and token operations are terminal for the run, API errors during a
/// poll cycle are logged and retried next interval, and cache I/O never
/// surfaces here at all (the cache logs and carries on).
#[derive(Debug, Error)]
pub enum CoreError {
    /// An access token with the configured name already exists and
    /// duplicate revocation is disabled. Terminal unless the operator
    /// opts in to revocation.
    #[error("an access token named '{name}' already exists on the VRM account")]
    DuplicateToken { name: String },

    /// Creating or revoking an access token failed. Propagates to the
    /// top level and terminates the run.
    #[error("access token operation failed")]
    TokenOperation {
        #[source]
        source: vrmlink_api::Error,
    },

    /// An authenticated call was attempted without any token.
    #[error("not authenticated with the VRM API")]
    NotAuthenticated,

    /// Error from the VRM API surface.
    #[error(transparent)]
    Api(#[from] vrmlink_api::Error),

    /// Payload serialization failed.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CoreError {
    /// Errors that must terminate the run rather than be skipped until
    /// the next poll cycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateToken { .. } | Self::TokenOperation { .. }
        )
    }
}

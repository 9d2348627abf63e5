// Shared transport configuration for building reqwest::Client instances.
//
// The VRM cloud API sits behind a public CA-signed certificate, so there
// is no TLS override matrix here -- only the knobs that matter for a
// long-running poller: request timeout and user agent.

use std::time::Duration;

/// Transport configuration for the VRM HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. A hung remote call would otherwise stall the
    /// polling cadence indefinitely.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("vrmlink/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(crate::error::Error::Transport)
    }
}

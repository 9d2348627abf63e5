// Runtime configuration for the bridge components.
//
// Constructed once at startup (vrmlink-config translates loaded
// settings into these) and passed into each component's constructor --
// no ambient global settings object.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Everything the bridge needs to run, grouped per component.
#[derive(Debug)]
pub struct BridgeConfig {
    pub session: SessionConfig,
    pub publisher: PublisherConfig,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout for VRM calls.
    pub http_timeout: Duration,
    /// Location of the on-disk credential cache.
    pub cache_path: PathBuf,
}

/// Credentials and token policy for the VRM session.
#[derive(Debug)]
pub struct SessionConfig {
    pub username: String,
    pub password: SecretString,
    /// Display name of the long-lived access token.
    pub token_name: String,
    /// Revoke an existing token with the same name instead of failing.
    pub revoke_duplicate_token: bool,
}

/// MQTT broker connection parameters.
#[derive(Debug)]
pub struct PublisherConfig {
    pub host: String,
    pub port: u16,
    /// Root of the published topic tree.
    pub base_topic: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// How long to wait for broker connection confirmation before
    /// giving up and leaving the publisher in a not-ready state.
    pub connect_timeout: Duration,
}

//! Settings for the vrmlink bridge.
//!
//! Layered loading: defaults → TOML file → `VRM_`-prefixed environment
//! variables, the environment winning. The env surface is flat
//! (`VRM_MQTT_HOST`, `VRM_POLL_INTERVAL`, ...) for compatibility with
//! existing deployments.

use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Resolved application settings.
///
/// `username`, `password`, and `mqtt_host` are required; everything else
/// has a default. Secrets are `SecretString` so a derived `Debug` never
/// leaks them into logs.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// VRM portal account name.
    pub username: String,

    /// VRM portal password.
    pub password: SecretString,

    /// Reserved: present in existing deployments but not consumed by the
    /// poll path, which always enumerates all installations.
    #[serde(default)]
    pub site_id: Option<String>,

    /// Display name of the long-lived access token.
    #[serde(default = "default_token_name")]
    pub token_name: String,

    /// Revoke an existing access token with the same name instead of
    /// failing with a conflict.
    #[serde(default)]
    pub revoke_duplicate_token: bool,

    /// MQTT broker hostname.
    pub mqtt_host: String,

    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,

    /// Root of the published topic tree.
    #[serde(default = "default_mqtt_topic")]
    pub mqtt_topic: String,

    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,

    #[serde(default)]
    pub mqtt_username: Option<String>,

    #[serde(default)]
    pub mqtt_password: Option<SecretString>,

    /// Seconds to wait for broker connection confirmation.
    #[serde(default = "default_mqtt_connect_timeout")]
    pub mqtt_connect_timeout: u64,

    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Raise the default log level to debug.
    #[serde(default)]
    pub debug: bool,

    /// Override the credential cache location.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

fn default_token_name() -> String {
    "vrm-cloud-mqtt".into()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_mqtt_topic() -> String {
    "vrm/cloud".into()
}
fn default_mqtt_client_id() -> String {
    "vrmlink".into()
}
fn default_mqtt_connect_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    60
}
fn default_http_timeout() -> u64 {
    30
}

// ── Paths ───────────────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "vrmlink", "vrmlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the on-disk credential cache.
pub fn default_cache_path() -> PathBuf {
    ProjectDirs::from("com", "vrmlink", "vrmlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("credentials.json");
            p
        },
        |dirs| dirs.data_local_dir().join("credentials.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("vrmlink");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the given TOML file (or the canonical path) plus
/// the environment, then validate.
pub fn load_settings(file: Option<&std::path::Path>) -> Result<Settings, ConfigError> {
    let path = file.map_or_else(config_path, std::path::Path::to_path_buf);

    let figment = Figment::new()
        .merge(Toml::file(&path))
        .merge(Env::prefixed("VRM_"));

    let settings: Settings = figment.extract()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Translate loaded settings into the per-component runtime config
    /// consumed by `vrmlink-core` constructors. Consumes the settings
    /// so secrets are moved, never copied.
    pub fn into_bridge_config(self) -> vrmlink_core::BridgeConfig {
        let cache_path = self.cache_path();
        vrmlink_core::BridgeConfig {
            session: vrmlink_core::SessionConfig {
                username: self.username,
                password: self.password,
                token_name: self.token_name,
                revoke_duplicate_token: self.revoke_duplicate_token,
            },
            publisher: vrmlink_core::PublisherConfig {
                host: self.mqtt_host,
                port: self.mqtt_port,
                base_topic: self.mqtt_topic,
                client_id: self.mqtt_client_id,
                username: self.mqtt_username,
                password: self.mqtt_password,
                connect_timeout: std::time::Duration::from_secs(self.mqtt_connect_timeout),
            },
            poll_interval: std::time::Duration::from_secs(self.poll_interval),
            http_timeout: std::time::Duration::from_secs(self.http_timeout),
            cache_path,
        }
    }

    /// Reject values that would produce a silently broken bridge.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::Validation {
                field: "username".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.mqtt_host.is_empty() {
            return Err(ConfigError::Validation {
                field: "mqtt_host".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.mqtt_topic.is_empty() || self.mqtt_topic.ends_with('/') {
            return Err(ConfigError::Validation {
                field: "mqtt_topic".into(),
                reason: "must be a non-empty topic without a trailing slash".into(),
            });
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    /// The credential cache path, honoring the override.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env(jail: &mut figment::Jail) {
        jail.set_env("VRM_USERNAME", "alice@example.com");
        jail.set_env("VRM_PASSWORD", "hunter2");
        jail.set_env("VRM_MQTT_HOST", "broker.local");
    }

    #[test]
    fn env_only_with_defaults() {
        figment::Jail::expect_with(|jail| {
            base_env(jail);

            let settings = load_settings(Some(std::path::Path::new("missing.toml")))
                .expect("settings should load");

            assert_eq!(settings.username, "alice@example.com");
            assert_eq!(settings.mqtt_port, 1883);
            assert_eq!(settings.mqtt_topic, "vrm/cloud");
            assert_eq!(settings.token_name, "vrm-cloud-mqtt");
            assert_eq!(settings.poll_interval, 60);
            assert!(!settings.revoke_duplicate_token);
            assert!(settings.site_id.is_none());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    username = "file@example.com"
                    password = "from-file"
                    mqtt_host = "file-broker"
                    poll_interval = 120
                "#,
            )?;
            base_env(jail);

            let settings = load_settings(Some(std::path::Path::new("config.toml")))
                .expect("settings should load");

            // env wins for overlapping keys, file supplies the rest
            assert_eq!(settings.username, "alice@example.com");
            assert_eq!(settings.mqtt_host, "broker.local");
            assert_eq!(settings.poll_interval, 120);
            Ok(())
        });
    }

    #[test]
    fn missing_required_field_fails() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("VRM_USERNAME", "alice@example.com");
            // no password, no mqtt_host

            let result = load_settings(Some(std::path::Path::new("missing.toml")));
            assert!(result.is_err());
            Ok(())
        });
    }

    #[test]
    fn zero_poll_interval_rejected() {
        figment::Jail::expect_with(|jail| {
            base_env(jail);
            jail.set_env("VRM_POLL_INTERVAL", "0");

            let result = load_settings(Some(std::path::Path::new("missing.toml")));
            assert!(matches!(
                result,
                Err(ConfigError::Validation { ref field, .. }) if field == "poll_interval"
            ));
            Ok(())
        });
    }

    #[test]
    fn trailing_slash_topic_rejected() {
        figment::Jail::expect_with(|jail| {
            base_env(jail);
            jail.set_env("VRM_MQTT_TOPIC", "vrm/cloud/");

            let result = load_settings(Some(std::path::Path::new("missing.toml")));
            assert!(matches!(
                result,
                Err(ConfigError::Validation { ref field, .. }) if field == "mqtt_topic"
            ));
            Ok(())
        });
    }
}

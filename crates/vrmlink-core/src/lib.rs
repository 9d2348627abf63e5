//! Business logic for the vrmlink bridge.
//!
//! This crate owns everything between the raw API client and the
//! binary:
//!
//! - **[`Session`]** — login, access-token lifecycle (lookup / create /
//!   revoke with duplicate-name conflict handling), and authenticated
//!   site/diagnostics queries.
//! - **[`CredentialCache`]** — best-effort disk cache of the long-lived
//!   access token, consulted once at startup and written once after
//!   token creation.
//! - **[`snapshot`]** — flattening of raw diagnostic records into
//!   per-device field maps, with the wire-compatible normalization
//!   rule.
//! - **[`MqttPublisher`]** — broker connection with retained liveness
//!   announcements and a registered last will.
//! - **[`Poller`]** — the sequential fetch → publish → sleep loop with
//!   cancellation-driven graceful shutdown.

pub mod cache;
pub mod config;
pub mod error;
pub mod poller;
pub mod publisher;
pub mod session;
pub mod snapshot;

pub use cache::{CachedCredential, CredentialCache};
pub use config::{BridgeConfig, PublisherConfig, SessionConfig};
pub use error::CoreError;
pub use poller::Poller;
pub use publisher::{ConnectionState, MqttPublisher};
pub use session::{Session, SessionState};
pub use snapshot::{DeviceSnapshot, flatten, normalize};

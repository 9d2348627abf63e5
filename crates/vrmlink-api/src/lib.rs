// vrmlink-api: Async Rust client for the Victron Energy VRM cloud API

pub mod auth;
pub mod client;
pub mod diagnostics;
pub mod error;
pub mod installations;
pub mod models;
pub mod tokens;
pub mod transport;

pub use client::{DEFAULT_BASE_URL, VrmClient};
pub use error::Error;
pub use transport::TransportConfig;

//! Authentication client library
//!
//! This crate provides the `AuthGateway` boundary used by the app's auth
//! screens, the session model, an HTTP implementation against the remote
//! auth service, and the demo password-reset flow.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod demo;
pub mod gateway;
pub mod http;
pub mod remote;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::ClientConfig;
pub use demo::DemoResetFlow;
pub use gateway::{
    AuthGateway, GatewayError, GatewayErrorKind, GatewayResult, SignInCredentials, SignUpDetails,
};
pub use remote::RemoteAuthGateway;
pub use session::Session;

#[cfg(any(test, feature = "testing"))]
pub use gateway::MockAuthGateway;

/// Result type for client setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for client setup and local credential handling
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Secure store error
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StoreError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

//! Error types for llmgate.
//!
//! These cover startup and plumbing only. A generate call never fails with
//! a `GatewayError`; its failures are reported as an [`ErrorKind`] inside a
//! normal result.
//!
//! [`ErrorKind`]: crate::outcome::ErrorKind

use thiserror::Error;

/// Core error type for llmgate operations outside the request path.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing env: {0}")]
    MissingEnv(String),

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

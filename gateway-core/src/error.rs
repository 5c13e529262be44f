//! Error types for the gateway

use thiserror::Error;

/// Gateway-wide error type
///
/// Variants carry the raw signal of the failure (where it happened and what the
/// upstream said). Mapping to the four externally visible kinds is done by
/// [`crate::classify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Input rejected before any upstream call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource lookup came back empty
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream answered with an error status or an error payload
    #[error("Upstream error{}: {message}", status_suffix(.status))]
    Upstream {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// Upstream could not be reached (connect failure, timeout)
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GatewayError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        GatewayError::NotFound(msg.into())
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        GatewayError::Upstream {
            status,
            code: None,
            message: message.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        GatewayError::Unavailable(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        GatewayError::Network(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        GatewayError::Auth(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        GatewayError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        GatewayError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        GatewayError::Internal(msg.into())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({})", code),
        None => String::new(),
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

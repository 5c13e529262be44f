//! Error classification
//!
//! Collapses every [`GatewayError`] into one of four externally visible kinds.
//! Structural signals (variant, upstream HTTP status, upstream error code) are
//! used first. Message matching is only a fallback for upstream errors that
//! carry no status, such as an error payload inside a 200 response.

use serde::Serialize;
use std::fmt;

use crate::error::GatewayError;

/// Externally visible error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    UpstreamFailure,
    Unavailable,
}

impl ErrorKind {
    /// HTTP status returned to the caller
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::UpstreamFailure => 500,
            ErrorKind::Unavailable => 503,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    /// Whether the originating message may be shown to the caller
    pub fn exposes_message(&self) -> bool {
        matches!(self, ErrorKind::Validation | ErrorKind::NotFound)
    }

    /// Message shown instead of upstream internals
    pub fn generic_message(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Invalid request",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::UpstreamFailure => "Upstream service error",
            ErrorKind::Unavailable => "Upstream service unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure mapped into the stable taxonomy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    /// Full internal detail, for logs only
    pub cause: Option<String>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Message safe to return to the caller
    pub fn public_message(&self) -> &str {
        if self.kind.exposes_message() {
            &self.message
        } else {
            self.kind.generic_message()
        }
    }
}

impl From<GatewayError> for ClassifiedError {
    fn from(err: GatewayError) -> Self {
        classify(&err)
    }
}

/// Map a raw failure onto the four-kind taxonomy
pub fn classify(err: &GatewayError) -> ClassifiedError {
    let cause = err.to_string();

    let (kind, message) = match err {
        GatewayError::Validation(msg) => (ErrorKind::Validation, msg.clone()),
        GatewayError::NotFound(msg) => (ErrorKind::NotFound, msg.clone()),
        GatewayError::Unavailable(msg) => (ErrorKind::Unavailable, msg.clone()),
        GatewayError::Upstream {
            status,
            code,
            message,
        } => {
            let kind = status
                .map(kind_for_status)
                .or_else(|| code.as_deref().and_then(kind_for_code))
                .or_else(|| kind_for_message(message))
                .unwrap_or(ErrorKind::UpstreamFailure);
            (kind, message.clone())
        }
        // Rejected credentials during client setup are a client error
        GatewayError::Auth(msg) => (ErrorKind::Validation, msg.clone()),
        GatewayError::Network(msg)
        | GatewayError::Parse(msg)
        | GatewayError::Config(msg)
        | GatewayError::Internal(msg) => (ErrorKind::UpstreamFailure, msg.clone()),
    };

    ClassifiedError::new(kind, message).with_cause(cause)
}

fn kind_for_status(status: u16) -> ErrorKind {
    match status {
        404 | 410 => ErrorKind::NotFound,
        400 | 401 | 403 | 405 | 409 | 422 => ErrorKind::Validation,
        502 | 503 | 504 => ErrorKind::Unavailable,
        _ => ErrorKind::UpstreamFailure,
    }
}

fn kind_for_code(code: &str) -> Option<ErrorKind> {
    match code.to_ascii_lowercase().as_str() {
        "not_found" | "notfound" => Some(ErrorKind::NotFound),
        "bad_request" | "invalid_request" | "validation_error" | "unauthorized" => {
            Some(ErrorKind::Validation)
        }
        "unavailable" | "service_unavailable" => Some(ErrorKind::Unavailable),
        _ => None,
    }
}

// Fallback for unstructured upstream errors. Brittle by nature: wording changes
// upstream will silently move errors into UpstreamFailure.
fn kind_for_message(message: &str) -> Option<ErrorKind> {
    let lower = message.to_lowercase();

    if lower.contains("not found") || lower.contains("does not exist") {
        return Some(ErrorKind::NotFound);
    }

    const CLIENT_ERROR_HINTS: [&str; 5] = ["invalid", "must be", "minimum", "required", "malformed"];
    if CLIENT_ERROR_HINTS.iter().any(|hint| lower.contains(hint)) {
        return Some(ErrorKind::Validation);
    }

    None
}

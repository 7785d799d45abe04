//! Error types for the tax service client.
//!
//! # Design
//! Failures fall into three kinds and each keeps its own shape:
//! - transport failures (connection, DNS, protocol) are carried unchanged in
//!   `ApiError::Transport` so the original error stays reachable via `source()`;
//! - deadline expiry from the timeout guard is `ApiError::Timeout`;
//! - anything that goes wrong after a response arrived (unreadable body,
//!   unparsable JSON, service error envelope) is normalized into a
//!   `ServiceError` and surfaced as `ApiError::Service`.
//!
//! Nothing is retried or downgraded here; classification and logging are the
//! only local handling.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Code used when a response body could not be read or decoded.
pub const FORMAT_ERROR_CODE: &str = "FormatException";

/// Error reported by the tax service, or synthesized when its response could
/// not be decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ServiceError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub details: Value,
}

impl ServiceError {
    /// Build a format error wrapping the underlying read/parse failure.
    pub fn format(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            message: message.into(),
            code: FORMAT_ERROR_CODE.to_string(),
            target: None,
            details: Value::String(cause.to_string()),
        }
    }

    /// Build from the `error` object of a service error envelope. Fields are
    /// copied verbatim; missing ones stay empty.
    pub fn from_envelope(error: &Value) -> Self {
        let text = |key: &str| match error.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        Self {
            message: text("message").unwrap_or_default(),
            code: text("code").unwrap_or_default(),
            target: text("target"),
            details: error.get("details").cloned().unwrap_or(Value::Null),
        }
    }

    pub fn is_format_error(&self) -> bool {
        self.code == FORMAT_ERROR_CODE
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(target) = &self.target {
            write!(f, " (target: {target})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ServiceError {}

/// Errors returned by `AvaTaxClient::rest_call` and friends.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered, but with an error envelope or an undecodable body.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// No response arrived before the configured deadline.
    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request could not be assembled.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),
}

impl ApiError {
    /// The service error carried by this failure, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            ApiError::Service(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }
}

/// Pre-send failures.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),
}

/// Client configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("application name must not be empty")]
    MissingAppName,

    #[error("failed to initialise the default transport: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

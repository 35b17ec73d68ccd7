//! Error types for the taskwire client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, server rejection, storage and input
//! validation failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for taskwire operations.
///
/// This error type covers all possible failure modes in the client,
/// with explicit variants to allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (rejected token, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The server answered with a non-2xx status.
    #[error("server rejected request: {0}")]
    Rejected(#[from] ServerRejection),

    /// Input validation errors, raised before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A payload that could not be decoded.
    #[error("malformed payload: {message}")]
    Malformed { message: String },
}

impl Error {
    /// Returns true if this error is a request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Timeout { .. }))
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request did not complete within the configured budget.
    #[error("Request timeout ({duration_ms}ms)")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The API rejected the request and re-authentication failed.
    #[error("Unauthorized")]
    Unauthorized,

    /// No usable credentials are stored.
    #[error("session expired")]
    SessionExpired,
}

/// A non-2xx response, with its body normalized into one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRejection {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable message extracted from the body.
    pub message: String,
}

impl fmt::Display for ServerRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for ServerRejection {}

impl ServerRejection {
    /// Create a new rejection.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build a rejection from a raw response body.
    ///
    /// The message is taken from `detail`, then `message`, then every
    /// field-level error flattened into a comma-separated list. `fallback`
    /// is used when the body carries none of these.
    pub fn from_body(status: u16, body: Option<&[u8]>, fallback: &str) -> Self {
        let message = body
            .and_then(|b| serde_json::from_slice::<serde_json::Value>(b).ok())
            .and_then(|value| format_error_body(&value))
            .unwrap_or_else(|| fallback.to_string());
        Self::new(status, message)
    }
}

fn format_error_body(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            for key in ["detail", "message"] {
                match map.get(key) {
                    Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                    Some(Value::Null) | None => {}
                    Some(other) => return Some(other.to_string()),
                }
            }

            let parts: Vec<String> = map
                .values()
                .flat_map(|v| match v {
                    Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>(),
                    other => vec![value_text(other)],
                })
                .filter(|s| !s.is_empty())
                .collect();

            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// A required field was empty.
    #[error("{fields} are required")]
    Missing { fields: String },

    /// Two fields that must match did not.
    #[error("{message}")]
    Mismatch { message: String },

    /// Invalid service URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },
}

/// Credential storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// The stored document could not be parsed.
    #[error("corrupt credential store: {message}")]
    Corrupt { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

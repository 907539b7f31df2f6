/*
[INPUT]:  Error sources (HTTP, API, serialization, config, WebSocket protocol)
[OUTPUT]: Structured error types with a coarse kind and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::ws::{FrameError, HandshakeState};

/// Message used for HTTP 429 responses that carry no message of their own
pub const TOO_MANY_REQUESTS: &str = "too many requests";

/// Main error type for the Hyphe adapter
#[derive(Error, Debug)]
pub enum HypheError {
    /// No credential configured, or other invalid local setup
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response was read
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Venue rejected the request with a non-2xx status
    #[error("API error (code {code}): {message}")]
    Api {
        code: u16,
        message: String,
        errors: HashMap<String, serde_json::Value>,
    },

    /// Dial or transport failure on the streaming socket
    #[error("Connection error: {0}")]
    Connection(String),

    /// Inbound frame could not be decoded
    #[error("Frame decode failed: {0}")]
    Decode(#[from] FrameError),

    /// Event tag not valid in the current handshake state
    #[error("Unexpected event '{tag}' while {state}")]
    UnexpectedEvent { state: HandshakeState, tag: String },

    /// A handshake stage was invoked out of order
    #[error("Invalid handshake state: expected {expected}, found {actual}")]
    InvalidState {
        expected: HandshakeState,
        actual: HandshakeState,
    },

    /// End of stream while a frame was still expected
    #[error("Stream closed before the expected frame arrived")]
    StreamClosed,

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Deadline elapsed
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Connection,
    ProtocolViolation,
    StreamClosed,
    UpstreamRejection,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Connection => "connection",
            ErrorKind::ProtocolViolation => "protocol violation",
            ErrorKind::StreamClosed => "stream closed",
            ErrorKind::UpstreamRejection => "upstream rejection",
        };
        f.write_str(name)
    }
}

impl HypheError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HypheError::Config(_) | HypheError::UrlParse(_) => ErrorKind::Configuration,
            HypheError::Http(_)
            | HypheError::Connection(_)
            | HypheError::Timeout { .. }
            | HypheError::Cancelled => ErrorKind::Connection,
            HypheError::Decode(_)
            | HypheError::UnexpectedEvent { .. }
            | HypheError::InvalidState { .. }
            | HypheError::Serialization(_) => ErrorKind::ProtocolViolation,
            HypheError::StreamClosed => ErrorKind::StreamClosed,
            HypheError::Api { .. } => ErrorKind::UpstreamRejection,
        }
    }

    /// Check if a fresh attempt could plausibly succeed.
    ///
    /// The adapter itself never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            HypheError::Api { code, .. } => {
                *code == StatusCode::TOO_MANY_REQUESTS.as_u16() || *code >= 500
            }
            HypheError::Http(_)
            | HypheError::Connection(_)
            | HypheError::StreamClosed
            | HypheError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        HypheError::Api {
            code: status.as_u16(),
            message: message.into(),
            errors: HashMap::new(),
        }
    }

    /// HTTP status code for upstream rejections
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HypheError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Per-field validation errors returned by the venue, if any
    pub fn field_errors(&self) -> Option<&HashMap<String, serde_json::Value>> {
        match self {
            HypheError::Api { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

/// Result type alias for Hyphe operations
pub type Result<T> = std::result::Result<T, HypheError>;

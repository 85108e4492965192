//! Error types for the Learnify client.
//!
//! # Design
//! Every failure a caller can see is one `ApiError` variant. Only transport
//! connectivity loss is ever retried, and a caller only sees it once the
//! attempt budget is spent, as `NetworkExhausted`. Everything else surfaces on
//! the attempt that produced it.

use std::fmt;

use thiserror::Error;

/// Why the transport failed to produce a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The connection dropped while the request or response was in flight.
    ConnectionLost,
    Timeout,
    /// Host name resolution failed.
    Dns,
    Tls,
    /// The host could not be reached or refused the connection.
    Refused,
    Cancelled,
    Other,
}

impl TransportErrorKind {
    /// Only a dropped connection is worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, TransportErrorKind::ConnectionLost)
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportErrorKind::ConnectionLost => "connection lost",
            TransportErrorKind::Timeout => "timed out",
            TransportErrorKind::Dns => "host not found",
            TransportErrorKind::Tls => "tls failure",
            TransportErrorKind::Refused => "connection refused",
            TransportErrorKind::Cancelled => "cancelled",
            TransportErrorKind::Other => "transport failure",
        };
        f.write_str(label)
    }
}

/// A classified transport failure plus the underlying cause description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ConnectionLost, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Flat discriminant of [`ApiError`] for callers that branch on category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NetworkExhausted,
    Transport,
    ServerStatus,
    Decode,
    Rejected,
    Cancelled,
}

/// Errors returned by `LearnifyClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be formed (bad base URL or path parameter).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Every attempt lost its connection; carries the last cause.
    #[error("network error after {attempts} attempts: {cause}")]
    NetworkExhausted { attempts: u32, cause: TransportError },

    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    ServerStatus { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The envelope reported `success: false`.
    #[error("request rejected by service: {message}")]
    Rejected { message: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ApiError::NetworkExhausted { .. } => ErrorKind::NetworkExhausted,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::ServerStatus { .. } => ErrorKind::ServerStatus,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Rejected { .. } => ErrorKind::Rejected,
            ApiError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The HTTP status for `ServerStatus`, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ServerStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err.kind {
            TransportErrorKind::Cancelled => ApiError::Cancelled,
            _ => ApiError::Transport(err),
        }
    }
}

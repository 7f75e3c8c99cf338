//! Request error types

use thiserror::Error;

use crate::config::RequestConfig;
use crate::response::Body;

/// Machine-readable discriminator for outcomes the caller races against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The configured timeout elapsed before the transport completed.
    Timeout,
    /// The caller triggered the cancellation signal.
    Aborted,
}

/// Errors produced by a failed request.
///
/// Exactly one error is produced per failed call. Timeout and cancellation
/// never carry a status; status and network failures echo the effective
/// config for diagnosability.
#[derive(Debug, Error)]
pub enum GrabError {
    /// Response received but rejected by the status validator.
    #[error("Request failed with status: {status}")]
    Status {
        /// HTTP status code of the rejected response.
        status: u16,
        /// Raw response body as received.
        response: Body,
        /// Echo of the effective config.
        config: Box<RequestConfig>,
    },
    /// The transport could not complete the request.
    #[error("Network error: {message}")]
    Network {
        /// Underlying transport error message.
        message: String,
        /// Echo of the effective config.
        config: Box<RequestConfig>,
    },
    /// No completion within the configured duration.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },
    /// Caller-initiated abort.
    #[error("Request aborted")]
    Aborted,
    /// The request URL was missing or could not be parsed.
    #[error("Malformed URL: {0}")]
    Url(String),
    /// Body encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GrabError {
    /// Network failure without a config echo; the orchestrator attaches the
    /// effective config before the error reaches the caller.
    pub(crate) fn network(message: impl Into<String>) -> Self {
        GrabError::Network {
            message: message.into(),
            config: Box::default(),
        }
    }

    /// Attach the effective config to variants that echo it.
    pub(crate) fn with_config(self, effective: &RequestConfig) -> Self {
        match self {
            GrabError::Status {
                status, response, ..
            } => GrabError::Status {
                status,
                response,
                config: Box::new(effective.clone()),
            },
            GrabError::Network { message, .. } => GrabError::Network {
                message,
                config: Box::new(effective.clone()),
            },
            other => other,
        }
    }

    /// HTTP status of the rejected response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GrabError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of a status failure.
    pub fn response(&self) -> Option<&Body> {
        match self {
            GrabError::Status { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Effective config echoed by status and network failures.
    pub fn config(&self) -> Option<&RequestConfig> {
        match self {
            GrabError::Status { config, .. } | GrabError::Network { config, .. } => Some(config),
            _ => None,
        }
    }

    /// Machine-readable code; `None` for generic, network and status
    /// failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            GrabError::Timeout { .. } => Some(ErrorCode::Timeout),
            GrabError::Aborted => Some(ErrorCode::Aborted),
            _ => None,
        }
    }

    /// Whether this error was produced by caller-initiated cancellation.
    pub fn is_cancel(&self) -> bool {
        matches!(self, GrabError::Aborted)
    }
}

impl From<serde_json::Error> for GrabError {
    fn from(err: serde_json::Error) -> Self {
        GrabError::Serialization(err.to_string())
    }
}

/// True iff `err` was produced by caller-initiated cancellation.
pub fn is_cancel(err: &GrabError) -> bool {
    err.is_cancel()
}

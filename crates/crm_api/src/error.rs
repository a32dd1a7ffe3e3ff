use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::envelope::EnvelopeError;

pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const DOWNLOAD_ERROR: &str = "DOWNLOAD_ERROR";
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
pub const CANCELLED: &str = "CANCELLED";

/// Message used when a failed response carries no structured error.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Machine-readable failure code carried by [`GatewayError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No response was obtained, or its body could not be parsed.
    Network,
    /// A binary download answered with a non-success status.
    Download,
    /// A failed response carried no structured error.
    Unknown,
    /// The caller abandoned the operation before a reply arrived. Never
    /// produced by the gateway itself.
    Cancelled,
    /// Application code carried verbatim from the backend's `error.code`.
    Backend(String),
}

impl ErrorCode {
    pub fn parse(value: &str) -> Self {
        match value {
            NETWORK_ERROR => Self::Network,
            DOWNLOAD_ERROR => Self::Download,
            UNKNOWN_ERROR => Self::Unknown,
            CANCELLED => Self::Cancelled,
            other => Self::Backend(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Network => NETWORK_ERROR,
            Self::Download => DOWNLOAD_ERROR,
            Self::Unknown => UNKNOWN_ERROR,
            Self::Cancelled => CANCELLED,
            Self::Backend(code) => code,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Failure raised by every gateway call that could not produce a usable
/// envelope.
///
/// `http_status` is `0` when no response was obtained.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({code}, HTTP {http_status})")]
pub struct GatewayError {
    pub message: String,
    pub code: ErrorCode,
    pub http_status: u16,
    pub details: Option<Value>,
}

impl GatewayError {
    pub fn new(message: impl Into<String>, code: ErrorCode, http_status: u16) -> Self {
        Self {
            message: message.into(),
            code,
            http_status,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Transport-level failure: no response, or an unparseable one.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(message, ErrorCode::Network, 0)
    }

    pub fn download(status: StatusCode) -> Self {
        Self::new(
            format!("Download failed with status {}", status.as_u16()),
            ErrorCode::Download,
            status.as_u16(),
        )
    }

    pub fn cancelled() -> Self {
        Self::new("The request was abandoned before a reply arrived", ErrorCode::Cancelled, 0)
    }

    /// Application failure built from the envelope's `error` field when it is
    /// present, else the generic unexpected-error fallback.
    pub fn from_envelope_error(http_status: u16, error: Option<EnvelopeError>) -> Self {
        match error {
            Some(error) => Self {
                message: non_empty(error.message)
                    .unwrap_or_else(|| UNEXPECTED_ERROR_MESSAGE.to_owned()),
                code: non_empty(error.code)
                    .map(ErrorCode::Backend)
                    .unwrap_or(ErrorCode::Unknown),
                http_status,
                details: error.details,
            },
            None => Self::new(UNEXPECTED_ERROR_MESSAGE, ErrorCode::Unknown, http_status),
        }
    }

    /// True when no response was obtained from the backend.
    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::Network
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        Self::network(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::network(format!("invalid response body: {error}"))
    }
}

/// Failure while constructing a [`Gateway`](crate::Gateway).
#[derive(Debug, Error)]
pub enum GatewayInitError {
    #[error("invalid base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

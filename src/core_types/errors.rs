//! Error taxonomy shared by both transports.
//!
//! Every normalized failure carries exactly one [`ErrorType`] and one
//! [`ErrorSource`]. [`ErrorSeverity`] drives the log level used when the
//! error service reports a failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// High-level classification of a failure.
///
/// The set is closed: the normalizer always picks exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// Connection issues: no HTTP status was received.
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// 401, 403, `UNAUTHENTICATED`, `UNAUTHORIZED`.
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    /// Bad user input, either tagged by the backend or detected from the message.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// 500 and above.
    #[serde(rename = "SERVER_ERROR")]
    Server,
    /// Other 4xx responses.
    #[serde(rename = "CLIENT_ERROR")]
    Client,
    /// Anything the rules above do not cover.
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Client => "CLIENT_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Severity used to pick the log level for this class of failure.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Server => ErrorSeverity::Error,
            Self::Auth | Self::Unknown => ErrorSeverity::Warning,
            Self::Validation | Self::Client => ErrorSeverity::Info,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transport produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSource {
    #[serde(rename = "REST")]
    Rest,
    #[serde(rename = "GraphQL")]
    GraphQl,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "REST",
            Self::GraphQl => "GraphQL",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level for logging decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The request failed and the cause is outside the caller's control.
    Error,
    /// Unexpected but recoverable (expired session, unclassified failure).
    Warning,
    /// Expected failure the caller can correct (validation, other 4xx).
    Info,
}

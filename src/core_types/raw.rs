//! Raw transport failures.
//!
//! Transport calls return a tagged [`RawError`]; normalization switches on the variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension code for an unauthenticated GraphQL request.
pub const CODE_UNAUTHENTICATED: &str = "UNAUTHENTICATED";
/// Extension code for an authenticated but forbidden GraphQL request.
pub const CODE_UNAUTHORIZED: &str = "UNAUTHORIZED";
/// Extension code for input the backend rejected.
pub const CODE_BAD_USER_INPUT: &str = "BAD_USER_INPUT";
/// Extension code some backends use for validation failures.
pub const CODE_VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Extension code for an unhandled resolver failure.
pub const CODE_INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

/// Why a request never produced an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The transport gave up waiting.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// Any other transport-level failure.
    Other,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GraphQlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach an `extensions.code` value.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.extensions
            .get_or_insert_with(serde_json::Map::new)
            .insert("code".to_string(), serde_json::Value::String(code.into()));
        self
    }

    /// The `extensions.code` value, if the backend supplied one.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .and_then(|code| code.as_str())
    }

    /// Whether this entry reports a missing or rejected credential.
    pub fn is_auth_code(&self) -> bool {
        matches!(
            self.code(),
            Some(CODE_UNAUTHENTICATED) | Some(CODE_UNAUTHORIZED)
        )
    }
}

/// A failure exactly as the transport observed it.
#[derive(Error, Debug, Clone)]
pub enum RawError {
    /// No HTTP response was received.
    #[error("{message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// The REST backend answered with a non-success status.
    #[error("{message}")]
    Http {
        status: u16,
        /// Parsed JSON body, when the body was JSON.
        body: Option<serde_json::Value>,
        message: String,
    },

    /// The GraphQL endpoint reported errors or answered with a non-success status.
    #[error("{message}")]
    GraphQl {
        status: u16,
        errors: Vec<GraphQlError>,
        message: String,
    },

    /// A response body was read but is not the expected JSON.
    #[error("{message}")]
    Decode { status: u16, message: String },

    /// Anything else.
    #[error("{message}")]
    Other { message: String },
}

impl RawError {
    /// Non-2xx REST response.
    pub fn http(status: u16, body: Option<serde_json::Value>) -> Self {
        Self::Http {
            status,
            body,
            message: format!("Request failed with status code {status}"),
        }
    }

    /// Structured GraphQL failure; the message follows the first reported error.
    pub fn graphql(status: u16, errors: Vec<GraphQlError>) -> Self {
        let message = errors
            .first()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("GraphQL Error (Code: {status})"));
        Self::GraphQl {
            status,
            errors,
            message,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Network {
            kind: NetworkErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify a reqwest transport failure, including one while reading the body.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            NetworkErrorKind::Timeout
        } else if error.is_connect() {
            NetworkErrorKind::Connect
        } else {
            NetworkErrorKind::Other
        };

        Self::Network {
            kind,
            message: error.to_string(),
        }
    }

    /// HTTP status carried by the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::GraphQl { status, .. } | Self::Decode { status, .. } => {
                Some(*status)
            }
            Self::Network { .. } | Self::Other { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Network { message, .. }
            | Self::Http { message, .. }
            | Self::GraphQl { message, .. }
            | Self::Decode { message, .. }
            | Self::Other { message } => message,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            }
        )
    }

    /// GraphQL errors reported by the backend; empty for other variants.
    pub fn graphql_errors(&self) -> &[GraphQlError] {
        match self {
            Self::GraphQl { errors, .. } => errors,
            _ => &[],
        }
    }
}

//! Error types for resilient-access.
//!
//! [`NormalizedError`] is the only failure callers of the REST and GraphQL
//! wrappers ever see. It is built once per failed call by the
//! [`ErrorService`](crate::service::ErrorService) and then shared read-only
//! with the caller and every registered listener.
//!
//! # Handling Example
//!
//! ```rust,no_run
//! use resilient_access::{ErrorType, NormalizedError};
//!
//! fn handle(err: &NormalizedError) {
//!     if err.should_logout() {
//!         println!("session is gone, back to login");
//!         return;
//!     }
//!     match err.error_type() {
//!         ErrorType::Validation => println!("fix the form: {}", err.message()),
//!         ErrorType::Network => println!("offline?"),
//!         _ => println!("{}", err.user_message(None)),
//!     }
//! }
//! ```
//!
//! Configuration problems are reported separately through [`ConfigError`].

use crate::core_types::{ErrorSource, ErrorType, GraphQlError, RawError};
use crate::logging::log_error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type returned by both transport wrappers.
pub type AccessResult<T> = std::result::Result<T, NormalizedError>;

// ============================================================================
// Error context
// ============================================================================

/// Structured metadata describing the call that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorContext {
    pub source: ErrorSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ErrorContext {
    pub fn new(source: ErrorSource) -> Self {
        Self {
            source,
            endpoint: None,
            method: None,
            operation: None,
            variables: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Context for a REST call.
    pub fn rest(endpoint: Option<String>, method: Option<String>) -> Self {
        Self {
            endpoint,
            method,
            ..Self::new(ErrorSource::Rest)
        }
    }

    /// Context for a GraphQL call.
    pub fn graphql(operation: Option<String>, variables: Option<serde_json::Value>) -> Self {
        Self {
            operation,
            variables,
            ..Self::new(ErrorSource::GraphQl)
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), v);
        }
        self
    }
}

// ============================================================================
// Normalized error
// ============================================================================

/// The single cross-transport error shape.
///
/// Fields are fixed at creation; accessors hand out shared references only.
/// `Error::source()` yields the original [`RawError`].
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedError {
    id: Uuid,
    #[serde(rename = "type")]
    error_type: ErrorType,
    source: ErrorSource,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    #[serde(skip)]
    original: Arc<RawError>,
    context: ErrorContext,
    timestamp: DateTime<Utc>,
    is_retryable: bool,
}

/// Field values computed by the normalizer.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedParts {
    pub error_type: ErrorType,
    pub source: ErrorSource,
    pub message: String,
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
    pub is_retryable: bool,
}

impl NormalizedError {
    pub(crate) const FALLBACK_MESSAGE: &'static str = "An error occurred";

    pub(crate) fn from_parts(
        parts: NormalizedParts,
        original: Arc<RawError>,
        context: ErrorContext,
    ) -> Self {
        let message = if parts.message.trim().is_empty() {
            Self::FALLBACK_MESSAGE.to_string()
        } else {
            parts.message
        };

        Self {
            id: Uuid::new_v4(),
            error_type: parts.error_type,
            source: parts.source,
            message,
            status_code: parts.status_code,
            error_code: parts.error_code,
            original,
            context,
            timestamp: Utc::now(),
            is_retryable: parts.is_retryable,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Transport that produced the failure.
    pub fn error_source(&self) -> ErrorSource {
        self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// The unmodified transport failure. For diagnostics only.
    pub fn original_error(&self) -> &RawError {
        &self.original
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Creation time as an ISO-8601 string.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    /// Advisory: the condition may clear if attempted again.
    pub fn is_retryable(&self) -> bool {
        self.is_retryable
    }

    pub fn is_auth_error(&self) -> bool {
        self.error_type == ErrorType::Auth
    }

    /// An auth failure that is no longer eligible for a refresh.
    pub fn should_logout(&self) -> bool {
        self.is_auth_error() && !self.is_retryable
    }

    /// Message safe to show to end users.
    ///
    /// Never includes details of the original error.
    pub fn user_message(&self, custom: Option<&str>) -> String {
        if let Some(custom) = custom {
            return custom.to_string();
        }

        match self.error_type {
            ErrorType::Auth => "Authentication failed. Please log in again.".to_string(),
            ErrorType::Network => "Network error. Please check your connection.".to_string(),
            ErrorType::Server => "Server error. Please try again later.".to_string(),
            ErrorType::Validation => {
                self.message_or("Invalid input. Please check your data.")
            }
            ErrorType::Client | ErrorType::Unknown => {
                self.message_or("Something went wrong. Please try again.")
            }
        }
    }

    /// GraphQL errors carried by a GraphQL failure; empty otherwise.
    pub fn graphql_errors(&self) -> &[GraphQlError] {
        if self.source != ErrorSource::GraphQl {
            return &[];
        }
        self.original.graphql_errors()
    }

    fn message_or(&self, fallback: &str) -> String {
        if self.message.is_empty() {
            fallback.to_string()
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.source, self.error_type, self.message)?;
        if let Some(status) = self.status_code {
            write!(f, " (status {status})")?;
        }
        Ok(())
    }
}

impl std::error::Error for NormalizedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.original.as_ref())
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

/// Errors raised while building clients from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("Missing configuration value: {key}")]
    Missing { key: String },

    /// A setting is present but unusable.
    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        let key = key.into();
        log_error!(
            error_type = "config_missing",
            key = %key,
            "Required access-layer setting is missing"
        );
        Self::Missing { key }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        let key = key.into();
        let message = message.into();
        log_error!(
            error_type = "config_invalid",
            key = %key,
            message = %message,
            "Access-layer setting failed validation"
        );
        Self::Invalid { key, message }
    }

    pub fn http_client(error: reqwest::Error) -> Self {
        log_error!(
            error_type = "http_client_build",
            error = %error,
            "Failed to build HTTP client"
        );
        Self::HttpClient(error)
    }
}

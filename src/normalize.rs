//! Error normalization.
//!
//! Pure functions mapping a [`RawError`] plus its [`ErrorContext`] into a
//! [`NormalizedError`]. Classification is deterministic:
//!
//! | Source | Signal | Type |
//! |--------|--------|------|
//! | REST | no status | `Network` |
//! | REST | 401, 403 | `Auth` |
//! | REST | other 4xx | `Client` |
//! | REST | 5xx | `Server` |
//! | GraphQL | `UNAUTHENTICATED`/`UNAUTHORIZED` or 401 | `Auth` |
//! | GraphQL | `BAD_USER_INPUT`/`VALIDATION_ERROR` | `Validation` |
//! | GraphQL | validation wording in the message | `Validation` |
//! | GraphQL | `INTERNAL_SERVER_ERROR` or 5xx | `Server` |
//! | GraphQL | anything else structured | `Client` |
//! | GraphQL | not a structured GraphQL failure | `Unknown` |
//!
//! The message heuristic runs before the server check, so a failure tagged
//! `INTERNAL_SERVER_ERROR` whose message reads like an input mistake is
//! reported as `Validation`.

use crate::core_types::raw::{
    CODE_BAD_USER_INPUT, CODE_INTERNAL_SERVER_ERROR, CODE_UNAUTHENTICATED, CODE_UNAUTHORIZED,
    CODE_VALIDATION_ERROR,
};
use crate::core_types::{ErrorSource, ErrorType, RawError};
use crate::error::{ErrorContext, NormalizedError, NormalizedParts};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static VALIDATION_MESSAGE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)unrecognized|invalid|incorrect|wrong|does not exist|not found|must be|required",
    )
    .ok()
});

/// Stateless normalizer; every function is pure apart from the creation timestamp.
pub struct ErrorNormalizer;

impl ErrorNormalizer {
    /// Normalize according to `context.source`.
    pub fn normalize(raw: Arc<RawError>, context: ErrorContext) -> NormalizedError {
        match context.source {
            ErrorSource::Rest => Self::normalize_rest(raw, context),
            ErrorSource::GraphQl => Self::normalize_graphql(raw, context),
            ErrorSource::Unknown => Self::normalize_generic(raw, context),
        }
    }

    /// Normalize a REST failure.
    pub fn normalize_rest(raw: Arc<RawError>, context: ErrorContext) -> NormalizedError {
        let status_code = raw.status();
        let body = match raw.as_ref() {
            RawError::Http { body, .. } => body.as_ref(),
            _ => None,
        };

        let message = body
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| non_empty(raw.message()))
            .unwrap_or_else(|| NormalizedError::FALLBACK_MESSAGE.to_string());

        let error_code = body.and_then(|b| {
            b.get("code")
                .and_then(code_value)
                .or_else(|| b.get("error").and_then(code_value))
        });

        // Local failures such as an invalid token header never reached the network
        let (error_type, is_retryable) = match raw.as_ref() {
            RawError::Other { .. } => (ErrorType::Unknown, false),
            _ => (
                Self::error_type_from_status(status_code),
                Self::is_retryable_rest(status_code),
            ),
        };

        let parts = NormalizedParts {
            error_type,
            source: ErrorSource::Rest,
            message,
            status_code,
            error_code,
            is_retryable,
        };

        NormalizedError::from_parts(parts, raw, context)
    }

    /// Normalize a GraphQL failure.
    pub fn normalize_graphql(raw: Arc<RawError>, context: ErrorContext) -> NormalizedError {
        let parts = match raw.as_ref() {
            RawError::GraphQl {
                status,
                errors,
                message,
            } => {
                let first = errors.first();
                let error_code = first.and_then(|e| e.code()).map(str::to_string);
                let message = first
                    .and_then(|e| non_empty(&e.message))
                    .or_else(|| non_empty(message))
                    .unwrap_or_else(|| "GraphQL request failed".to_string());

                NormalizedParts {
                    error_type: Self::graphql_error_type(
                        error_code.as_deref(),
                        Some(*status),
                        &message,
                    ),
                    source: ErrorSource::GraphQl,
                    is_retryable: Self::is_retryable_graphql(error_code.as_deref(), Some(*status)),
                    message,
                    status_code: Some(*status),
                    error_code,
                }
            }
            other => NormalizedParts {
                error_type: ErrorType::Unknown,
                source: ErrorSource::GraphQl,
                message: non_empty(other.message())
                    .unwrap_or_else(|| "GraphQL error occurred".to_string()),
                status_code: None,
                error_code: None,
                is_retryable: false,
            },
        };

        NormalizedError::from_parts(parts, raw, context)
    }

    /// Normalize a failure whose transport is unknown.
    pub fn normalize_generic(raw: Arc<RawError>, context: ErrorContext) -> NormalizedError {
        let parts = NormalizedParts {
            error_type: ErrorType::Unknown,
            source: context.source,
            message: non_empty(raw.message())
                .unwrap_or_else(|| "An unexpected error occurred".to_string()),
            status_code: None,
            error_code: None,
            is_retryable: false,
        };

        NormalizedError::from_parts(parts, raw, context)
    }

    /// Error type for a REST status code.
    pub fn error_type_from_status(status_code: Option<u16>) -> ErrorType {
        match status_code {
            None => ErrorType::Network,
            Some(401) | Some(403) => ErrorType::Auth,
            Some(400..=499) => ErrorType::Client,
            Some(status) if status >= 500 => ErrorType::Server,
            Some(_) => ErrorType::Unknown,
        }
    }

    /// Error type for a structured GraphQL failure, checked in priority order.
    pub fn graphql_error_type(
        error_code: Option<&str>,
        status_code: Option<u16>,
        message: &str,
    ) -> ErrorType {
        if matches!(error_code, Some(CODE_UNAUTHENTICATED) | Some(CODE_UNAUTHORIZED))
            || status_code == Some(401)
        {
            return ErrorType::Auth;
        }

        if matches!(
            error_code,
            Some(CODE_BAD_USER_INPUT) | Some(CODE_VALIDATION_ERROR)
        ) {
            return ErrorType::Validation;
        }

        if Self::is_validation_message(message) {
            return ErrorType::Validation;
        }

        if error_code == Some(CODE_INTERNAL_SERVER_ERROR)
            || status_code.is_some_and(|s| s >= 500)
        {
            return ErrorType::Server;
        }

        ErrorType::Client
    }

    /// Whether a message uses common validation wording.
    pub fn is_validation_message(message: &str) -> bool {
        VALIDATION_MESSAGE
            .as_ref()
            .is_some_and(|regex| regex.is_match(message))
    }

    /// Transport failures, 401 (refresh path) and 5xx are worth another attempt.
    pub fn is_retryable_rest(status_code: Option<u16>) -> bool {
        match status_code {
            None => true,
            Some(401) => true,
            Some(status) => status >= 500,
        }
    }

    pub fn is_retryable_graphql(error_code: Option<&str>, status_code: Option<u16>) -> bool {
        if error_code == Some(CODE_UNAUTHENTICATED) || status_code == Some(401) {
            return true;
        }
        error_code == Some(CODE_INTERNAL_SERVER_ERROR) || status_code.is_some_and(|s| s >= 500)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn code_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

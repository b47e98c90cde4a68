//! Test helper utilities shared across unit test modules
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

#![allow(dead_code)]

use crate::core_types::{ErrorSource, GraphQlError, RawError};
use crate::error::{ErrorContext, NormalizedError};
use crate::normalize::ErrorNormalizer;
use std::env;
use std::sync::Arc;

/// Normalize an HTTP failure as the REST wrapper would.
pub fn rest_error(status: u16, body: Option<serde_json::Value>) -> NormalizedError {
    ErrorNormalizer::normalize(
        Arc::new(RawError::http(status, body)),
        ErrorContext::rest(Some("/items".to_string()), Some("GET".to_string())),
    )
}

/// Normalize a transport failure (no response) as the REST wrapper would.
pub fn network_error() -> NormalizedError {
    ErrorNormalizer::normalize(
        Arc::new(RawError::timeout("timeout of 30000ms exceeded")),
        ErrorContext::rest(Some("/items".to_string()), Some("GET".to_string())),
    )
}

/// Normalize a structured GraphQL failure with one error entry.
pub fn graphql_error(status: u16, message: &str, code: Option<&str>) -> NormalizedError {
    let mut entry = GraphQlError::new(message);
    if let Some(code) = code {
        entry = entry.with_code(code);
    }
    ErrorNormalizer::normalize(
        Arc::new(RawError::graphql(status, vec![entry])),
        ErrorContext::graphql(Some("AuthenticatedRequest".to_string()), None),
    )
}

pub fn unknown_error(message: &str) -> NormalizedError {
    ErrorNormalizer::normalize(
        Arc::new(RawError::other(message)),
        ErrorContext::new(ErrorSource::Unknown),
    )
}

/// Environment variable override restored on drop.
///
/// Only safe together with `#[serial_test::serial]`.
pub struct ScopedEnv {
    key: String,
    original: Option<String>,
}

impl ScopedEnv {
    pub fn set(key: &str, value: &str) -> Self {
        let original = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            original,
        }
    }

    pub fn unset(key: &str) -> Self {
        let original = env::var(key).ok();
        env::remove_var(key);
        Self {
            key: key.to_string(),
            original,
        }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}

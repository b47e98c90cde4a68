//! GraphQL transport wrapper
//!
//! One fixed endpoint, one shared header set. The `Authorization` header is
//! rewritten from the credential store before every request and removed when
//! no credential is stored.
//!
//! Auth failures are classified and surfaced but never refreshed here; the
//! global listener decides what to do with them. When an auth failure arrives
//! for a call made without a credential, the store is cleared.

use crate::config::GraphQlConfig;
use crate::core_types::{GraphQlError, RawError};
use crate::credentials::{token_snapshot, CredentialStore};
use crate::error::{AccessResult, ConfigError, ErrorContext};
use crate::logging::{log_debug, log_trace, log_warn};
use crate::service::{ErrorService, HandleOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};

/// Context operation for a call made with a stored credential.
pub const AUTHENTICATED_OPERATION: &str = "AuthenticatedRequest";
/// Context operation for a call made without one.
pub const UNAUTHENTICATED_OPERATION: &str = "UnauthenticatedRequest";

static OPERATION_NAME: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(?:query|mutation|subscription)\s+([_A-Za-z][_0-9A-Za-z]*)").ok()
});

/// Name of the first named operation in a GraphQL document.
pub fn operation_name(document: &str) -> Option<String> {
    OPERATION_NAME
        .as_ref()?
        .captures(document)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
}

/// Whether a raw GraphQL failure reports a missing or rejected credential.
pub fn is_auth_failure(raw: &RawError) -> bool {
    raw.status() == Some(401) || raw.graphql_errors().iter().any(GraphQlError::is_auth_code)
}

/// GraphQL client with shared persistent headers.
pub struct GraphQlClient {
    http: reqwest::Client,
    config: GraphQlConfig,
    headers: RwLock<HeaderMap>,
    credentials: Arc<dyn CredentialStore>,
    errors: Arc<ErrorService>,
}

impl std::fmt::Debug for GraphQlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl GraphQlClient {
    /// Create a GraphQL client
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the endpoint is missing or invalid, or the
    /// HTTP client cannot be built.
    pub fn new(
        config: GraphQlConfig,
        credentials: Arc<dyn CredentialStore>,
        errors: Arc<ErrorService>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ConfigError::http_client)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        log_debug!(
            endpoint = %config.endpoint,
            timeout_secs = config.timeout.as_secs(),
            "Creating GraphQL client"
        );

        Ok(Self {
            http,
            config,
            headers: RwLock::new(headers),
            credentials,
            errors,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Set a header sent with every subsequent request.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.headers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, value);
    }

    /// Current value of a shared header.
    pub fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.headers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Execute a query or mutation and decode its `data` into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: Option<serde_json::Value>,
    ) -> AccessResult<T> {
        let token = token_snapshot(self.credentials.as_ref());

        let raw = match self.prepare_headers(token.as_deref()) {
            Ok(headers) => match self.dispatch(headers, document, variables.as_ref()).await {
                Ok(data) => return Ok(data),
                Err(raw) => raw,
            },
            Err(raw) => raw,
        };

        let authenticated = token_snapshot(self.credentials.as_ref()).is_some();
        let operation = if authenticated {
            AUTHENTICATED_OPERATION
        } else {
            UNAUTHENTICATED_OPERATION
        };

        let mut context = ErrorContext::graphql(Some(operation.to_string()), variables);
        if let Some(name) = operation_name(document) {
            context = context.with_metadata("operation_name", name);
        }

        let auth_failure = is_auth_failure(&raw);
        let normalized = self
            .errors
            .handle_error(raw, context, HandleOptions::default());

        if auth_failure && !authenticated {
            log_warn!(
                error_id = %normalized.id(),
                "GraphQL auth failure without a credential, clearing credentials"
            );
            self.credentials.clear_access_token();
        }

        Err(normalized)
    }

    /// Sync the shared `Authorization` header with the credential and return
    /// the header set for this request.
    fn prepare_headers(&self, token: Option<&str>) -> Result<HeaderMap, RawError> {
        let mut headers = self.headers.write().unwrap_or_else(|e| e.into_inner());
        match token {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| RawError::other(format!("Invalid access token header: {e}")))?;
                headers.insert(AUTHORIZATION, value);
            }
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
        Ok(headers.clone())
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        headers: HeaderMap,
        document: &str,
        variables: Option<&serde_json::Value>,
    ) -> Result<T, RawError> {
        let payload = serde_json::json!({
            "query": document,
            "variables": variables.cloned().unwrap_or_else(|| serde_json::json!({})),
        });

        log_trace!(
            endpoint = %self.config.endpoint,
            authenticated = headers.contains_key(AUTHORIZATION),
            "Dispatching GraphQL request"
        );

        let response = self
            .http
            .post(&self.config.endpoint)
            .headers(headers)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RawError::from_reqwest(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| RawError::from_reqwest(&e))?;

        let body: serde_json::Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(RawError::graphql(status.as_u16(), Vec::new()));
            }
            Err(e) => {
                return Err(RawError::Decode {
                    status: status.as_u16(),
                    message: format!("Invalid GraphQL response: {e}"),
                });
            }
        };

        let errors: Vec<GraphQlError> = body
            .get("errors")
            .cloned()
            .and_then(|errors| serde_json::from_value(errors).ok())
            .unwrap_or_default();

        if !errors.is_empty() || !status.is_success() {
            return Err(RawError::graphql(status.as_u16(), errors));
        }

        let data = body.get("data").cloned().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(data).map_err(|e| RawError::Decode {
            status: status.as_u16(),
            message: format!("Unexpected GraphQL data shape: {e}"),
        })
    }
}

//! REST transport wrapper
//!
//! Every call attaches the stored bearer token, and every failure is normalized
//! through the [`ErrorService`]. A 401 on a call that carried a token triggers
//! the refresh-and-retry cycle:
//!
//! 1. Record the attempt in the call's [`RetryState`].
//! 2. Past `max_auth_retries`: clear the credential and fail.
//! 3. Otherwise refresh; a new token is stored and the identical request re-issued.
//! 4. No token issued: clear the credential and fail with the 401.
//! 5. Refresh failed: clear the credential and fail with the refresh error.

use crate::config::RestConfig;
use crate::core_types::{ErrorSource, RawError};
use crate::credentials::{token_snapshot, CredentialStore};
use crate::error::{AccessResult, ConfigError, ErrorContext};
use crate::internals::retry::RetryState;
use crate::logging::{log_debug, log_trace, log_warn};
use crate::refresh::TokenRefresher;
use crate::service::{ErrorService, HandleOptions};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A fully specified REST call for [`RestClient::send`].
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: Method,
    /// Absolute URL or a path relative to the configured base URL
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl RestRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: HeaderMap::new(),
            query: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// REST client with bearer authentication and 401 refresh handling.
pub struct RestClient {
    http: reqwest::Client,
    config: RestConfig,
    credentials: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    errors: Arc<ErrorService>,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Create a REST client
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(
        config: RestConfig,
        credentials: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        errors: Arc<ErrorService>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ConfigError::http_client)?;

        log_debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            max_auth_retries = config.max_auth_retries,
            single_flight_refresh = config.single_flight_refresh,
            "Creating REST client"
        );

        Ok(Self {
            http,
            config,
            credentials,
            refresher,
            errors,
            refresh_gate: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> AccessResult<T> {
        self.send(RestRequest::new(Method::GET, url)).await
    }

    pub async fn post<T, B>(&self, url: &str, body: &B) -> AccessResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request_with_body(Method::POST, url, body)?;
        self.send(request).await
    }

    pub async fn put<T, B>(&self, url: &str, body: &B) -> AccessResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request_with_body(Method::PUT, url, body)?;
        self.send(request).await
    }

    pub async fn patch<T, B>(&self, url: &str, body: &B) -> AccessResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request_with_body(Method::PATCH, url, body)?;
        self.send(request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> AccessResult<T> {
        self.send(RestRequest::new(Method::DELETE, url)).await
    }

    /// Issue a request, refreshing the credential on 401 as needed.
    ///
    /// Success bodies decode into `T`; an empty body decodes as JSON `null`.
    pub async fn send<T: DeserializeOwned>(&self, request: RestRequest) -> AccessResult<T> {
        let url = resolve_url(&self.config.base_url, &request.url);
        let method = request.method.as_str().to_string();
        let mut state = RetryState::new();
        let mut token = token_snapshot(self.credentials.as_ref());

        loop {
            let raw = match self.dispatch(&request, &url, token.as_deref()).await {
                Ok(value) => return Ok(value),
                Err(raw) => Arc::new(raw),
            };

            let normalized = self.errors.handle_rest_error(
                Arc::clone(&raw),
                Some(url.clone()),
                Some(method.clone()),
                HandleOptions::default(),
            );

            if raw.status() != Some(401) {
                return Err(normalized);
            }

            state.advance();
            if state.exhausted(self.config.max_auth_retries) {
                log_warn!(
                    url = %url,
                    method = %method,
                    attempts = state.attempt(),
                    max_auth_retries = self.config.max_auth_retries,
                    "Auth retry budget exhausted, clearing credentials"
                );
                self.credentials.clear_access_token();
                return Err(normalized);
            }

            let Some(current) = token_snapshot(self.credentials.as_ref()) else {
                log_debug!(url = %url, "401 without a stored credential, not refreshing");
                return Err(normalized);
            };

            let refreshed = self.refresh_token(token.as_deref(), &current).await;
            match refreshed {
                Ok(Some(new_token)) => {
                    log_debug!(
                        url = %url,
                        method = %method,
                        attempt = state.attempt(),
                        "Access token refreshed, retrying request"
                    );
                    token = Some(new_token);
                }
                Ok(None) => {
                    log_warn!(url = %url, "Refresh issued no token, clearing credentials");
                    self.credentials.clear_access_token();
                    return Err(normalized);
                }
                Err(refresh_error) => {
                    log_warn!(
                        url = %url,
                        error = %refresh_error,
                        "Token refresh failed, clearing credentials"
                    );
                    self.credentials.clear_access_token();
                    return Err(self.errors.handle_rest_error(
                        refresh_error,
                        Some(url),
                        Some(method),
                        HandleOptions::default(),
                    ));
                }
            }
        }
    }

    fn request_with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> AccessResult<RestRequest> {
        match serde_json::to_value(body) {
            Ok(value) => Ok(RestRequest::new(method, url).with_body(value)),
            Err(e) => {
                let mut context = ErrorContext::new(ErrorSource::Unknown);
                context.endpoint = Some(resolve_url(&self.config.base_url, url));
                context.method = Some(method.as_str().to_string());
                Err(self.errors.handle_error(
                    RawError::other(format!("Failed to serialize request body: {e}")),
                    context,
                    HandleOptions::default(),
                ))
            }
        }
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: &RestRequest,
        url: &str,
        token: Option<&str>,
    ) -> Result<T, RawError> {
        let mut headers = request.headers.clone();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RawError::other(format!("Invalid access token header: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        log_trace!(
            method = %request.method,
            url = %url,
            authenticated = token.is_some(),
            "Dispatching REST request"
        );

        let mut builder = self.http.request(request.method.clone(), url).headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| RawError::from_reqwest(&e))?;
        let status = response.status();
        // A body that stalls past the client timeout fails here, after the status arrived
        let text = response.text().await.map_err(|e| RawError::from_reqwest(&e))?;

        if !status.is_success() {
            let body = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(RawError::http(status.as_u16(), body));
        }

        let value = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| RawError::Decode {
                status: status.as_u16(),
                message: format!("Invalid JSON response: {e}"),
            })?
        };

        serde_json::from_value(value).map_err(|e| RawError::Decode {
            status: status.as_u16(),
            message: format!("Unexpected response shape: {e}"),
        })
    }

    /// Run the refresh operation, storing a newly issued token.
    ///
    /// `sent` is the token the failed request carried. With single-flight on,
    /// a waiter that finds a different stored token reuses it.
    async fn refresh_token(
        &self,
        sent: Option<&str>,
        current: &str,
    ) -> Result<Option<String>, RawError> {
        if !self.config.single_flight_refresh {
            return self.run_refresh(current).await;
        }

        let _gate = self.refresh_gate.lock().await;
        match token_snapshot(self.credentials.as_ref()) {
            Some(latest) if Some(latest.as_str()) != sent => {
                log_debug!("Credential already refreshed by a concurrent request");
                Ok(Some(latest))
            }
            Some(latest) => self.run_refresh(&latest).await,
            None => Ok(None),
        }
    }

    async fn run_refresh(&self, stale: &str) -> Result<Option<String>, RawError> {
        let issued = self
            .refresher
            .refresh(stale)
            .await?
            .filter(|token| !token.is_empty());

        if let Some(token) = &issued {
            self.credentials.set_access_token(token);
        }
        Ok(issued)
    }
}

/// Join a request URL onto the base URL; absolute URLs pass through unchanged.
pub(crate) fn resolve_url(base_url: &str, url: &str) -> String {
    if base_url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if url.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

//! Token refresh operation.
//!
//! The REST wrapper calls a [`TokenRefresher`] when a request carrying a
//! credential comes back 401. Implementations return:
//! - `Ok(Some(token))`: a replacement access token
//! - `Ok(None)`: the backend answered but issued no token
//! - `Err(raw)`: the refresh call itself failed

use crate::core_types::RawError;
use crate::error::ConfigError;
use crate::logging::{log_debug, log_error};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

/// Exchanges the current access token for a new one.
///
/// May be called several times concurrently when independent requests hit a
/// 401 at the same time.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, current_token: &str) -> Result<Option<String>, RawError>;
}

/// Refresher for deployments without a refresh endpoint: a 401 always ends the session.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTokenRefresher;

#[async_trait]
impl TokenRefresher for DisabledTokenRefresher {
    async fn refresh(&self, _current_token: &str) -> Result<Option<String>, RawError> {
        log_debug!("Token refresh disabled, session cannot be renewed");
        Ok(None)
    }
}

/// Refresh over HTTP: `POST {url}` with `Authorization: <token>` and an empty
/// JSON object, answered by `{"accessToken": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::http_client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, current_token: &str) -> Result<Option<String>, RawError> {
        log_debug!(url = %self.url, "Requesting access token refresh");

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, current_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| {
                log_error!(url = %self.url, error = %e, "Refresh token request failed");
                RawError::from_reqwest(&e)
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            log_error!(url = %self.url, status = status, error = %e, "Refresh response body unreadable");
            RawError::from_reqwest(&e)
        })?;

        if !(200..300).contains(&status) {
            let body = serde_json::from_str::<serde_json::Value>(&text).ok();
            log_error!(url = %self.url, status = status, "Refresh token request rejected");
            return Err(RawError::http(status, body));
        }

        let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| RawError::Decode {
            status,
            message: format!("Invalid refresh response: {e}"),
        })?;

        Ok(body
            .get("accessToken")
            .and_then(|token| token.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string))
    }
}

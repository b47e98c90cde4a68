//! # resilient-access
//!
//! Resilient REST + GraphQL access layer with one normalized error model.
//!
//! ## Key Features
//!
//! - **Bearer Authentication**: The stored access token is attached to every call
//! - **Token Refresh**: A REST 401 refreshes the token and re-issues the request, with a bounded budget
//! - **Normalized Errors**: Every failure becomes a [`NormalizedError`] with a closed [`ErrorType`] taxonomy
//! - **Error Listeners**: Process-wide subscription to every failure (toasts, forced logout)
//!
//! ## Example
//!
//! ```rust,no_run
//! use resilient_access::{
//!     install_global_error_handler, AccessClient, AccessConfig, ErrorPresenter,
//!     InMemoryCredentialStore,
//! };
//! use std::sync::Arc;
//!
//! struct Ui;
//!
//! impl ErrorPresenter for Ui {
//!     fn show_toast(&self, message: &str) {
//!         eprintln!("{message}");
//!     }
//!     fn navigate_to_login(&self) {}
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = AccessConfig::default();
//! config.rest.base_url = "https://api.example.com".to_string();
//! config.graphql.endpoint = "https://api.example.com/graphql".to_string();
//! config.refresh_url = Some("https://api.example.com/auth/refresh".to_string());
//!
//! let store = Arc::new(InMemoryCredentialStore::new());
//! let client = AccessClient::from_config(config, store.clone())?;
//! let _handler = install_global_error_handler(client.errors(), store, Arc::new(Ui));
//!
//! client.sign_in("token-from-login");
//! let profile: serde_json::Value = client.rest().get("/me").await?;
//! let data: serde_json::Value = client
//!     .graphql()
//!     .request("query Viewer { viewer { id } }", None)
//!     .await?;
//! # let _ = (profile, data);
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Core types: error taxonomy and raw transport failures
pub mod core_types;

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub(crate) mod internals;

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod graphql;
pub mod listener;
pub mod normalize;
pub mod refresh;
pub mod rest;
pub mod service;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use client::AccessClient;
pub use config::{AccessConfig, GraphQlConfig, RestConfig};
pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use error::{AccessResult, ConfigError, ErrorContext, NormalizedError};
pub use graphql::GraphQlClient;
pub use internals::retry::RetryState;
pub use listener::{install_global_error_handler, plan_reaction, ErrorPresenter, Reaction};
pub use normalize::ErrorNormalizer;
pub use refresh::{DisabledTokenRefresher, HttpTokenRefresher, TokenRefresher};
pub use rest::{RestClient, RestRequest};
pub use service::{
    ErrorListener, ErrorService, HandleOptions, ListenerHandle, NoopRemoteSink, RemoteErrorSink,
};

// Re-export core types
pub use core_types::{
    ErrorSeverity, ErrorSource, ErrorType, GraphQlError, NetworkErrorKind, RawError,
};

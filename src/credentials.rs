//! Credential store boundary.
//!
//! The access layer only reads, replaces and clears the bearer access token.
//! Persistence is the application's concern; [`InMemoryCredentialStore`] is
//! provided for tests and for applications that keep the token in memory.

use crate::logging::log_debug;
use std::fmt::Debug;
use std::sync::RwLock;

/// Synchronous access-token storage shared by both transports.
///
/// An empty string counts as "no token". Every read is a snapshot; callers
/// must not assume the value survives an `.await`.
pub trait CredentialStore: Send + Sync + Debug {
    fn access_token(&self) -> Option<String>;

    fn set_access_token(&self, token: &str);

    fn clear_access_token(&self);
}

/// Read the stored token, treating an empty string as absent.
pub(crate) fn token_snapshot(store: &dyn CredentialStore) -> Option<String> {
    store.access_token().filter(|token| !token.is_empty())
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_access_token(&self, token: &str) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        log_debug!("Access token replaced");
    }

    fn clear_access_token(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        log_debug!("Access token cleared");
    }
}

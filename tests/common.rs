//! Test helper utilities for resilient-access integration tests
//!
//! This module provides reusable fixtures shared across the integration test files.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use resilient_access::{
    CredentialStore, ErrorService, GraphQlClient, GraphQlConfig, InMemoryCredentialStore,
    NormalizedError, RawError, RestClient, RestConfig, TokenRefresher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    pub Refresher {}

    #[async_trait]
    impl TokenRefresher for Refresher {
        async fn refresh(&self, current_token: &str) -> Result<Option<String>, RawError>;
    }
}

/// Credential store that counts writes so tests can assert on side effects.
#[derive(Debug, Default)]
pub struct RecordingCredentialStore {
    inner: InMemoryCredentialStore,
    sets: AtomicUsize,
    clears: AtomicUsize,
}

impl RecordingCredentialStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            inner: InMemoryCredentialStore::with_token(token),
            ..Self::default()
        }
    }

    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for RecordingCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.inner.access_token()
    }

    fn set_access_token(&self, token: &str) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set_access_token(token);
    }

    fn clear_access_token(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_access_token();
    }
}

/// Fast REST configuration pointed at a mock server.
pub fn rest_config(base_url: &str) -> RestConfig {
    RestConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        ..RestConfig::default()
    }
}

pub fn rest_client(
    config: RestConfig,
    store: Arc<RecordingCredentialStore>,
    refresher: MockRefresher,
    service: Arc<ErrorService>,
) -> RestClient {
    RestClient::new(config, store, Arc::new(refresher), service).expect("valid REST config")
}

pub fn graphql_client(
    endpoint: &str,
    store: Arc<RecordingCredentialStore>,
    service: Arc<ErrorService>,
) -> GraphQlClient {
    let config = GraphQlConfig {
        endpoint: endpoint.to_string(),
        timeout: Duration::from_secs(5),
    };
    GraphQlClient::new(config, store, service).expect("valid GraphQL config")
}

/// Refresher that must never be called.
pub fn unused_refresher() -> MockRefresher {
    let mut refresher = MockRefresher::new();
    refresher.expect_refresh().times(0);
    refresher
}

/// Collect every error broadcast by `service`.
pub fn capture_errors(service: &ErrorService) -> Arc<Mutex<Vec<NormalizedError>>> {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    service.add_error_listener(move |error| {
        sink.lock().unwrap().push(error.clone());
        Ok(())
    });
    captured
}

/// Local server that sends a 200 status line and headers, then stalls the body.
///
/// Returns the base URL. The connection stays open for `stall` so the client
/// times out while reading the body.
pub async fn stalled_body_server(stall: Duration) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.flush().await;
                tokio::time::sleep(stall).await;
            });
        }
    });

    format!("http://{addr}")
}

//! Integration Tests for AccessClient and the global error handler
//!
//! UNIT UNDER TEST: AccessClient facade with install_global_error_handler
//!
//! BUSINESS RESPONSIBILITY:
//!   - Wire both transports to one credential store and one error service
//!   - React to every failure from either transport in one place
//!   - Force logout on non-retryable auth failures
//!
//! TEST COVERAGE:
//!   - Toast on REST server errors, silence on validation errors
//!   - Forced logout on 403
//!   - Global service wiring through from_config
//!   - Sign-in and sign-out

mod common;

use common::{MockRefresher, RecordingCredentialStore};
use resilient_access::{
    install_global_error_handler, AccessClient, AccessConfig, CredentialStore, ErrorPresenter,
    ErrorService,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingPresenter {
    toasts: Mutex<Vec<String>>,
    logins: Mutex<usize>,
}

impl ErrorPresenter for RecordingPresenter {
    fn show_toast(&self, message: &str) {
        self.toasts.lock().unwrap().push(message.to_string());
    }

    fn navigate_to_login(&self) {
        *self.logins.lock().unwrap() += 1;
    }
}

fn access_config(server: &MockServer) -> AccessConfig {
    let mut config = AccessConfig::default();
    config.rest.base_url = format!("{}/api", server.uri());
    config.graphql.endpoint = format!("{}/graphql", server.uri());
    config
}

#[tokio::test]
async fn test_handler_reacts_to_both_transports() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Email is invalid", "extensions": {"code": "BAD_USER_INPUT"}}]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(RecordingCredentialStore::with_token("tok"));
    let service = Arc::new(ErrorService::new());
    let mut refresher = MockRefresher::new();
    refresher.expect_refresh().times(0);
    let client = AccessClient::with_parts(
        access_config(&server),
        store.clone(),
        Arc::new(refresher),
        service,
    )
    .expect("valid config");
    let presenter = Arc::new(RecordingPresenter::default());
    let _handle = install_global_error_handler(client.errors(), store.clone(), presenter.clone());

    // Act
    let rest_error = client.rest().get::<Value>("/items").await.unwrap_err();
    let graphql_error = client
        .graphql()
        .request::<Value>("mutation SignUp { signUp { id } }", None)
        .await
        .unwrap_err();

    // Assert
    assert_eq!(rest_error.message(), "db down");
    assert_eq!(graphql_error.message(), "Email is invalid");
    assert_eq!(
        *presenter.toasts.lock().unwrap(),
        vec!["Server error. Please try again later.".to_string()]
    );
    assert_eq!(*presenter.logins.lock().unwrap(), 0);
    assert_eq!(store.clear_count(), 0);
}

#[tokio::test]
async fn test_forbidden_forces_logout() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/items/1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "forbidden"})))
        .mount(&server)
        .await;

    let store = Arc::new(RecordingCredentialStore::with_token("tok"));
    let mut refresher = MockRefresher::new();
    refresher.expect_refresh().times(0);
    let client = AccessClient::with_parts(
        access_config(&server),
        store.clone(),
        Arc::new(refresher),
        Arc::new(ErrorService::new()),
    )
    .expect("valid config");
    let presenter = Arc::new(RecordingPresenter::default());
    let _handle = install_global_error_handler(client.errors(), store.clone(), presenter.clone());

    // Act
    let error = client.rest().delete::<Value>("/items/1").await.unwrap_err();

    // Assert
    assert!(error.should_logout());
    assert_eq!(*presenter.logins.lock().unwrap(), 1);
    assert!(presenter.toasts.lock().unwrap().is_empty());
    assert_eq!(store.access_token(), None);
}

#[tokio::test]
#[serial_test::serial]
async fn test_from_config_reports_through_global_service() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = Arc::new(RecordingCredentialStore::default());
    let client = AccessClient::from_config(access_config(&server), store).expect("valid config");
    let presenter = Arc::new(RecordingPresenter::default());
    let handle = install_global_error_handler(
        &ErrorService::global(),
        client.credentials().clone(),
        presenter.clone(),
    );

    // Act
    let _ = client.rest().get::<Value>("/status").await;
    handle.unsubscribe();

    // Assert
    assert!(Arc::ptr_eq(client.errors(), &ErrorService::global()));
    assert_eq!(presenter.toasts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sign_in_and_sign_out_drive_the_store() {
    // Arrange
    let server = MockServer::start().await;
    let store = Arc::new(RecordingCredentialStore::default());
    let client = AccessClient::with_parts(
        access_config(&server),
        store.clone(),
        Arc::new(MockRefresher::new()),
        Arc::new(ErrorService::new()),
    )
    .expect("valid config");

    // Act & Assert
    client.sign_in("issued-at-login");
    assert_eq!(store.access_token().as_deref(), Some("issued-at-login"));

    client.sign_out();
    assert_eq!(store.access_token(), None);
    assert_eq!(store.clear_count(), 1);
}

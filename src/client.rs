use crate::config::AccessConfig;
use crate::credentials::CredentialStore;
use crate::error::ConfigError;
use crate::graphql::GraphQlClient;
use crate::logging::{log_debug, log_info};
use crate::refresh::{DisabledTokenRefresher, HttpTokenRefresher, TokenRefresher};
use crate::rest::RestClient;
use crate::service::ErrorService;
use std::sync::Arc;

/// Both transport wrappers over one credential store and one error service.
/// This is the primary entry point for applications.
#[derive(Debug)]
pub struct AccessClient {
    rest: RestClient,
    graphql: GraphQlClient,
    errors: Arc<ErrorService>,
    credentials: Arc<dyn CredentialStore>,
}

impl AccessClient {
    /// Build from configuration, reporting through the global [`ErrorService`].
    ///
    /// A configured `refresh_url` enables [`HttpTokenRefresher`]; without one
    /// every 401 ends the session.
    pub fn from_config(
        config: AccessConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let refresher: Arc<dyn TokenRefresher> = match &config.refresh_url {
            Some(url) => Arc::new(HttpTokenRefresher::new(url.clone(), config.rest.timeout)?),
            None => Arc::new(DisabledTokenRefresher),
        };

        let errors = ErrorService::global();
        errors.set_dev_mode(config.dev_mode);

        Self::with_parts(config, credentials, refresher, errors)
    }

    /// Build from `ACCESS_*` environment variables.
    pub fn from_env(credentials: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
        let config = AccessConfig::from_env()?;
        Self::from_config(config, credentials)
    }

    /// Build from explicit collaborators.
    pub fn with_parts(
        config: AccessConfig,
        credentials: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        errors: Arc<ErrorService>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        log_debug!(
            rest_base_url = %config.rest.base_url,
            graphql_endpoint = %config.graphql.endpoint,
            has_refresh_url = config.refresh_url.is_some(),
            "Creating access client"
        );

        let rest = RestClient::new(
            config.rest,
            Arc::clone(&credentials),
            refresher,
            Arc::clone(&errors),
        )?;
        let graphql = GraphQlClient::new(config.graphql, Arc::clone(&credentials), Arc::clone(&errors))?;

        Ok(Self {
            rest,
            graphql,
            errors,
            credentials,
        })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn graphql(&self) -> &GraphQlClient {
        &self.graphql
    }

    pub fn errors(&self) -> &Arc<ErrorService> {
        &self.errors
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Store a token obtained from an external sign-in call.
    pub fn sign_in(&self, access_token: &str) {
        self.credentials.set_access_token(access_token);
        log_info!("Signed in");
    }

    pub fn sign_out(&self) {
        self.credentials.clear_access_token();
        log_info!("Signed out");
    }
}

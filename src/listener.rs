//! Process-wide error reaction.
//!
//! Install once at application startup. Every normalized error from either
//! transport is turned into a [`Reaction`] and carried out through an
//! application-supplied [`ErrorPresenter`].

use crate::core_types::ErrorType;
use crate::credentials::CredentialStore;
use crate::error::NormalizedError;
use crate::logging::{log_debug, log_info};
use crate::service::{ErrorService, ListenerHandle};
use std::sync::Arc;

/// UI surface the listener reacts through.
pub trait ErrorPresenter: Send + Sync {
    /// Show a transient, non-blocking notice.
    fn show_toast(&self, message: &str);

    /// Leave the authenticated area and show the sign-in screen.
    fn navigate_to_login(&self);
}

/// What the listener does for one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub toast: Option<String>,
    pub force_logout: bool,
}

/// Decide the reaction to an error.
///
/// Server, network and rate-limit (429) failures get a toast with the generic
/// user message. Validation and other client failures are left to the caller,
/// except 429. Non-retryable auth failures force a logout.
pub fn plan_reaction(error: &NormalizedError) -> Reaction {
    let rate_limited = error.status_code() == Some(429);
    let system_level = matches!(error.error_type(), ErrorType::Server | ErrorType::Network);

    let show_toast = rate_limited || system_level;

    Reaction {
        toast: show_toast.then(|| error.user_message(None)),
        force_logout: error.should_logout(),
    }
}

/// Subscribe the standard reaction to `service`.
///
/// Keep the returned handle to uninstall the listener.
pub fn install_global_error_handler(
    service: &ErrorService,
    credentials: Arc<dyn CredentialStore>,
    presenter: Arc<dyn ErrorPresenter>,
) -> ListenerHandle {
    log_info!("Installing global error handler");

    service.add_error_listener(move |error| {
        let reaction = plan_reaction(error);

        if let Some(message) = &reaction.toast {
            presenter.show_toast(message);
        }

        if reaction.force_logout {
            log_info!(
                error_id = %error.id(),
                "Auth error detected, forcing logout"
            );
            credentials.clear_access_token();
            presenter.navigate_to_login();
        }

        if error.error_type() == ErrorType::Network {
            log_debug!(error_id = %error.id(), "Network error, check connection");
        }

        Ok(())
    })
}

//! Central error service.
//!
//! Every failure from either transport passes through [`ErrorService::handle_error`]:
//! it is normalized, logged, forwarded to the remote sink and broadcast to all
//! registered listeners before being returned to the caller.
//!
//! The listener registry is process-wide state. [`ErrorService::global`] returns
//! the shared instance (empty at startup, never torn down); independent
//! instances can be created with [`ErrorService::new`] when isolation is needed.

use crate::core_types::{ErrorSeverity, GraphQlError, RawError};
use crate::error::{ErrorContext, NormalizedError};
use crate::logging::{log_debug, log_error, log_info, log_warn};
use crate::normalize::ErrorNormalizer;
use once_cell::sync::Lazy;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback invoked with every normalized error.
///
/// Returning `Err` (or panicking) is logged and never reaches the caller.
pub type ErrorListener = Arc<dyn Fn(&NormalizedError) -> anyhow::Result<()> + Send + Sync>;

static GLOBAL: Lazy<Arc<ErrorService>> = Lazy::new(|| Arc::new(ErrorService::new()));

// ============================================================================
// Options and remote sink
// ============================================================================

/// Per-call switches for [`ErrorService::handle_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleOptions {
    /// Emit the structured diagnostic log. Defaults to `true`.
    pub log_to_console: bool,
    /// Forward to the remote sink. Defaults to `true`.
    pub log_to_remote: bool,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            log_to_console: true,
            log_to_remote: true,
        }
    }
}

impl HandleOptions {
    /// Notify listeners only.
    pub fn silent() -> Self {
        Self {
            log_to_console: false,
            log_to_remote: false,
        }
    }
}

/// Remote telemetry destination (crash reporter, error tracker).
pub trait RemoteErrorSink: Send + Sync {
    fn capture(&self, error: &NormalizedError);
}

/// Sink used when no remote tracker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRemoteSink;

impl RemoteErrorSink for NoopRemoteSink {
    fn capture(&self, _error: &NormalizedError) {}
}

// ============================================================================
// Listener registry
// ============================================================================

#[derive(Default)]
struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, ErrorListener)>>,
}

impl ListenerRegistry {
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, ErrorListener)>> {
        // A listener never runs while the lock is held, so a poisoned lock still holds a valid list.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add(&self, listener: ErrorListener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries().push((id, listener));
        id
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    fn snapshot(&self) -> Vec<(u64, ErrorListener)> {
        self.entries().clone()
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Handle returned by [`ErrorService::add_error_listener`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    /// Remove exactly the listener this handle was created for.
    ///
    /// Repeated calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                log_debug!(listener_id = self.id, "Error listener removed");
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

// ============================================================================
// Error service
// ============================================================================

/// Normalizes, logs and broadcasts every transport failure.
pub struct ErrorService {
    listeners: Arc<ListenerRegistry>,
    remote: Arc<dyn RemoteErrorSink>,
    dev_mode: AtomicBool,
}

impl Default for ErrorService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorService")
            .field("listeners", &self.listeners)
            .field("dev_mode", &self.is_dev_mode())
            .finish()
    }
}

impl ErrorService {
    /// Create an isolated service with no listeners and no remote sink.
    pub fn new() -> Self {
        Self::with_remote_sink(Arc::new(NoopRemoteSink))
    }

    pub fn with_remote_sink(remote: Arc<dyn RemoteErrorSink>) -> Self {
        Self {
            listeners: Arc::new(ListenerRegistry::default()),
            remote,
            dev_mode: AtomicBool::new(false),
        }
    }

    /// The process-wide service shared by every client built without an explicit one.
    pub fn global() -> Arc<ErrorService> {
        Arc::clone(&GLOBAL)
    }

    /// Include original error details in diagnostic logs.
    pub fn set_dev_mode(&self, enabled: bool) {
        self.dev_mode.store(enabled, Ordering::Relaxed);
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode.load(Ordering::Relaxed)
    }

    /// Normalize, log, report and broadcast a failure, then hand it back.
    pub fn handle_error(
        &self,
        raw: impl Into<Arc<RawError>>,
        context: ErrorContext,
        options: HandleOptions,
    ) -> NormalizedError {
        let normalized = ErrorNormalizer::normalize(raw.into(), context);

        if options.log_to_console {
            self.log_normalized(&normalized);
        }

        if options.log_to_remote {
            self.remote.capture(&normalized);
        }

        self.notify_listeners(&normalized);

        normalized
    }

    /// [`handle_error`](Self::handle_error) with a REST context.
    pub fn handle_rest_error(
        &self,
        raw: impl Into<Arc<RawError>>,
        endpoint: Option<String>,
        method: Option<String>,
        options: HandleOptions,
    ) -> NormalizedError {
        self.handle_error(raw, ErrorContext::rest(endpoint, method), options)
    }

    /// [`handle_error`](Self::handle_error) with a GraphQL context.
    pub fn handle_graphql_error(
        &self,
        raw: impl Into<Arc<RawError>>,
        operation: Option<String>,
        variables: Option<serde_json::Value>,
        options: HandleOptions,
    ) -> NormalizedError {
        self.handle_error(raw, ErrorContext::graphql(operation, variables), options)
    }

    pub fn is_auth_error(&self, error: &NormalizedError) -> bool {
        error.is_auth_error()
    }

    pub fn should_logout(&self, error: &NormalizedError) -> bool {
        error.should_logout()
    }

    pub fn get_user_message(&self, error: &NormalizedError, custom: Option<&str>) -> String {
        error.user_message(custom)
    }

    pub fn get_graphql_errors<'e>(&self, error: &'e NormalizedError) -> &'e [GraphQlError] {
        error.graphql_errors()
    }

    /// Register a listener for every future normalized error.
    pub fn add_error_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&NormalizedError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.listeners.add(Arc::new(listener));
        log_debug!(listener_id = id, "Error listener registered");
        ListenerHandle {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify_listeners(&self, error: &NormalizedError) {
        for (listener_id, listener) in self.listeners.snapshot() {
            match catch_unwind(AssertUnwindSafe(|| listener(error))) {
                Ok(Ok(())) => {}
                Ok(Err(listener_error)) => {
                    log_error!(
                        listener_id = listener_id,
                        error_id = %error.id(),
                        listener_error = %listener_error,
                        "Error in error listener"
                    );
                }
                Err(_panic) => {
                    log_error!(
                        listener_id = listener_id,
                        error_id = %error.id(),
                        "Error listener panicked"
                    );
                }
            }
        }
    }

    fn log_normalized(&self, error: &NormalizedError) {
        let context = serde_json::to_string(error.context()).unwrap_or_default();
        let original = if self.is_dev_mode() {
            format!("{:?}", error.original_error())
        } else {
            String::new()
        };

        macro_rules! emit {
            ($log:ident) => {
                $log!(
                    error_id = %error.id(),
                    error_type = %error.error_type(),
                    source = %error.error_source(),
                    error_message = %error.message(),
                    context = %context,
                    status = ?error.status_code(),
                    code = ?error.error_code(),
                    timestamp = %error.timestamp_iso(),
                    retryable = error.is_retryable(),
                    original_error = %original,
                    "[{}] {}",
                    error.error_source(),
                    error.error_type()
                )
            };
        }

        match error.error_type().severity() {
            ErrorSeverity::Error => emit!(log_error),
            ErrorSeverity::Warning => emit!(log_warn),
            ErrorSeverity::Info => emit!(log_info),
        }
    }
}

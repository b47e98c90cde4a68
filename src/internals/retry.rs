//! Per-call auth retry accounting for the REST wrapper.
//!
//! A [`RetryState`] value lives for exactly one logical REST call and is threaded
//! through every re-issued attempt of that call. Nothing is stored on the request.

use crate::logging::log_debug;

/// Number of 401-triggered refreshes a single REST call has consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record another 401 and return the updated count.
    pub fn advance(&mut self) -> u32 {
        self.attempt = self.attempt.saturating_add(1);
        log_debug!(attempt = self.attempt, "Auth retry attempt recorded");
        self.attempt
    }

    /// True once more 401s were seen than `max_auth_retries` allows.
    pub fn exhausted(&self, max_auth_retries: u32) -> bool {
        self.attempt > max_auth_retries
    }
}

//! Logging utilities for resilient-access
//!
//! Re-exports tracing macros with log_* naming so every module logs the same way.
//! The crate never installs a subscriber; that is left to the application.

pub use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    trace as log_trace,
    warn as log_warn,
};

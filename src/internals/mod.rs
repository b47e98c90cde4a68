//! Internal utilities for resilient-access
//!
//! Implementation details that are not part of the public API.
//! [`RetryState`](retry::RetryState) is re-exported through `lib.rs`.

pub mod retry;

// Test modules for resilient-access crate
//
// Each source file has a corresponding test file that focuses on business
// logic verification. HTTP round trips live in the integration tests under
// tests/.

// Test helper utilities
pub mod helpers;

pub mod graphql;

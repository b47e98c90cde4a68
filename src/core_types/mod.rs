//! Core types shared by the normalizer, the error service and both transports
//!
//! ## Organization
//! - `errors` - Error taxonomy (type, source, severity)
//! - `raw` - Tagged transport failures and GraphQL error entries

pub mod errors;
pub mod raw;

// Re-export commonly used types
pub use errors::{ErrorSeverity, ErrorSource, ErrorType};
pub use raw::{GraphQlError, NetworkErrorKind, RawError};

//! # Offline Cache Error Types

use thiserror::Error;

/// Errors that can occur during offline cache operations.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// The persistent medium rejected a read or write (unavailable, quota,
    /// corruption). Never retried; surfaced to the caller as-is.
    #[error("Storage failure: {0}")]
    Storage(String),

    /// The network transfer of track bytes did not succeed. No partial
    /// record is ever persisted, and the transfer is not retried.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The external API failed to issue a usable signed URL; caching aborts
    /// before any transfer is attempted.
    #[error("Signed URL request failed: {0}")]
    SignedUrl(String),
}

/// Result type for offline cache operations.
pub type Result<T> = std::result::Result<T, OfflineError>;

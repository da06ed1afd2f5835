//! Error types for controller and animation operations.
//!
//! Every fallible operation in the crate returns [`TableError`]. The HTTP and
//! CLI surfaces only ever show the error's message; callers that want to react
//! programmatically can match on the variant or ask [`TableError::is_retryable`].
//!
//! ## Error Categories
//!
//! - **Validation**: bad input such as a malformed colormap, an unknown palette
//!   name or a direction that is not one of the four table edges
//! - **Connection**: dialing or closing the TCP session failed
//! - **Protocol**: the controller did not acknowledge a command with `0x31`
//! - **State**: the operation needs a precondition that does not hold
//! - **BufferBounds**: a pixel index would fall outside the frame buffer
//! - **Timeout**: the optional acknowledgement deadline expired
//!
//! ```rust
//! use sp108e_table::TableError;
//!
//! let error = TableError::state("no active direction");
//! assert!(!error.is_retryable());
//! assert_eq!(error.to_string(), "Invalid state: no active direction");
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for table operations.
pub type Result<T, E = TableError> = std::result::Result<T, E>;

/// Main error type for table operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TableError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Connection error: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Protocol error: {reason}")]
    Protocol { reason: String },

    #[error("Invalid state: {reason}")]
    State { reason: String },

    #[error("Pixel {pixel} is out of bounds for a frame of {pixels} pixels")]
    BufferBounds { pixel: usize, pixels: usize },

    #[error("Acknowledgement timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl TableError {
    /// Returns whether the operation may succeed if simply tried again.
    ///
    /// Transport problems are retryable because the link heals itself on the
    /// next send; bad input and unmet preconditions are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            TableError::Connection { .. } => true,
            TableError::Protocol { .. } => true,
            TableError::Timeout { .. } => true,
            TableError::Validation { .. } => false,
            TableError::State { .. } => false,
            TableError::BufferBounds { .. } => false,
        }
    }

    /// Helper constructor for validation errors.
    pub fn validation(reason: impl Into<String>) -> Self {
        TableError::Validation { reason: reason.into() }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TableError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TableError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for protocol errors.
    pub fn protocol(reason: impl Into<String>) -> Self {
        TableError::Protocol { reason: reason.into() }
    }

    /// Helper constructor for state errors.
    pub fn state(reason: impl Into<String>) -> Self {
        TableError::State { reason: reason.into() }
    }

    /// Helper constructor for frame buffer bounds errors.
    pub fn buffer_bounds(pixel: usize, pixels: usize) -> Self {
        TableError::BufferBounds { pixel, pixels }
    }
}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::connection_failed_with_source(err.to_string(), Box::new(err))
    }
}

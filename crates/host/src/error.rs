//! Error types for host service calls

use thiserror::Error;

/// Errors reported by host collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The referenced item does not exist in the host
    #[error("Not found: {0}")]
    NotFound(String),

    /// A lifecycle transition was requested from the wrong state
    #[error("Invalid lifecycle state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },

    /// The service could not be reached or failed internally
    #[error("Host service unavailable: {0}")]
    Unavailable(String),

    /// The host refused the request
    #[error("Rejected by host: {0}")]
    Rejected(String),
}

impl HostError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Result type for host service calls
pub type HostResult<T> = std::result::Result<T, HostError>;

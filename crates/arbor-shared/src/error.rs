use thiserror::Error;

/// Failures reported by the authoritative source across the transport
/// boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transient; the caller may retry.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

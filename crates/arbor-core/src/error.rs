use arbor_shared::RemoteError;
use thiserror::Error;

use crate::model::CommentId;

/// Errors produced by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Rejected before any local mutation (e.g. an empty message).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The actor is not the author of the comment.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// The comment is absent from the store.
    #[error("Comment not found: {0}")]
    NotFound(String),

    /// The comment has no authoritative id yet, so the remote cannot address it.
    #[error("Comment {0} is still awaiting confirmation")]
    Unconfirmed(CommentId),

    /// The handle was already confirmed or rejected, or belongs to another session.
    #[error("Mutation {0} is not pending")]
    NotPending(u64),

    /// The remote confirmation failed; eligible for a caller-driven retry.
    #[error("Transient error: {0}")]
    Transient(String),
}

impl CoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Transient(_))
    }

    /// Local, synchronous rejections that never touched the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::Unconfirmed(_) | CoreError::NotPending(_)
        )
    }
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound(msg) => CoreError::NotFound(msg),
            RemoteError::Unauthorized(msg) => CoreError::Authorization(msg),
            RemoteError::InvalidInput(msg) => CoreError::Validation(msg),
            RemoteError::Unavailable(msg) => CoreError::Transient(msg),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;

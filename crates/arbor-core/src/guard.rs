//! Authorship check for edits and deletes.

use arbor_shared::UserId;

use crate::error::{CoreError, Result};
use crate::model::Comment;

/// Only the author of a comment may change or remove it. No roles, no
/// override.
pub fn can_mutate(actor: &UserId, comment: &Comment) -> bool {
    *actor == comment.author.id
}

pub fn authorize(actor: &UserId, comment: &Comment) -> Result<()> {
    if can_mutate(actor, comment) {
        Ok(())
    } else {
        Err(CoreError::Authorization(format!(
            "user {actor} may not modify comment {}",
            comment.id
        )))
    }
}

//! Ordered in-memory comments of one post.

use arbor_shared::PostId;

use crate::error::{CoreError, Result};
use crate::model::{recency_order, Comment, CommentId};

/// The comments of a single post, most-recent first.
///
/// Operations are linear in the number of comments.
#[derive(Debug, Clone)]
pub struct EntityStore {
    post_id: PostId,
    comments: Vec<Comment>,
}

impl EntityStore {
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            comments: Vec::new(),
        }
    }

    /// Build a store from an authoritative snapshot, establishing the
    /// recency ordering. Comments from other posts are dropped.
    pub fn from_snapshot(post_id: PostId, comments: Vec<Comment>) -> Self {
        let mut comments: Vec<Comment> = comments
            .into_iter()
            .filter(|c| {
                if c.post_id != post_id {
                    tracing::warn!(comment = %c.id, "dropping comment from another post");
                    return false;
                }
                true
            })
            .collect();
        comments.sort_by(recency_order);
        Self { post_id, comments }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Prepend a comment. Its id must not already be present.
    pub fn insert(&mut self, comment: Comment) {
        debug_assert_eq!(comment.post_id, self.post_id);
        debug_assert!(!self.contains(&comment.id));
        self.comments.insert(0, comment);
    }

    /// Put a comment back at a former position, clamped to the current length.
    pub fn reinsert_at(&mut self, position: usize, comment: Comment) {
        let position = position.min(self.comments.len());
        self.comments.insert(position, comment);
    }

    /// Swap the comment stored under `id` for `comment`, keeping its position.
    /// Returns the comment that was replaced.
    pub fn replace(&mut self, id: &CommentId, comment: Comment) -> Result<Comment> {
        let slot = self
            .comments
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        Ok(std::mem::replace(slot, comment))
    }

    /// Remove a comment, returning it with the position it occupied.
    pub fn remove(&mut self, id: &CommentId) -> Option<(usize, Comment)> {
        let position = self.position(id)?;
        Some((position, self.comments.remove(position)))
    }

    /// Point every reply to `old` at `new` instead. Returns how many moved.
    pub fn repoint_children(&mut self, old: &CommentId, new: &CommentId) -> usize {
        let mut moved = 0;
        for comment in self.comments.iter_mut() {
            if comment.parent_id.as_ref() == Some(old) {
                comment.parent_id = Some(*new);
                moved += 1;
            }
        }
        moved
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == *id)
    }

    pub fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == *id)
    }

    pub fn position(&self, id: &CommentId) -> Option<usize> {
        self.comments.iter().position(|c| c.id == *id)
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.position(id).is_some()
    }

    pub fn as_slice(&self) -> &[Comment] {
        &self.comments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

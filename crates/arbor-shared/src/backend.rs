//! The transport/persistence contract the engine talks to.
//!
//! Implementations act on behalf of a single asserted actor, fixed when the
//! backend is constructed. Authorization for edits and deletes is enforced by
//! the implementation as well as by the engine.

use uuid::Uuid;

use crate::error::RemoteError;
use crate::protocol::{
    CommentDto, CommentMessage, DeletedComment, LikeToggled, NewComment, PostDetail, PostSummary,
};
use crate::types::{PostId, UserId};

#[allow(async_fn_in_trait)]
pub trait CommentBackend {
    /// The actor every call is made as.
    fn actor(&self) -> UserId;

    async fn list_posts(&self) -> Result<Vec<PostSummary>, RemoteError>;

    async fn get_post(&self, post_id: PostId) -> Result<PostDetail, RemoteError>;

    async fn create_comment(
        &self,
        post_id: PostId,
        comment: &NewComment,
    ) -> Result<CommentDto, RemoteError>;

    /// Fails with [`RemoteError::Unauthorized`] unless the actor wrote the comment.
    async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: Uuid,
        message: &str,
    ) -> Result<CommentMessage, RemoteError>;

    /// Fails with [`RemoteError::Unauthorized`] unless the actor wrote the comment.
    async fn delete_comment(
        &self,
        post_id: PostId,
        comment_id: Uuid,
    ) -> Result<DeletedComment, RemoteError>;

    async fn toggle_like(
        &self,
        post_id: PostId,
        comment_id: Uuid,
    ) -> Result<LikeToggled, RemoteError>;
}

//! In-process [`CommentBackend`] over a shared [`Database`].

use std::sync::Arc;

use arbor_shared::protocol::{
    CommentDto, CommentMessage, DeletedComment, LikeToggled, NewComment, PostDetail, PostSummary,
};
use arbor_shared::{CommentBackend, PostId, RemoteError, UserId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::database::Database;

/// Talks to the store directly, acting as one user.
#[derive(Clone)]
pub struct LocalBackend {
    db: Arc<Mutex<Database>>,
    actor: UserId,
}

impl LocalBackend {
    pub fn new(db: Arc<Mutex<Database>>, actor: UserId) -> Self {
        Self { db, actor }
    }

    /// Same database, different actor.
    pub fn as_actor(&self, actor: UserId) -> Self {
        Self {
            db: Arc::clone(&self.db),
            actor,
        }
    }

    pub fn database(&self) -> &Arc<Mutex<Database>> {
        &self.db
    }
}

impl CommentBackend for LocalBackend {
    fn actor(&self) -> UserId {
        self.actor
    }

    async fn list_posts(&self) -> Result<Vec<PostSummary>, RemoteError> {
        let db = self.db.lock().await;
        Ok(db.list_posts()?)
    }

    async fn get_post(&self, post_id: PostId) -> Result<PostDetail, RemoteError> {
        let db = self.db.lock().await;
        Ok(db.get_post(post_id, self.actor)?)
    }

    async fn create_comment(&self, post_id: PostId, comment: &NewComment) -> Result<CommentDto, RemoteError> {
        let mut db = self.db.lock().await;
        Ok(db.create_comment(post_id, self.actor, comment)?)
    }

    async fn update_comment(
        &self,
        post_id: PostId,
        comment_id: Uuid,
        message: &str,
    ) -> Result<CommentMessage, RemoteError> {
        let mut db = self.db.lock().await;
        Ok(db.update_comment(self.actor, post_id, comment_id, message)?)
    }

    async fn delete_comment(&self, post_id: PostId, comment_id: Uuid) -> Result<DeletedComment, RemoteError> {
        let mut db = self.db.lock().await;
        Ok(db.delete_comment(self.actor, post_id, comment_id)?)
    }

    async fn toggle_like(&self, post_id: PostId, comment_id: Uuid) -> Result<LikeToggled, RemoteError> {
        let mut db = self.db.lock().await;
        let liked = db.toggle_like(self.actor, post_id, comment_id)?;
        Ok(LikeToggled { liked })
    }
}

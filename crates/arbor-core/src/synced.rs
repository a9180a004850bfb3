//! Drives a [`PostSession`] against a [`CommentBackend`].
//!
//! Each operation applies its optimistic effect, awaits the backend, then
//! confirms or rejects. On failure the configured [`Rollback`] policy is
//! applied and the mapped [`CoreError`] is returned; nothing is retried
//! automatically. A create kept after a failure can later be re-sent with
//! [`SyncedSession::retry_create`] or dropped with [`SyncedSession::discard`].

use arbor_shared::{CommentBackend, PostId};
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::model::{Author, CommentId};
use crate::session::{MutationHandle, PostSession, Rollback};

pub struct SyncedSession<B> {
    backend: B,
    session: PostSession,
    on_failure: Rollback,
}

impl<B: CommentBackend> SyncedSession<B> {
    /// Fetch a post and open a session on it as the backend's actor.
    pub async fn load(backend: B, post_id: PostId, viewer_name: impl Into<String>) -> Result<Self> {
        let detail = backend.get_post(post_id).await?;
        let viewer = Author::new(backend.actor(), viewer_name);
        info!(
            post = %post_id,
            actor = %viewer.id.short(),
            comments = detail.comments.len(),
            "post loaded"
        );
        Ok(Self {
            session: PostSession::from_detail(detail, viewer),
            backend,
            on_failure: Rollback::Keep,
        })
    }

    /// What to do with local state when the backend refuses a mutation.
    pub fn with_rollback(mut self, on_failure: Rollback) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn session(&self) -> &PostSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PostSession {
        &mut self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn reload(&mut self) -> Result<()> {
        let detail = self.backend.get_post(self.session.post().id).await?;
        self.session.refresh(detail);
        Ok(())
    }

    /// Create a comment and return its authoritative id.
    ///
    /// Replying to a comment that is still provisional is refused up front.
    pub async fn create(&mut self, parent: Option<CommentId>, message: &str) -> Result<CommentId> {
        if let Some(pending) = parent.filter(CommentId::is_provisional) {
            return Err(CoreError::Unconfirmed(pending));
        }
        let handle = self.session.begin_create(parent, message)?;
        self.send_create(handle).await
    }

    /// Re-send a provisional comment kept after a failed create.
    pub async fn retry_create(&mut self, id: CommentId) -> Result<CommentId> {
        let handle = self.session.begin_resend(id)?;
        info!(comment = %id, "retrying create");
        self.send_create(handle).await
    }

    /// Drop a provisional comment without contacting the backend.
    pub fn discard(&mut self, id: CommentId) -> Result<()> {
        self.session.discard(id)?;
        Ok(())
    }

    async fn send_create(&mut self, handle: MutationHandle) -> Result<CommentId> {
        let request = match self.session.outgoing_create(handle) {
            Ok(request) => request,
            Err(err) => return self.fail(handle, err),
        };

        match self
            .backend
            .create_comment(self.session.post().id, &request)
            .await
        {
            Ok(dto) => {
                let id = CommentId::Remote(dto.id);
                self.session.confirm_create(handle, dto)?;
                Ok(id)
            }
            Err(err) => self.fail(handle, err.into()),
        }
    }

    pub async fn update(&mut self, id: CommentId, message: &str) -> Result<()> {
        let remote = id.remote().ok_or(CoreError::Unconfirmed(id))?;
        let handle = self.session.begin_update(id, message)?;

        match self
            .backend
            .update_comment(self.session.post().id, remote, message)
            .await
        {
            Ok(updated) => {
                self.session.confirm_update(handle, &updated.message)?;
                Ok(())
            }
            Err(err) => self.fail(handle, err.into()),
        }
    }

    pub async fn delete(&mut self, id: CommentId) -> Result<()> {
        let remote = id.remote().ok_or(CoreError::Unconfirmed(id))?;
        let handle = self.session.begin_delete(id)?;

        match self
            .backend
            .delete_comment(self.session.post().id, remote)
            .await
        {
            Ok(_) => {
                self.session.confirm_delete(handle)?;
                Ok(())
            }
            Err(err) => self.fail(handle, err.into()),
        }
    }

    /// Toggle the actor's like and return the authoritative state.
    pub async fn toggle_like(&mut self, id: CommentId) -> Result<bool> {
        let remote = id.remote().ok_or(CoreError::Unconfirmed(id))?;
        let actor = self.backend.actor();
        let (handle, _) = self.session.begin_toggle_like(id, actor)?;

        match self
            .backend
            .toggle_like(self.session.post().id, remote)
            .await
        {
            Ok(toggled) => {
                self.session.confirm_like(handle, toggled.liked)?;
                Ok(toggled.liked)
            }
            Err(err) => self.fail(handle, err.into()),
        }
    }

    fn fail<T>(&mut self, handle: MutationHandle, err: CoreError) -> Result<T> {
        warn!(mutation = handle.id(), error = %err, "backend refused mutation");
        self.session.reject(handle, self.on_failure)?;
        Err(err)
    }
}

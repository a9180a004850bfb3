//! Per-post session: the optimistic mutation engine.
//!
//! Every mutation runs in two phases. `begin_*` validates, authorizes and
//! applies the change locally, returning a [`MutationHandle`]. The caller then
//! talks to the authoritative source and resolves the handle exactly once,
//! with the matching `confirm_*` or with [`PostSession::reject`]. The tree
//! index is rebuilt at each phase transition that changes the sequence.
//!
//! The session never rolls back on its own: a rejected mutation stays applied
//! unless the caller asks for [`Rollback::Revert`].

use std::collections::HashMap;

use arbor_shared::constants::MAX_MESSAGE_SIZE;
use arbor_shared::protocol::{CommentDto, NewComment, PostDetail};
use arbor_shared::UserId;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::entity_store::EntityStore;
use crate::error::{CoreError, Result};
use crate::guard;
use crate::index::{rebuild_index, TreeIndex};
use crate::likes::LikeLedger;
use crate::model::{Author, Comment, CommentId, Post};

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    ToggleLike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationState {
    Pending,
    Confirmed,
    Rejected,
}

/// What to do with the optimistic effect of a rejected mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rollback {
    /// Leave local state as it is.
    #[default]
    Keep,
    /// Undo the optimistic effect.
    Revert,
}

/// Result of applying a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Applied,
    /// The target no longer exists locally; nothing was changed.
    Stale,
}

/// Ticket for one in-flight mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationHandle {
    id: u64,
    kind: MutationKind,
}

impl MutationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }
}

#[derive(Debug, Clone)]
enum Undo {
    Create,
    Update {
        previous: String,
    },
    Delete {
        position: usize,
        comment: Box<Comment>,
        likers: Vec<UserId>,
    },
    ToggleLike {
        actor: UserId,
    },
}

#[derive(Debug, Clone)]
struct PendingMutation {
    target: CommentId,
    undo: Undo,
}

// ---------------------------------------------------------------------------
// PostSession
// ---------------------------------------------------------------------------

/// The comments of one post as seen by one viewer, plus every mutation that
/// viewer has in flight.
#[derive(Debug, Clone)]
pub struct PostSession {
    post: Post,
    viewer: Author,
    store: EntityStore,
    index: TreeIndex,
    likes: LikeLedger,
    pending: HashMap<u64, PendingMutation>,
    resolved: HashMap<u64, MutationState>,
    next_handle: u64,
    next_provisional: u64,
}

impl PostSession {
    pub fn new(post: Post, viewer: Author, comments: Vec<Comment>) -> Self {
        let store = EntityStore::from_snapshot(post.id, comments);
        let index = rebuild_index(store.as_slice());
        let likes = LikeLedger::seed(viewer.id, store.iter());
        Self {
            post,
            viewer,
            store,
            index,
            likes,
            pending: HashMap::new(),
            resolved: HashMap::new(),
            next_handle: 1,
            next_provisional: 1,
        }
    }

    /// Open a session on an authoritative post snapshot.
    pub fn from_detail(detail: PostDetail, viewer: Author) -> Self {
        let post = Post::from(&detail);
        let comments = detail
            .comments
            .into_iter()
            .map(|dto| Comment::from_dto(post.id, dto))
            .collect();
        Self::new(post, viewer, comments)
    }

    /// Replace every comment with a fresh authoritative snapshot.
    ///
    /// In-flight handles stay valid; confirmations for comments the snapshot
    /// no longer contains resolve as [`Confirmation::Stale`]. Outcomes of
    /// already resolved handles are forgotten.
    pub fn refresh(&mut self, detail: PostDetail) {
        self.post = Post::from(&detail);
        let comments = detail
            .comments
            .into_iter()
            .map(|dto| Comment::from_dto(self.post.id, dto))
            .collect();
        self.store = EntityStore::from_snapshot(self.post.id, comments);
        self.likes = LikeLedger::seed(self.viewer.id, self.store.iter());
        self.resolved.clear();
        self.reindex();
        info!(post = %self.post.id, comments = self.store.len(), "session refreshed");
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn viewer(&self) -> &Author {
        &self.viewer
    }

    pub fn comments(&self) -> &[Comment] {
        self.store.as_slice()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.store.get(id)
    }

    pub fn root_comments(&self) -> Vec<&Comment> {
        self.index.replies(self.store.as_slice(), None)
    }

    /// Direct replies to `parent` (roots for `None`), newest first. Unknown
    /// and deleted parents are fine: replies of a deleted comment are still
    /// returned.
    pub fn replies(&self, parent: Option<&CommentId>) -> Vec<&Comment> {
        self.index.replies(self.store.as_slice(), parent)
    }

    pub fn reply_total(&self, id: &CommentId) -> usize {
        self.index.subtree_size(self.store.as_slice(), id)
    }

    /// Replies whose parent is gone from the session.
    pub fn orphans(&self) -> Vec<&Comment> {
        self.index
            .orphan_parents(self.store.as_slice())
            .iter()
            .flat_map(|parent| self.replies(Some(parent)))
            .collect()
    }

    pub fn can_mutate(&self, comment: &Comment) -> bool {
        guard::can_mutate(&self.viewer.id, comment)
    }

    pub fn state(&self, handle: MutationHandle) -> Option<MutationState> {
        if self.pending.contains_key(&handle.id) {
            return Some(MutationState::Pending);
        }
        self.resolved.get(&handle.id).copied()
    }

    /// Current target of a pending mutation. Follows re-keying on confirmation.
    pub fn target(&self, handle: MutationHandle) -> Option<CommentId> {
        self.pending.get(&handle.id).map(|p| p.target)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a provisional comment authored by the viewer.
    ///
    /// `parent` may itself be provisional; the reply is re-pointed when the
    /// parent is confirmed.
    pub fn begin_create(&mut self, parent: Option<CommentId>, message: &str) -> Result<MutationHandle> {
        validate_message(message)?;

        let id = CommentId::Provisional(self.next_provisional);
        self.next_provisional += 1;

        self.store.insert(Comment {
            id,
            post_id: self.post.id,
            parent_id: parent,
            author: self.viewer.clone(),
            message: message.to_string(),
            created_at: Utc::now(),
            like_count: 0,
            liked_by_me: false,
        });
        self.reindex();

        debug!(comment = %id, parent = ?parent, "provisional comment inserted");
        Ok(self.track(MutationKind::Create, id, Undo::Create))
    }

    /// The request to send for a pending create.
    ///
    /// Fails with [`CoreError::Unconfirmed`] while the parent is still
    /// provisional.
    pub fn outgoing_create(&self, handle: MutationHandle) -> Result<NewComment> {
        let pending = self.pending_of(handle, MutationKind::Create)?;
        let comment = self
            .store
            .get(&pending.target)
            .ok_or_else(|| CoreError::NotFound(pending.target.to_string()))?;

        let parent_id = match comment.parent_id {
            None => None,
            Some(parent) => Some(parent.remote().ok_or(CoreError::Unconfirmed(parent))?),
        };

        Ok(NewComment {
            message: comment.message.clone(),
            parent_id,
        })
    }

    /// Supersede the provisional comment with the authoritative one.
    pub fn confirm_create(&mut self, handle: MutationHandle, authoritative: CommentDto) -> Result<Confirmation> {
        let pending = self.take_pending(handle, MutationKind::Create, MutationState::Confirmed)?;
        let provisional = pending.target;

        if !self.store.contains(&provisional) {
            debug!(comment = %provisional, "confirmation for a discarded comment ignored");
            return Ok(Confirmation::Stale);
        }

        let confirmed = Comment::from_dto(self.post.id, authoritative);
        let confirmed_id = confirmed.id;

        if self.store.contains(&confirmed_id) {
            // A refresh already delivered the authoritative copy.
            self.store.remove(&provisional);
        } else {
            self.store.replace(&provisional, confirmed)?;
        }

        let moved = self.store.repoint_children(&provisional, &confirmed_id);
        for other in self.pending.values_mut() {
            if other.target == provisional {
                other.target = confirmed_id;
            }
            if let Undo::Delete { comment, .. } = &mut other.undo {
                if comment.parent_id == Some(provisional) {
                    comment.parent_id = Some(confirmed_id);
                }
            }
        }
        self.reindex();

        info!(
            provisional = %provisional,
            comment = %confirmed_id,
            repointed = moved,
            "comment confirmed"
        );
        Ok(Confirmation::Applied)
    }

    /// Open a new create mutation for a provisional comment whose earlier
    /// attempt was rejected and kept.
    ///
    /// Nothing changes locally. Fails with [`CoreError::Unconfirmed`] while
    /// the parent is still provisional and with [`CoreError::Validation`] if
    /// a create for the comment is already pending.
    pub fn begin_resend(&mut self, id: CommentId) -> Result<MutationHandle> {
        if !id.is_provisional() {
            return Err(CoreError::Validation(format!("{id} is already confirmed")));
        }
        let comment = self
            .store
            .get(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        guard::authorize(&self.viewer.id, comment)?;
        if let Some(parent) = comment.parent_id.filter(CommentId::is_provisional) {
            return Err(CoreError::Unconfirmed(parent));
        }
        let in_flight = self
            .pending
            .values()
            .any(|p| p.target == id && matches!(p.undo, Undo::Create));
        if in_flight {
            return Err(CoreError::Validation(format!("{id} is already being sent")));
        }

        debug!(comment = %id, "provisional comment queued for resend");
        Ok(self.track(MutationKind::Create, id, Undo::Create))
    }

    /// Drop a provisional comment locally. Its replies stay, as orphans.
    ///
    /// A create still pending for it will resolve as [`Confirmation::Stale`].
    pub fn discard(&mut self, id: CommentId) -> Result<Comment> {
        if !id.is_provisional() {
            return Err(CoreError::Validation(format!(
                "{id} is confirmed; delete it instead"
            )));
        }
        let (_, comment) = self
            .store
            .remove(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        self.likes.forget(&id);
        self.reindex();

        debug!(comment = %id, "provisional comment discarded");
        Ok(comment)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace the message of one of the viewer's comments.
    pub fn begin_update(&mut self, id: CommentId, message: &str) -> Result<MutationHandle> {
        validate_message(message)?;

        let viewer = self.viewer.id;
        let comment = self
            .store
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        guard::authorize(&viewer, comment)?;

        let previous = std::mem::replace(&mut comment.message, message.to_string());
        debug!(comment = %id, "comment edited locally");
        Ok(self.track(MutationKind::Update, id, Undo::Update { previous }))
    }

    pub fn confirm_update(&mut self, handle: MutationHandle, message: &str) -> Result<Confirmation> {
        let pending = self.take_pending(handle, MutationKind::Update, MutationState::Confirmed)?;
        match self.store.get_mut(&pending.target) {
            Some(comment) => {
                comment.message = message.to_string();
                Ok(Confirmation::Applied)
            }
            None => Ok(Confirmation::Stale),
        }
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove one of the viewer's comments. Its replies stay where they are.
    pub fn begin_delete(&mut self, id: CommentId) -> Result<MutationHandle> {
        let comment = self
            .store
            .get(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        guard::authorize(&self.viewer.id, comment)?;

        let (position, comment) = self
            .store
            .remove(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        let likers = self.likes.forget(&id);
        self.reindex();

        debug!(comment = %id, "comment removed locally");
        Ok(self.track(
            MutationKind::Delete,
            id,
            Undo::Delete {
                position,
                comment: Box::new(comment),
                likers,
            },
        ))
    }

    pub fn confirm_delete(&mut self, handle: MutationHandle) -> Result<Confirmation> {
        self.take_pending(handle, MutationKind::Delete, MutationState::Confirmed)?;
        Ok(Confirmation::Applied)
    }

    // ------------------------------------------------------------------
    // Likes
    // ------------------------------------------------------------------

    /// Flip `actor`'s like on a comment. Returns the handle and the new state.
    pub fn begin_toggle_like(&mut self, id: CommentId, actor: UserId) -> Result<(MutationHandle, bool)> {
        if id.is_provisional() {
            return Err(CoreError::Unconfirmed(id));
        }
        let comment = self
            .store
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        let liked = self.likes.toggle(actor, comment);
        debug!(comment = %id, actor = %actor, liked, "like toggled locally");
        let handle = self.track(MutationKind::ToggleLike, id, Undo::ToggleLike { actor });
        Ok((handle, liked))
    }

    /// Settle the like on the authoritative answer.
    pub fn confirm_like(&mut self, handle: MutationHandle, liked: bool) -> Result<Confirmation> {
        let pending = self.take_pending(handle, MutationKind::ToggleLike, MutationState::Confirmed)?;
        let Undo::ToggleLike { actor } = pending.undo else {
            return Err(CoreError::NotPending(handle.id));
        };
        let Some(comment) = self.store.get_mut(&pending.target) else {
            return Ok(Confirmation::Stale);
        };
        if self.likes.settle(actor, comment, liked) {
            warn!(comment = %pending.target, liked, "local like disagreed with the server");
        }
        Ok(Confirmation::Applied)
    }

    // ------------------------------------------------------------------
    // Reject
    // ------------------------------------------------------------------

    /// Resolve a mutation as failed. With [`Rollback::Revert`] its optimistic
    /// effect is undone; with [`Rollback::Keep`] local state is left alone.
    pub fn reject(&mut self, handle: MutationHandle, rollback: Rollback) -> Result<()> {
        let pending = self.take_pending(handle, handle.kind, MutationState::Rejected)?;
        warn!(comment = %pending.target, kind = ?handle.kind, ?rollback, "mutation rejected");

        if rollback == Rollback::Keep {
            return Ok(());
        }

        match pending.undo {
            Undo::Create => {
                // Replies to the discarded comment become orphans.
                if self.store.remove(&pending.target).is_some() {
                    self.reindex();
                }
            }
            Undo::Update { previous } => {
                if let Some(comment) = self.store.get_mut(&pending.target) {
                    comment.message = previous;
                }
            }
            Undo::Delete {
                position,
                comment,
                likers,
            } => {
                if !self.store.contains(&comment.id) {
                    self.likes.restore(&comment.id, &likers);
                    self.store.reinsert_at(position, *comment);
                    self.reindex();
                }
            }
            Undo::ToggleLike { actor } => {
                if let Some(comment) = self.store.get_mut(&pending.target) {
                    self.likes.toggle(actor, comment);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn reindex(&mut self) {
        self.index = rebuild_index(self.store.as_slice());
    }

    fn track(&mut self, kind: MutationKind, target: CommentId, undo: Undo) -> MutationHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        self.pending.insert(id, PendingMutation { target, undo });
        MutationHandle { id, kind }
    }

    fn pending_of(&self, handle: MutationHandle, kind: MutationKind) -> Result<&PendingMutation> {
        if handle.kind != kind {
            return Err(CoreError::NotPending(handle.id));
        }
        self.pending
            .get(&handle.id)
            .ok_or(CoreError::NotPending(handle.id))
    }

    fn take_pending(
        &mut self,
        handle: MutationHandle,
        kind: MutationKind,
        outcome: MutationState,
    ) -> Result<PendingMutation> {
        self.pending_of(handle, kind)?;
        let pending = self
            .pending
            .remove(&handle.id)
            .ok_or(CoreError::NotPending(handle.id))?;
        self.resolved.insert(handle.id, outcome);
        Ok(pending)
    }
}

fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(CoreError::Validation("Message is required".into()));
    }
    if message.len() > MAX_MESSAGE_SIZE {
        return Err(CoreError::Validation(format!(
            "Message exceeds {MAX_MESSAGE_SIZE} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_shared::protocol::AuthorDto;
    use arbor_shared::PostId;
    use chrono::{DateTime, Duration};
    use uuid::Uuid;

    struct Fixture {
        session: PostSession,
        me: UserId,
        other: UserId,
    }

    fn rid(n: u128) -> CommentId {
        CommentId::Remote(Uuid::from_u128(n))
    }

    fn dto(n: u128, parent: Option<u128>, author: UserId, at: DateTime<Utc>) -> CommentDto {
        CommentDto {
            id: Uuid::from_u128(n),
            message: format!("comment {n}"),
            parent_id: parent.map(Uuid::from_u128),
            created_at: at,
            like_count: 0,
            liked_by_me: false,
            author: AuthorDto {
                id: author,
                name: "someone".into(),
            },
        }
    }

    /// Comment 1 is a root by the viewer; comment 2 is another user's reply to it.
    fn fixture() -> Fixture {
        let me = UserId::new();
        let other = UserId::new();
        let now = Utc::now();
        let detail = PostDetail {
            id: PostId::new(),
            title: "Post 1".into(),
            body: "body".into(),
            comments: vec![
                dto(2, Some(1), other, now - Duration::minutes(1)),
                dto(1, None, me, now - Duration::minutes(2)),
            ],
        };
        Fixture {
            session: PostSession::from_detail(detail, Author::new(me, "Zach")),
            me,
            other,
        }
    }

    fn ids(comments: Vec<&Comment>) -> Vec<CommentId> {
        comments.into_iter().map(|c| c.id).collect()
    }

    #[test]
    fn snapshot_builds_the_reply_tree() {
        let f = fixture();
        assert_eq!(ids(f.session.root_comments()), vec![rid(1)]);
        assert_eq!(ids(f.session.replies(Some(&rid(1)))), vec![rid(2)]);
        assert!(f.session.replies(Some(&rid(2))).is_empty());
        assert_eq!(f.session.reply_total(&rid(1)), 1);
    }

    #[test]
    fn empty_message_is_rejected_without_side_effects() {
        let mut f = fixture();
        let before = f.session.comments().to_vec();
        for message in ["", "   "] {
            let err = f.session.begin_create(None, message).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
        assert_eq!(f.session.comments(), before.as_slice());
        assert_eq!(f.session.pending_count(), 0);
    }

    #[test]
    fn oversized_message_is_rejected() {
        let mut f = fixture();
        let huge = "x".repeat(MAX_MESSAGE_SIZE + 1);
        assert!(f.session.begin_create(None, &huge).unwrap_err().is_validation());
    }

    #[test]
    fn create_then_confirm_replaces_provisional() {
        let mut f = fixture();
        let handle = f.session.begin_create(None, "hi").unwrap();
        let provisional = f.session.target(handle).unwrap();
        assert!(provisional.is_provisional());

        let roots = f.session.root_comments();
        assert_eq!(roots[0].id, provisional);
        assert_eq!(roots[0].like_count, 0);
        assert!(!roots[0].liked_by_me);
        assert_eq!(roots[0].author.id, f.me);

        let request = f.session.outgoing_create(handle).unwrap();
        assert_eq!(request.message, "hi");
        assert_eq!(request.parent_id, None);

        let outcome = f
            .session
            .confirm_create(handle, dto(99, None, f.me, Utc::now()))
            .unwrap();
        assert_eq!(outcome, Confirmation::Applied);

        let roots = ids(f.session.root_comments());
        assert!(roots.contains(&rid(99)));
        assert!(!roots.contains(&provisional));
        assert_eq!(f.session.state(handle), Some(MutationState::Confirmed));
    }

    #[test]
    fn reply_to_provisional_parent_is_repointed_on_confirm() {
        let mut f = fixture();
        let parent = f.session.begin_create(None, "parent").unwrap();
        let parent_id = f.session.target(parent).unwrap();
        let child = f.session.begin_create(Some(parent_id), "child").unwrap();
        let child_id = f.session.target(child).unwrap();

        assert_eq!(
            f.session.outgoing_create(child).unwrap_err(),
            CoreError::Unconfirmed(parent_id)
        );

        f.session
            .confirm_create(parent, dto(50, None, f.me, Utc::now()))
            .unwrap();

        assert_eq!(ids(f.session.replies(Some(&rid(50)))), vec![child_id]);
        assert!(f.session.replies(Some(&parent_id)).is_empty());
        let request = f.session.outgoing_create(child).unwrap();
        assert_eq!(request.parent_id, Some(Uuid::from_u128(50)));
    }

    #[test]
    fn pending_edit_follows_confirmed_id() {
        let mut f = fixture();
        let create = f.session.begin_create(None, "draft").unwrap();
        let provisional = f.session.target(create).unwrap();
        let edit = f.session.begin_update(provisional, "final").unwrap();

        f.session
            .confirm_create(create, dto(60, None, f.me, Utc::now()))
            .unwrap();
        assert_eq!(f.session.target(edit), Some(rid(60)));
    }

    #[test]
    fn confirming_a_deleted_provisional_is_stale() {
        let mut f = fixture();
        let create = f.session.begin_create(None, "oops").unwrap();
        let provisional = f.session.target(create).unwrap();
        let delete = f.session.begin_delete(provisional).unwrap();
        f.session.confirm_delete(delete).unwrap();

        let outcome = f
            .session
            .confirm_create(create, dto(70, None, f.me, Utc::now()))
            .unwrap();
        assert_eq!(outcome, Confirmation::Stale);
        assert!(f.session.get(&rid(70)).is_none());
    }

    #[test]
    fn confirmation_after_refresh_does_not_duplicate() {
        let mut f = fixture();
        let create = f.session.begin_create(None, "hello").unwrap();
        let provisional = f.session.target(create).unwrap();
        let confirmed = dto(80, None, f.me, Utc::now());

        // Simulate a refresh that raced the confirmation: provisional kept
        // locally, authoritative copy inserted alongside it.
        f.session
            .store
            .insert(Comment::from_dto(f.session.post().id, confirmed.clone()));
        f.session.reindex();

        f.session.confirm_create(create, confirmed).unwrap();
        let matching = f
            .session
            .comments()
            .iter()
            .filter(|c| c.id == rid(80) || c.id == provisional)
            .count();
        assert_eq!(matching, 1);
    }

    #[test]
    fn handles_resolve_exactly_once() {
        let mut f = fixture();
        let handle = f.session.begin_create(None, "once").unwrap();
        f.session.reject(handle, Rollback::Keep).unwrap();
        assert_eq!(f.session.state(handle), Some(MutationState::Rejected));
        assert_eq!(
            f.session
                .confirm_create(handle, dto(5, None, f.me, Utc::now()))
                .unwrap_err(),
            CoreError::NotPending(handle.id())
        );
        assert!(f.session.reject(handle, Rollback::Revert).is_err());
    }

    #[test]
    fn reject_keep_leaves_provisional_in_place() {
        let mut f = fixture();
        let handle = f.session.begin_create(None, "kept").unwrap();
        let provisional = f.session.target(handle).unwrap();
        f.session.reject(handle, Rollback::Keep).unwrap();
        assert!(f.session.get(&provisional).is_some());
    }

    #[test]
    fn reject_revert_removes_provisional() {
        let mut f = fixture();
        let before = f.session.comments().to_vec();
        let handle = f.session.begin_create(Some(rid(1)), "gone").unwrap();
        f.session.reject(handle, Rollback::Revert).unwrap();
        assert_eq!(f.session.comments(), before.as_slice());
        assert_eq!(ids(f.session.replies(Some(&rid(1)))), vec![rid(2)]);
    }

    #[test]
    fn update_by_author_then_confirm() {
        let mut f = fixture();
        let created_at = f.session.get(&rid(1)).unwrap().created_at;
        let handle = f.session.begin_update(rid(1), "edited").unwrap();
        assert_eq!(f.session.get(&rid(1)).unwrap().message, "edited");

        f.session.confirm_update(handle, "edited!").unwrap();
        let comment = f.session.get(&rid(1)).unwrap();
        assert_eq!(comment.message, "edited!");
        assert_eq!(comment.id, rid(1));
        assert_eq!(comment.created_at, created_at);
    }

    #[test]
    fn update_by_non_author_is_refused() {
        let mut f = fixture();
        let before = f.session.comments().to_vec();
        let err = f.session.begin_update(rid(2), "hijack").unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));
        assert_eq!(f.session.comments(), before.as_slice());
    }

    #[test]
    fn update_with_empty_message_is_refused() {
        let mut f = fixture();
        let err = f.session.begin_update(rid(1), "").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(f.session.get(&rid(1)).unwrap().message, "comment 1");
    }

    #[test]
    fn reject_revert_restores_previous_message() {
        let mut f = fixture();
        let handle = f.session.begin_update(rid(1), "edited").unwrap();
        f.session.reject(handle, Rollback::Revert).unwrap();
        assert_eq!(f.session.get(&rid(1)).unwrap().message, "comment 1");
    }

    #[test]
    fn delete_keeps_orphaned_replies() {
        let mut f = fixture();
        let handle = f.session.begin_delete(rid(1)).unwrap();
        f.session.confirm_delete(handle).unwrap();

        assert!(f.session.get(&rid(1)).is_none());
        assert!(f.session.get(&rid(2)).is_some());
        assert_eq!(ids(f.session.replies(Some(&rid(1)))), vec![rid(2)]);
        assert_eq!(ids(f.session.orphans()), vec![rid(2)]);
        assert!(f.session.root_comments().is_empty());
    }

    #[test]
    fn delete_by_non_author_is_refused() {
        let mut f = fixture();
        let before = f.session.comments().to_vec();
        let err = f.session.begin_delete(rid(2)).unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));
        assert_eq!(f.session.comments(), before.as_slice());
    }

    #[test]
    fn delete_of_unknown_comment_is_not_found() {
        let mut f = fixture();
        assert!(matches!(
            f.session.begin_delete(rid(404)).unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    #[test]
    fn reject_revert_restores_deleted_comment() {
        let mut f = fixture();
        let (like, _) = f.session.begin_toggle_like(rid(1), f.me).unwrap();
        f.session.confirm_like(like, true).unwrap();
        let before = f.session.comments().to_vec();

        let handle = f.session.begin_delete(rid(1)).unwrap();
        f.session.reject(handle, Rollback::Revert).unwrap();

        assert_eq!(f.session.comments(), before.as_slice());
        assert_eq!(ids(f.session.root_comments()), vec![rid(1)]);
        // The restored like pair is live again: toggling removes it.
        let (_, liked) = f.session.begin_toggle_like(rid(1), f.me).unwrap();
        assert!(!liked);
    }

    #[test]
    fn toggle_like_twice_round_trips() {
        let mut f = fixture();
        let (first, liked) = f.session.begin_toggle_like(rid(2), f.me).unwrap();
        assert!(liked);
        assert_eq!(f.session.get(&rid(2)).unwrap().like_count, 1);
        assert!(f.session.get(&rid(2)).unwrap().liked_by_me);
        f.session.confirm_like(first, true).unwrap();

        let (second, liked) = f.session.begin_toggle_like(rid(2), f.me).unwrap();
        assert!(!liked);
        f.session.confirm_like(second, false).unwrap();
        let comment = f.session.get(&rid(2)).unwrap();
        assert_eq!(comment.like_count, 0);
        assert!(!comment.liked_by_me);
    }

    #[test]
    fn confirm_like_settles_on_server_answer() {
        let mut f = fixture();
        let (handle, liked) = f.session.begin_toggle_like(rid(2), f.me).unwrap();
        assert!(liked);
        f.session.confirm_like(handle, false).unwrap();
        let comment = f.session.get(&rid(2)).unwrap();
        assert_eq!(comment.like_count, 0);
        assert!(!comment.liked_by_me);
    }

    #[test]
    fn reject_revert_flips_like_back() {
        let mut f = fixture();
        let (handle, _) = f.session.begin_toggle_like(rid(2), f.other).unwrap();
        assert_eq!(f.session.get(&rid(2)).unwrap().like_count, 1);
        f.session.reject(handle, Rollback::Revert).unwrap();
        assert_eq!(f.session.get(&rid(2)).unwrap().like_count, 0);
    }

    #[test]
    fn liking_a_provisional_comment_is_refused() {
        let mut f = fixture();
        let handle = f.session.begin_create(None, "fresh").unwrap();
        let provisional = f.session.target(handle).unwrap();
        assert_eq!(
            f.session.begin_toggle_like(provisional, f.me).unwrap_err(),
            CoreError::Unconfirmed(provisional)
        );
    }

    #[test]
    fn resend_reopens_a_kept_create() {
        let mut f = fixture();
        let first = f.session.begin_create(Some(rid(1)), "retry me").unwrap();
        let provisional = f.session.target(first).unwrap();
        f.session.reject(first, Rollback::Keep).unwrap();

        let again = f.session.begin_resend(provisional).unwrap();
        assert_ne!(again, first);
        assert!(f.session.begin_resend(provisional).is_err());
        let request = f.session.outgoing_create(again).unwrap();
        assert_eq!(request.message, "retry me");
        assert_eq!(request.parent_id, Some(Uuid::from_u128(1)));

        f.session
            .confirm_create(again, dto(90, Some(1), f.me, Utc::now()))
            .unwrap();
        assert!(f.session.get(&provisional).is_none());
        assert_eq!(ids(f.session.replies(Some(&rid(1)))), vec![rid(90), rid(2)]);
    }

    #[test]
    fn resend_refuses_confirmed_and_pending_parent() {
        let mut f = fixture();
        assert!(matches!(
            f.session.begin_resend(rid(1)).unwrap_err(),
            CoreError::Validation(_)
        ));

        let parent = f.session.begin_create(None, "parent").unwrap();
        let parent_id = f.session.target(parent).unwrap();
        let child = f.session.begin_create(Some(parent_id), "child").unwrap();
        let child_id = f.session.target(child).unwrap();
        f.session.reject(child, Rollback::Keep).unwrap();

        assert_eq!(
            f.session.begin_resend(child_id).unwrap_err(),
            CoreError::Unconfirmed(parent_id)
        );
        assert_eq!(f.session.pending_count(), 1);
    }

    #[test]
    fn discard_removes_only_provisional_comments() {
        let mut f = fixture();
        let handle = f.session.begin_create(None, "kept").unwrap();
        let provisional = f.session.target(handle).unwrap();
        f.session.reject(handle, Rollback::Keep).unwrap();

        let dropped = f.session.discard(provisional).unwrap();
        assert_eq!(dropped.message, "kept");
        assert!(f.session.get(&provisional).is_none());
        assert_eq!(ids(f.session.root_comments()), vec![rid(1)]);

        assert!(matches!(
            f.session.discard(rid(1)).unwrap_err(),
            CoreError::Validation(_)
        ));
        assert!(f.session.get(&rid(1)).is_some());
    }

    #[test]
    fn reverted_delete_follows_confirmed_parent() {
        let mut f = fixture();
        let parent = f.session.begin_create(None, "parent").unwrap();
        let parent_id = f.session.target(parent).unwrap();
        let child = f.session.begin_create(Some(parent_id), "child").unwrap();
        let child_id = f.session.target(child).unwrap();

        let delete = f.session.begin_delete(child_id).unwrap();
        f.session
            .confirm_create(parent, dto(51, None, f.me, Utc::now()))
            .unwrap();
        f.session.reject(delete, Rollback::Revert).unwrap();

        assert_eq!(ids(f.session.replies(Some(&rid(51)))), vec![child_id]);
        assert!(f.session.orphans().is_empty());
    }

    #[test]
    fn refresh_forgets_resolved_outcomes() {
        let mut f = fixture();
        let done = f.session.begin_update(rid(1), "edited").unwrap();
        f.session.confirm_update(done, "edited").unwrap();
        let open = f.session.begin_create(None, "in flight").unwrap();
        assert_eq!(f.session.state(done), Some(MutationState::Confirmed));

        let detail = PostDetail {
            id: f.session.post().id,
            title: "Post 1".into(),
            body: "body".into(),
            comments: vec![],
        };
        f.session.refresh(detail);
        assert_eq!(f.session.state(done), None);
        assert_eq!(f.session.state(open), Some(MutationState::Pending));
    }

    #[test]
    fn refresh_replaces_the_snapshot() {
        let mut f = fixture();
        let handle = f.session.begin_create(None, "local").unwrap();
        let detail = PostDetail {
            id: f.session.post().id,
            title: "Post 1".into(),
            body: "body".into(),
            comments: vec![dto(3, None, f.other, Utc::now())],
        };
        f.session.refresh(detail);
        assert_eq!(ids(f.session.root_comments()), vec![rid(3)]);
        assert_eq!(
            f.session
                .confirm_create(handle, dto(4, None, f.me, Utc::now()))
                .unwrap(),
            Confirmation::Stale
        );
    }
}

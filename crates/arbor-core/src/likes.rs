//! Like bookkeeping as a set of `(user, comment)` pairs.
//!
//! A session only learns the viewer's own likes from a snapshot, so the
//! ledger is seeded with those and keeps each comment's `like_count` in step
//! with every flip it performs.

use std::collections::HashSet;

use arbor_shared::UserId;

use crate::model::{Comment, CommentId};

#[derive(Debug, Clone)]
pub struct LikeLedger {
    viewer: UserId,
    pairs: HashSet<(UserId, CommentId)>,
}

impl LikeLedger {
    pub fn new(viewer: UserId) -> Self {
        Self {
            viewer,
            pairs: HashSet::new(),
        }
    }

    /// Seed from a snapshot's `liked_by_me` flags.
    pub fn seed<'a>(viewer: UserId, comments: impl IntoIterator<Item = &'a Comment>) -> Self {
        let pairs = comments
            .into_iter()
            .filter(|c| c.liked_by_me)
            .map(|c| (viewer, c.id))
            .collect();
        Self { viewer, pairs }
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn is_liked(&self, actor: &UserId, comment: &CommentId) -> bool {
        self.pairs.contains(&(*actor, *comment))
    }

    /// Flip the like of `actor` on `comment` and return the new state.
    pub fn toggle(&mut self, actor: UserId, comment: &mut Comment) -> bool {
        let key = (actor, comment.id);
        let liked = if self.pairs.remove(&key) {
            comment.like_count = comment.like_count.saturating_sub(1);
            false
        } else {
            self.pairs.insert(key);
            comment.like_count += 1;
            true
        };
        if actor == self.viewer {
            comment.liked_by_me = liked;
        }
        liked
    }

    /// Force the pair to the authoritative state. Returns whether anything changed.
    pub fn settle(&mut self, actor: UserId, comment: &mut Comment, liked: bool) -> bool {
        if self.is_liked(&actor, &comment.id) == liked {
            return false;
        }
        self.toggle(actor, comment);
        true
    }

    /// Drop every pair for a removed comment, returning the actors that liked it.
    pub fn forget(&mut self, comment: &CommentId) -> Vec<UserId> {
        let actors: Vec<UserId> = self
            .pairs
            .iter()
            .filter(|(_, c)| c == comment)
            .map(|(actor, _)| *actor)
            .collect();
        for actor in &actors {
            self.pairs.remove(&(*actor, *comment));
        }
        actors
    }

    /// Re-add pairs dropped by [`forget`](Self::forget). Counts are untouched:
    /// the restored comment still carries them.
    pub fn restore(&mut self, comment: &CommentId, actors: &[UserId]) {
        for actor in actors {
            self.pairs.insert((*actor, *comment));
        }
    }
}

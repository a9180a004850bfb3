//! Domain structs the engine operates on.
//!
//! Everything derives `Serialize` so a renderer can take a snapshot of the
//! session directly.

use std::cmp::Ordering;

use arbor_shared::protocol::{AuthorDto, CommentDto, PostDetail};
use arbor_shared::{PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// CommentId
// ---------------------------------------------------------------------------

/// Address of a comment inside a session.
///
/// Authoritative ids come from the store. Provisional ids are handed out
/// locally for optimistic creates and are replaced once confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentId {
    Remote(Uuid),
    Provisional(u64),
}

impl CommentId {
    /// The authoritative id, if this comment has one.
    pub fn remote(&self) -> Option<Uuid> {
        match self {
            CommentId::Remote(id) => Some(*id),
            CommentId::Provisional(_) => None,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, CommentId::Provisional(_))
    }
}

impl From<Uuid> for CommentId {
    fn from(id: Uuid) -> Self {
        CommentId::Remote(id)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentId::Remote(id) => write!(f, "{id}"),
            CommentId::Provisional(n) => write!(f, "provisional-{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// Post metadata. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
}

impl From<&PostDetail> for Post {
    fn from(detail: &PostDetail) -> Self {
        Self {
            id: detail.id,
            title: detail.title.clone(),
            body: detail.body.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Author {
    pub id: UserId,
    pub name: String,
}

impl Author {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<AuthorDto> for Author {
    fn from(dto: AuthorDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
        }
    }
}

/// One comment of a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    /// `None` for a root comment.
    pub parent_id: Option<CommentId>,
    pub author: Author,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    /// Whether the session's viewer likes this comment.
    pub liked_by_me: bool,
}

impl Comment {
    pub fn from_dto(post_id: PostId, dto: CommentDto) -> Self {
        Self {
            id: CommentId::Remote(dto.id),
            post_id,
            parent_id: dto.parent_id.map(CommentId::Remote),
            author: dto.author.into(),
            message: dto.message,
            created_at: dto.created_at,
            like_count: dto.like_count,
            liked_by_me: dto.liked_by_me,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn author_id(&self) -> UserId {
        self.author.id
    }
}

/// Most-recent first; equal timestamps fall back to descending id.
pub fn recency_order(a: &Comment, b: &Comment) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

//! Wire shapes exchanged between the engine and the authoritative source.
//!
//! Every struct serializes camelCase so the JSON matches what a browser
//! client of the HTTP API expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{PostId, UserId};

/// A post as it appears in the post listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
}

/// A single post together with every comment on it.
///
/// `comments` is flat and ordered most-recent first; the reply tree is
/// reconstructed on the consuming side from each comment's `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub comments: Vec<CommentDto>,
}

/// Public identity of a comment author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: UserId,
    pub name: String,
}

/// An authoritative comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub message: String,
    /// `None` for a root comment.
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    /// Relative to the actor who made the request.
    pub liked_by_me: bool,
    pub author: AuthorDto,
}

/// Body of a create-comment request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub message: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Body of an edit request, and the response to one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentMessage {
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedComment {
    pub id: Uuid,
}

/// Outcome of a like toggle: the new state, never a delta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggled {
    pub liked: bool,
}

/// Error body returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

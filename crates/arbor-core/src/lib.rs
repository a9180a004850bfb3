//! # arbor-core
//!
//! The comment-tree engine. A [`PostSession`] holds the flat comments of one
//! post, keeps a parent-to-children [`TreeIndex`] over them, and applies
//! create/update/delete/like mutations optimistically, each one resolved
//! later by an explicit confirm or reject from the authoritative source.
//!
//! [`SyncedSession`] drives a `PostSession` against any
//! [`arbor_shared::CommentBackend`].

pub mod entity_store;
pub mod guard;
pub mod index;
pub mod likes;
pub mod model;
pub mod session;
pub mod synced;

mod error;

pub use entity_store::EntityStore;
pub use error::{CoreError, Result};
pub use index::{rebuild_index, TreeIndex};
pub use likes::LikeLedger;
pub use model::{Author, Comment, CommentId, Post};
pub use session::{Confirmation, MutationHandle, MutationKind, MutationState, PostSession, Rollback};
pub use synced::SyncedSession;

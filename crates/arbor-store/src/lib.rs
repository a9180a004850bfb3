//! # arbor-store
//!
//! Authoritative storage for posts, comments and likes, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every operation of
//! the transport contract. Authorization checks and like toggles run inside
//! immediate transactions so the check and the write are one atomic step.

pub mod backend;
pub mod comments;
pub mod database;
pub mod likes;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod seed;
pub mod users;

mod error;

pub use backend::LocalBackend;
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;

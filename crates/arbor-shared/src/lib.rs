//! Types shared between the Arbor engine, the authoritative store, the HTTP
//! server and the HTTP client: id newtypes, wire DTOs, the boundary error
//! taxonomy and the [`CommentBackend`] transport contract.

pub mod backend;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use backend::CommentBackend;
pub use error::RemoteError;
pub use types::{PostId, UserId};

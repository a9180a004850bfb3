//! Demo content for a fresh database.

use arbor_shared::protocol::NewComment;

use crate::database::Database;
use crate::error::Result;

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.";

impl Database {
    /// Populate users, posts, and a small comment thread.
    ///
    /// Returns `false` without writing anything when users already exist.
    pub fn seed_demo(&mut self) -> Result<bool> {
        if !self.list_users()?.is_empty() {
            tracing::debug!("database already populated, skipping seed");
            return Ok(false);
        }

        let kyle = self.create_user("Kyle")?;
        let sally = self.create_user("Sally")?;
        let zach = self.create_user("Zach")?;

        let first = self.create_post("Post 1", LOREM)?;
        self.create_post("Post 2", LOREM)?;

        let root = self.create_comment(
            first.id,
            kyle.id,
            &NewComment {
                message: "I am a root comment".into(),
                parent_id: None,
            },
        )?;
        let nested = self.create_comment(
            first.id,
            sally.id,
            &NewComment {
                message: "I am a nested comment".into(),
                parent_id: Some(root.id),
            },
        )?;
        self.create_comment(
            first.id,
            zach.id,
            &NewComment {
                message: "I am another root comment".into(),
                parent_id: None,
            },
        )?;
        self.toggle_like(zach.id, first.id, nested.id)?;

        tracing::info!("seeded demo users, posts and comments");
        Ok(true)
    }
}

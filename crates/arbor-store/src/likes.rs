//! Like rows: at most one per `(user, comment)`, the row's existence is the state.

use arbor_shared::{PostId, UserId};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::comments::ensure_in_post;
use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Flip `actor`'s like on a comment and return the new state.
    ///
    /// The existence check and the write share one immediate transaction, so
    /// two concurrent toggles can never both insert.
    pub fn toggle_like(&mut self, actor: UserId, post_id: PostId, comment_id: Uuid) -> Result<bool> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_in_post(&tx, post_id, comment_id)?;

        let user = actor.0.to_string();
        let comment = comment_id.to_string();

        let existing = tx
            .query_row(
                "SELECT 1 FROM likes WHERE user_id = ?1 AND comment_id = ?2",
                params![user, comment],
                |_| Ok(()),
            )
            .optional()?;

        let liked = if existing.is_some() {
            tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND comment_id = ?2",
                params![user, comment],
            )?;
            false
        } else {
            tx.execute(
                "INSERT INTO likes (user_id, comment_id) VALUES (?1, ?2)",
                params![user, comment],
            )?;
            true
        };
        tx.commit()?;

        tracing::debug!(comment = %comment_id, actor = %actor, liked, "like toggled");
        Ok(liked)
    }

    pub fn like_count(&self, comment_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM likes WHERE comment_id = ?1",
            params![comment_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    pub fn has_liked(&self, actor: UserId, comment_id: Uuid) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM likes WHERE user_id = ?1 AND comment_id = ?2",
                params![actor.0.to_string(), comment_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

//! Comment persistence and the authorship-checked edit/delete paths.

use arbor_shared::constants::MAX_MESSAGE_SIZE;
use arbor_shared::protocol::{AuthorDto, CommentDto, CommentMessage, DeletedComment, NewComment};
use arbor_shared::{PostId, UserId};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{format_ts, parse_ts, parse_uuid};

/// Comment columns plus the like aggregate. `?1` is the viewing user.
const COMMENT_SELECT: &str = "
    SELECT c.id, c.message, c.parent_id, c.created_at, u.id, u.name,
           (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id),
           EXISTS (SELECT 1 FROM likes l WHERE l.comment_id = c.id AND l.user_id = ?1)
    FROM comments c
    JOIN users u ON u.id = c.user_id";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a comment written by `author`.
    ///
    /// The parent, if any, must already exist in the same post.
    pub fn create_comment(&mut self, post_id: PostId, author: UserId, new: &NewComment) -> Result<CommentDto> {
        validate_message(&new.message)?;

        let id = Uuid::new_v4();
        let now = format_ts(&Utc::now());

        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let post_exists = tx
            .query_row(
                "SELECT 1 FROM posts WHERE id = ?1",
                params![post_id.0.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !post_exists {
            return Err(StoreError::NotFound(format!("post {post_id}")));
        }

        let author_exists = tx
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![author.0.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !author_exists {
            return Err(StoreError::NotFound(format!("user {author}")));
        }

        if let Some(parent) = new.parent_id {
            let parent_post: Option<String> = tx
                .query_row(
                    "SELECT post_id FROM comments WHERE id = ?1",
                    params![parent.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            match parent_post {
                None => {
                    return Err(StoreError::InvalidInput(format!(
                        "Parent comment {parent} does not exist"
                    )))
                }
                Some(p) if p != post_id.0.to_string() => {
                    return Err(StoreError::InvalidInput(format!(
                        "Parent comment {parent} belongs to another post"
                    )))
                }
                Some(_) => {}
            }
        }

        tx.execute(
            "INSERT INTO comments (id, post_id, parent_id, user_id, message, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id.to_string(),
                post_id.0.to_string(),
                new.parent_id.map(|p| p.to_string()),
                author.0.to_string(),
                new.message,
                now,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(comment = %id, post = %post_id, "comment created");
        self.get_comment(id, author)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// A single comment with like data relative to `viewer`.
    pub fn get_comment(&self, id: Uuid, viewer: UserId) -> Result<CommentDto> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = ?2");
        self.conn()
            .query_row(
                &sql,
                params![viewer.0.to_string(), id.to_string()],
                row_to_comment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("comment {id}")),
                other => StoreError::Sqlite(other),
            })
    }

    /// Every comment on a post, most recent first, ties broken by id.
    pub fn comments_for_post(&self, post_id: PostId, viewer: UserId) -> Result<Vec<CommentDto>> {
        let sql = format!("{COMMENT_SELECT} WHERE c.post_id = ?2 ORDER BY c.created_at DESC, c.id DESC");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![viewer.0.to_string(), post_id.0.to_string()],
            row_to_comment,
        )?;

        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    // ------------------------------------------------------------------
    // Update / Delete
    // ------------------------------------------------------------------

    /// Replace the message of a comment `actor` wrote.
    pub fn update_comment(
        &mut self,
        actor: UserId,
        post_id: PostId,
        comment_id: Uuid,
        message: &str,
    ) -> Result<CommentMessage> {
        validate_message(message)?;

        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_author(&tx, actor, post_id, comment_id, "edit")?;

        tx.execute(
            "UPDATE comments SET message = ?1, updated_at = ?2 WHERE id = ?3",
            params![message, format_ts(&Utc::now()), comment_id.to_string()],
        )?;
        let stored: String = tx.query_row(
            "SELECT message FROM comments WHERE id = ?1",
            params![comment_id.to_string()],
            |row| row.get(0),
        )?;
        tx.commit()?;

        tracing::debug!(comment = %comment_id, "comment updated");
        Ok(CommentMessage { message: stored })
    }

    /// Delete a comment `actor` wrote. Replies are kept and its likes go with it.
    pub fn delete_comment(&mut self, actor: UserId, post_id: PostId, comment_id: Uuid) -> Result<DeletedComment> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_author(&tx, actor, post_id, comment_id, "delete")?;

        tx.execute(
            "DELETE FROM comments WHERE id = ?1",
            params![comment_id.to_string()],
        )?;
        tx.commit()?;

        tracing::debug!(comment = %comment_id, "comment deleted");
        Ok(DeletedComment { id: comment_id })
    }
}

/// The comment must exist in `post_id` and have been written by `actor`.
fn ensure_author(conn: &Connection, actor: UserId, post_id: PostId, comment_id: Uuid, verb: &str) -> Result<()> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT post_id, user_id FROM comments WHERE id = ?1",
            params![comment_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((owner_post, owner)) = row else {
        return Err(StoreError::NotFound(format!("comment {comment_id}")));
    };
    if owner_post != post_id.0.to_string() {
        return Err(StoreError::NotFound(format!("comment {comment_id}")));
    }
    if owner != actor.0.to_string() {
        return Err(StoreError::Unauthorized(format!(
            "You do not have permission to {verb} this message"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_in_post(conn: &Connection, post_id: PostId, comment_id: Uuid) -> Result<()> {
    let owner_post: Option<String> = conn
        .query_row(
            "SELECT post_id FROM comments WHERE id = ?1",
            params![comment_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match owner_post {
        Some(p) if p == post_id.0.to_string() => Ok(()),
        _ => Err(StoreError::NotFound(format!("comment {comment_id}"))),
    }
}

fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(StoreError::InvalidInput("Message is required".into()));
    }
    if message.len() > MAX_MESSAGE_SIZE {
        return Err(StoreError::InvalidInput(format!(
            "Message exceeds {MAX_MESSAGE_SIZE} bytes"
        )));
    }
    Ok(())
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentDto> {
    let id_str: String = row.get(0)?;
    let parent_str: Option<String> = row.get(2)?;
    let ts_str: String = row.get(3)?;
    let author_str: String = row.get(4)?;
    let like_count: i64 = row.get(6)?;

    let parent_id = match parent_str {
        Some(p) => Some(parse_uuid(2, &p)?),
        None => None,
    };

    Ok(CommentDto {
        id: parse_uuid(0, &id_str)?,
        message: row.get(1)?,
        parent_id,
        created_at: parse_ts(3, &ts_str)?,
        like_count: like_count.max(0) as u64,
        liked_by_me: row.get(7)?,
        author: AuthorDto {
            id: UserId(parse_uuid(4, &author_str)?),
            name: row.get(5)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, User};

    struct Fixture {
        db: Database,
        kyle: User,
        sally: User,
        post: Post,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let kyle = db.create_user("Kyle").unwrap();
        let sally = db.create_user("Sally").unwrap();
        let post = db.create_post("Post 1", "body").unwrap();
        Fixture { db, kyle, sally, post }
    }

    fn new_comment(message: &str, parent_id: Option<Uuid>) -> NewComment {
        NewComment {
            message: message.into(),
            parent_id,
        }
    }

    #[test]
    fn create_returns_fresh_comment() {
        let mut f = fixture();
        let dto = f
            .db
            .create_comment(f.post.id, f.kyle.id, &new_comment("hello", None))
            .unwrap();
        assert_eq!(dto.message, "hello");
        assert_eq!(dto.parent_id, None);
        assert_eq!(dto.like_count, 0);
        assert!(!dto.liked_by_me);
        assert_eq!(dto.author.id, f.kyle.id);
        assert_eq!(dto.author.name, "Kyle");
    }

    #[test]
    fn empty_message_is_invalid_input() {
        let mut f = fixture();
        assert!(matches!(
            f.db.create_comment(f.post.id, f.kyle.id, &new_comment("", None)),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(f.db.comments_for_post(f.post.id, f.kyle.id).unwrap().is_empty());
    }

    #[test]
    fn parent_must_exist_in_same_post() {
        let mut f = fixture();
        let other_post = f.db.create_post("Post 2", "body").unwrap();
        let elsewhere = f
            .db
            .create_comment(other_post.id, f.kyle.id, &new_comment("elsewhere", None))
            .unwrap();

        assert!(matches!(
            f.db.create_comment(f.post.id, f.kyle.id, &new_comment("reply", Some(Uuid::new_v4()))),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            f.db.create_comment(f.post.id, f.kyle.id, &new_comment("reply", Some(elsewhere.id))),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn comment_on_missing_post_is_not_found() {
        let mut f = fixture();
        assert!(matches!(
            f.db.create_comment(PostId::new(), f.kyle.id, &new_comment("hi", None)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn comments_list_newest_first() {
        let mut f = fixture();
        let first = f
            .db
            .create_comment(f.post.id, f.kyle.id, &new_comment("first", None))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = f
            .db
            .create_comment(f.post.id, f.sally.id, &new_comment("second", Some(first.id)))
            .unwrap();

        let listed = f.db.comments_for_post(f.post.id, f.kyle.id).unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(listed[0].parent_id, Some(first.id));
    }

    #[test]
    fn author_can_edit() {
        let mut f = fixture();
        let dto = f
            .db
            .create_comment(f.post.id, f.kyle.id, &new_comment("draft", None))
            .unwrap();
        let updated = f
            .db
            .update_comment(f.kyle.id, f.post.id, dto.id, "final")
            .unwrap();
        assert_eq!(updated.message, "final");

        let stored = f.db.get_comment(dto.id, f.kyle.id).unwrap();
        assert_eq!(stored.message, "final");
        assert_eq!(stored.created_at, dto.created_at);
    }

    #[test]
    fn non_author_cannot_edit_or_delete() {
        let mut f = fixture();
        let dto = f
            .db
            .create_comment(f.post.id, f.kyle.id, &new_comment("mine", None))
            .unwrap();

        assert!(matches!(
            f.db.update_comment(f.sally.id, f.post.id, dto.id, "hijack"),
            Err(StoreError::Unauthorized(_))
        ));
        assert!(matches!(
            f.db.delete_comment(f.sally.id, f.post.id, dto.id),
            Err(StoreError::Unauthorized(_))
        ));
        assert_eq!(f.db.get_comment(dto.id, f.kyle.id).unwrap().message, "mine");
    }

    #[test]
    fn edit_through_wrong_post_is_not_found() {
        let mut f = fixture();
        let dto = f
            .db
            .create_comment(f.post.id, f.kyle.id, &new_comment("mine", None))
            .unwrap();
        assert!(matches!(
            f.db.update_comment(f.kyle.id, PostId::new(), dto.id, "moved"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_a_parent_keeps_its_replies() {
        let mut f = fixture();
        let parent = f
            .db
            .create_comment(f.post.id, f.kyle.id, &new_comment("parent", None))
            .unwrap();
        let reply = f
            .db
            .create_comment(f.post.id, f.sally.id, &new_comment("reply", Some(parent.id)))
            .unwrap();

        let deleted = f.db.delete_comment(f.kyle.id, f.post.id, parent.id).unwrap();
        assert_eq!(deleted.id, parent.id);

        let remaining = f.db.comments_for_post(f.post.id, f.kyle.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, reply.id);
        assert_eq!(remaining[0].parent_id, Some(parent.id));
        assert!(matches!(
            f.db.get_comment(parent.id, f.kyle.id),
            Err(StoreError::NotFound(_))
        ));
    }
}

//! CRUD operations for posts. Posts are immutable once created.

use arbor_shared::protocol::{PostDetail, PostSummary};
use arbor_shared::{PostId, UserId};
use chrono::Utc;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{format_ts, parse_ts, parse_uuid, Post};

impl Database {
    pub fn create_post(&self, title: &str, body: &str) -> Result<Post> {
        if title.trim().is_empty() {
            return Err(StoreError::InvalidInput("Title is required".into()));
        }

        let post = Post {
            id: PostId::new(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO posts (id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                post.id.0.to_string(),
                post.title,
                post.body,
                format_ts(&post.created_at),
            ],
        )?;

        tracing::debug!(post = %post.id, "post created");
        Ok(post)
    }

    pub fn get_post_row(&self, id: PostId) -> Result<Post> {
        self.conn()
            .query_row(
                "SELECT id, title, body, created_at FROM posts WHERE id = ?1",
                params![id.0.to_string()],
                |row| {
                    let id_str: String = row.get(0)?;
                    let ts_str: String = row.get(3)?;
                    Ok(Post {
                        id: PostId(parse_uuid(0, &id_str)?),
                        title: row.get(1)?,
                        body: row.get(2)?,
                        created_at: parse_ts(3, &ts_str)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("post {id}")),
                other => StoreError::Sqlite(other),
            })
    }

    /// All posts, newest first.
    pub fn list_posts(&self) -> Result<Vec<PostSummary>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, title FROM posts ORDER BY created_at DESC, id DESC")?;

        let rows = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            Ok(PostSummary {
                id: PostId(parse_uuid(0, &id_str)?),
                title: row.get(1)?,
            })
        })?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    /// A post with all of its comments as seen by `viewer`.
    pub fn get_post(&self, id: PostId, viewer: UserId) -> Result<PostDetail> {
        let post = self.get_post_row(id)?;
        let comments = self.comments_for_post(id, viewer)?;
        Ok(PostDetail {
            id: post.id,
            title: post.title,
            body: post.body,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_and_fetch_posts() {
        let db = Database::open_in_memory().unwrap();
        let first = db.create_post("Post 1", "first body").unwrap();
        let second = db.create_post("Post 2", "second body").unwrap();

        let titles: Vec<String> = db.list_posts().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&first.title));
        assert!(titles.contains(&second.title));

        let detail = db.get_post(first.id, UserId::new()).unwrap();
        assert_eq!(detail.title, "Post 1");
        assert_eq!(detail.body, "first body");
        assert!(detail.comments.is_empty());
    }

    #[test]
    fn missing_post_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_post(PostId::new(), UserId::new()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn empty_title_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.create_post("  ", "body"), Err(StoreError::InvalidInput(_))));
    }
}

//! v001 -- Initial schema creation.
//!
//! Creates `users`, `posts`, `comments` and `likes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id   TEXT PRIMARY KEY NOT NULL,         -- UUID v4
    name TEXT NOT NULL UNIQUE
);

-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    title      TEXT NOT NULL,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL                -- RFC-3339, microseconds, UTC
);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    post_id    TEXT NOT NULL,               -- FK -> posts(id)
    parent_id  TEXT,                        -- comment in the same post; no FK, replies outlive their parent
    user_id    TEXT NOT NULL,               -- FK -> users(id)
    message    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_ts
    ON comments(post_id, created_at DESC);

-- ----------------------------------------------------------------
-- Likes: existence of the row is the whole state
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS likes (
    user_id    TEXT NOT NULL,               -- FK -> users(id)
    comment_id TEXT NOT NULL,               -- FK -> comments(id)

    PRIMARY KEY (user_id, comment_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_comment ON likes(comment_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}

//! CRUD operations for [`User`] records.

use arbor_shared::UserId;
use rusqlite::{params, ErrorCode};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{parse_uuid, User};

impl Database {
    /// Insert a new user. Names must be unique and non-empty.
    pub fn create_user(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("User name is required".into()));
        }

        let user = User {
            id: UserId::new(),
            name: name.to_string(),
        };

        self.conn()
            .execute(
                "INSERT INTO users (id, name) VALUES (?1, ?2)",
                params![user.id.0.to_string(), user.name],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref f, _) if f.code == ErrorCode::ConstraintViolation => {
                    StoreError::InvalidInput(format!("User name '{}' is taken", user.name))
                }
                other => StoreError::Sqlite(other),
            })?;

        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name FROM users WHERE id = ?1",
                params![id.0.to_string()],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("user {id}")),
                other => StoreError::Sqlite(other),
            })
    }

    pub fn find_user_by_name(&self, name: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name FROM users WHERE name = ?1",
                params![name],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(format!("user '{name}'")),
                other => StoreError::Sqlite(other),
            })
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare("SELECT id, name FROM users ORDER BY name ASC")?;
        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    Ok(User {
        id: UserId(parse_uuid(0, &id_str)?),
        name: row.get(1)?,
    })
}

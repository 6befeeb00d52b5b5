use anyhow::{Result, anyhow};
use rusqlite::Connection;
use tracing::debug;

use openchat_types::models::{Message, User};

use crate::Database;
use crate::models::{MessageRow, NewMessage, NewUser, UserRow, encode_timestamp};
use crate::store::{MessageStore, StoreError, StoreResult, UserStore};

// -- Users --

impl UserStore for Database {
    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.with_conn(|conn| query_user_by_username(conn, username))?)
    }

    fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let id = self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password_hash, password_salt) VALUES (?1, ?2, ?3)",
                rusqlite::params![user.username, user.password_hash, user.password_salt],
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })?;

        let id = id.ok_or_else(|| StoreError::Conflict(format!("username '{}'", user.username)))?;
        debug!("Inserted user {} ({})", id, user.username);
        Ok(user.into_user(id))
    }
}

// -- Messages --

impl MessageStore for Database {
    fn insert_message(&self, message: NewMessage) -> StoreResult<Message> {
        let stored = self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (sender, content, timestamp) VALUES (?1, ?2, ?3)",
                rusqlite::params![message.sender, message.content, encode_timestamp(&message.timestamp)],
            )?;
            let id = conn.last_insert_rowid();
            query_message(conn, id)?.ok_or_else(|| anyhow!("Message {} missing after insert", id))
        })?;
        Ok(stored)
    }

    fn find_message(&self, id: i64) -> StoreResult<Option<Message>> {
        Ok(self.with_conn(|conn| query_message(conn, id))?)
    }

    fn list_messages(&self) -> StoreResult<Vec<Message>> {
        Ok(self.with_conn(query_messages)?)
    }

    fn update_message_content(&self, id: i64, content: &str) -> StoreResult<Option<Message>> {
        Ok(self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET content = ?1 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_message(conn, id)
        })?)
    }

    fn delete_message(&self, id: i64) -> StoreResult<bool> {
        Ok(self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })?)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, password_salt FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                password_salt: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row.map(User::from))
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<Message>> {
    let mut stmt =
        conn.prepare("SELECT id, sender, content, timestamp FROM messages WHERE id = ?1")?;

    let row = stmt.query_row([id], read_message_row).optional()?;

    row.map(Message::try_from).transpose()
}

fn query_messages(conn: &Connection) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender, content, timestamp
         FROM messages
         ORDER BY timestamp DESC, id DESC",
    )?;

    let rows = stmt
        .query_map([], read_message_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Message::try_from).collect()
}

fn read_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender: row.get(1)?,
        content: row.get(2)?,
        timestamp: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

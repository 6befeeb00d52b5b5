//! Row types and store inputs. Rows map directly to SQLite columns and stay
//! private to this crate; callers only see `openchat_types::models`.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SubsecRound, Utc};

use openchat_types::models::{Message, User};

/// A user about to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
}

impl NewUser {
    pub(crate) fn into_user(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            password_salt: self.password_salt,
        }
    }
}

/// A message about to be inserted. The store assigns the id. Stores keep the
/// timestamp at microsecond precision; anything finer is truncated.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    pub(crate) fn into_message(self, id: i64) -> Message {
        Message {
            id,
            sender: self.sender,
            content: self.content,
            timestamp: self.timestamp.trunc_subsecs(6),
        }
    }
}

pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            password_salt: row.password_salt,
        }
    }
}

pub(crate) struct MessageRow {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        let timestamp = decode_timestamp(row.timestamp)
            .with_context(|| format!("Corrupt timestamp on message {}", row.id))?;
        Ok(Message {
            id: row.id,
            sender: row.sender,
            content: row.content,
            timestamp,
        })
    }
}

/// Microseconds since the Unix epoch. Every representable `DateTime<Utc>`
/// fits, and integer order is chronological order.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

pub(crate) fn decode_timestamp(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| anyhow!("Timestamp out of range: {}", micros))
}

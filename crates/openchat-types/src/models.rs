use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the HMAC-SHA512 output stored for every user.
pub const PASSWORD_HASH_LEN: usize = 64;

/// Length of the random per-user salt, used as the HMAC key.
pub const PASSWORD_SALT_LEN: usize = 128;

/// A registered user. Never serialized: the hash and salt stay server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
}

/// Who a verified bearer token says the caller is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Presentation order: most recent first, higher id first on equal timestamps.
    pub fn newest_first(a: &Message, b: &Message) -> std::cmp::Ordering {
        b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
    }
}

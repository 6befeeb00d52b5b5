//! Storage interface shared by the authenticator and the message repository.
//!
//! Both components depend on these traits only, never on a concrete
//! connection, so `Database` and `MemoryStore` are interchangeable.

use openchat_types::models::{Message, User};

use crate::models::{NewMessage, NewUser};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0} already exists")]
    Conflict(String),

    /// Connection loss, I/O failure, corrupt row or poisoned lock.
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive match.
    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Assigns the next id. Fails with `Conflict` if the username is taken.
    fn insert_user(&self, user: NewUser) -> StoreResult<User>;
}

pub trait MessageStore: Send + Sync {
    /// Assigns the next id and returns the stored record. Timestamps are kept
    /// at microsecond precision by every implementation.
    fn insert_message(&self, message: NewMessage) -> StoreResult<Message>;

    fn find_message(&self, id: i64) -> StoreResult<Option<Message>>;

    /// Every message, most recent timestamp first, ties by descending id.
    fn list_messages(&self) -> StoreResult<Vec<Message>>;

    /// Replaces content only. `None` if no message has this id.
    fn update_message_content(&self, id: i64, content: &str) -> StoreResult<Option<Message>>;

    /// `false` if no message has this id.
    fn delete_message(&self, id: i64) -> StoreResult<bool>;
}

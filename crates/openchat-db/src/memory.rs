use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;

use openchat_types::models::{Message, User};

use crate::models::{NewMessage, NewUser};
use crate::store::{MessageStore, StoreError, StoreResult, UserStore};

/// Non-durable store with the same contract as `Database`. Every call runs
/// under one lock, so the username check and the insert cannot interleave.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    messages: BTreeMap<i64, Message>,
    last_user_id: i64,
    last_message_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(anyhow!("Memory store lock poisoned: {}", e)))
    }
}

impl UserStore for MemoryStore {
    fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.lock()?;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.lock()?;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}'", user.username)));
        }

        state.last_user_id += 1;
        let user = user.into_user(state.last_user_id);
        state.users.push(user.clone());
        Ok(user)
    }
}

impl MessageStore for MemoryStore {
    fn insert_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut state = self.lock()?;
        state.last_message_id += 1;
        let message = message.into_message(state.last_message_id);
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    fn find_message(&self, id: i64) -> StoreResult<Option<Message>> {
        Ok(self.lock()?.messages.get(&id).cloned())
    }

    fn list_messages(&self) -> StoreResult<Vec<Message>> {
        let mut messages: Vec<Message> = self.lock()?.messages.values().cloned().collect();
        messages.sort_by(Message::newest_first);
        Ok(messages)
    }

    fn update_message_content(&self, id: i64, content: &str) -> StoreResult<Option<Message>> {
        let mut state = self.lock()?;
        Ok(state.messages.get_mut(&id).map(|message| {
            message.content = content.to_string();
            message.clone()
        }))
    }

    fn delete_message(&self, id: i64) -> StoreResult<bool> {
        Ok(self.lock()?.messages.remove(&id).is_some())
    }
}

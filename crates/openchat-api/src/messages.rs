use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use openchat_db::{MessageStore, NewMessage};
use openchat_types::api::{CreateMessageRequest, MessageBody, UpdateMessageRequest};
use openchat_types::models::Message;

use crate::error::{ApiError, MessageError};
use crate::{AppState, run_blocking};

/// CRUD over stored messages. Holds no records between calls.
pub struct MessageRepository {
    store: Arc<dyn MessageStore>,
}

impl MessageRepository {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, input: Option<NewMessage>) -> Result<Message, MessageError> {
        let input = input.ok_or(MessageError::NullMessage)?;
        if input.sender.trim().is_empty() {
            return Err(MessageError::MissingSender);
        }

        let message = self.store.insert_message(input)?;
        info!("Message {} created by {}", message.id, message.sender);
        Ok(message)
    }

    /// Newest first; equal timestamps fall back to the higher id first.
    pub fn get_all(&self) -> Result<Vec<Message>, MessageError> {
        Ok(self.store.list_messages()?)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Message, MessageError> {
        self.store
            .find_message(id)?
            .ok_or(MessageError::MessageNotFound(id))
    }

    /// Content is validated before the id is looked up.
    pub fn update(&self, id: i64, content: Option<String>) -> Result<Message, MessageError> {
        let content = content.ok_or(MessageError::NullContent)?;

        let message = self
            .store
            .update_message_content(id, &content)?
            .ok_or(MessageError::MessageNotFound(id))?;
        info!("Message {} updated", id);
        Ok(message)
    }

    pub fn delete(&self, id: i64) -> Result<(), MessageError> {
        if !self.store.delete_message(id)? {
            return Err(MessageError::MessageNotFound(id));
        }
        info!("Message {} deleted", id);
        Ok(())
    }
}

// -- Handlers --

/// `{id}` path segment. A non-numeric id is rejected with the usual JSON error body.
pub struct MessageId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for MessageId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid message id: {}", e.body_text())))?;
        Ok(Self(id))
    }
}

/// An empty body or a JSON `null` is the "no message" case.
pub async fn create_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_body::<CreateMessageRequest>(&body)?.map(|req| NewMessage {
        sender: req.sender,
        content: req.content,
        timestamp: req.timestamp.unwrap_or_else(Utc::now),
    });

    let message = run_blocking(move || state.messages.create(input)).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_all_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = run_blocking(move || state.messages.get_all()).await?;
    Ok(Json(messages))
}

pub async fn get_message(
    State(state): State<AppState>,
    MessageId(id): MessageId,
) -> Result<Json<Message>, ApiError> {
    let message = run_blocking(move || state.messages.get_by_id(id)).await?;
    Ok(Json(message))
}

pub async fn update_message(
    State(state): State<AppState>,
    MessageId(id): MessageId,
    body: Bytes,
) -> Result<Json<Message>, ApiError> {
    let content = parse_body::<UpdateMessageRequest>(&body)?.and_then(|req| req.content);

    let message = run_blocking(move || state.messages.update(id, content)).await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    MessageId(id): MessageId,
) -> Result<Json<MessageBody>, ApiError> {
    run_blocking(move || state.messages.delete(id)).await?;
    Ok(Json(MessageBody::new("Message deleted")))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

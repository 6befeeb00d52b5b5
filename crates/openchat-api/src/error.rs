use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use openchat_db::StoreError;
use openchat_types::api::MessageBody;

/// Outcomes of the credential store and authenticator. Display strings are
/// what callers see.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("User doesn't exist")]
    UserNotFound,

    #[error("Wrong password")]
    InvalidCredentials,

    #[error("Token signing failed: {0}")]
    TokenSigning(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),
}

/// Outcomes of the message repository.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message is required")]
    NullMessage,

    #[error("Message sender is required")]
    MissingSender,

    #[error("Message content is required")]
    NullContent,

    #[error("Message not found")]
    MessageNotFound(i64),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),
}

/// Everything a handler can fail with, rendered as `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Missing bearer token")]
    Unauthorized,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::UsernameTaken => StatusCode::BAD_REQUEST,
                AuthError::UserNotFound
                | AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::TokenSigning(_) | AuthError::StorageUnavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Message(e) => match e {
                MessageError::NullMessage | MessageError::MissingSender | MessageError::NullContent => {
                    StatusCode::BAD_REQUEST
                }
                MessageError::MessageNotFound(_) => StatusCode::NOT_FOUND,
                MessageError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Server-side detail stays in the log.
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(MessageBody::new(message))).into_response()
    }
}

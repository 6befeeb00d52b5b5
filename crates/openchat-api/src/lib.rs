pub mod auth;
pub mod error;
pub mod greeting;
pub mod messages;
pub mod middleware;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tracing::error;

use openchat_db::{MessageStore, UserStore};

use crate::auth::{AuthConfig, Authenticator};
use crate::error::ApiError;
use crate::messages::MessageRepository;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub auth: Authenticator,
    pub messages: MessageRepository,
}

impl AppStateInner {
    /// Both components share one store but never each other.
    pub fn new<S>(store: Arc<S>, auth_config: AuthConfig) -> Self
    where
        S: UserStore + MessageStore + 'static,
    {
        Self {
            auth: Authenticator::new(store.clone(), auth_config),
            messages: MessageRepository::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/greeting", get(greeting::greeting))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/messages",
            get(messages::get_all_messages).post(messages::create_message),
        )
        .route(
            "/api/messages/{id}",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        );

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run a store-backed operation off the async runtime.
pub(crate) async fn run_blocking<F, T, E>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(Into::into)
}

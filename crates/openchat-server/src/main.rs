mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use openchat_api::auth::AuthConfig;
use openchat_api::{AppState, AppStateInner, router};
use openchat_db::{Database, MemoryStore};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openchat=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.jwt_secret.is_none() {
        warn!("OPENCHAT_JWT_SECRET is not set; register and login will fail until it is");
    }

    let auth_config = AuthConfig {
        signing_key: config.jwt_secret.clone(),
        token_ttl: chrono::Duration::hours(config.token_ttl_hours),
    };

    let app_state: AppState = if config.in_memory() {
        info!("Using in-memory store; nothing will be persisted");
        Arc::new(AppStateInner::new(Arc::new(MemoryStore::new()), auth_config))
    } else {
        let db = Database::open(&config.db_path)?;
        Arc::new(AppStateInner::new(Arc::new(db), auth_config))
    };

    let app = router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("OpenChat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

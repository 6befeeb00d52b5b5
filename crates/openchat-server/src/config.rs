use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Selects the in-memory store instead of a SQLite file.
pub const IN_MEMORY_DB: &str = ":memory:";

/// Upper bound for `OPENCHAT_TOKEN_TTL_HOURS`: one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("OPENCHAT_PORT").unwrap_or_else(|| "3000".into());
        let ttl = lookup("OPENCHAT_TOKEN_TTL_HOURS").unwrap_or_else(|| "24".into());
        let token_ttl_hours: i64 = ttl
            .parse()
            .with_context(|| format!("OPENCHAT_TOKEN_TTL_HOURS is not an integer: {}", ttl))?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "OPENCHAT_TOKEN_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }

        Ok(Self {
            host: lookup("OPENCHAT_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: port
                .parse()
                .with_context(|| format!("OPENCHAT_PORT is not a port number: {}", port))?,
            db_path: PathBuf::from(lookup("OPENCHAT_DB_PATH").unwrap_or_else(|| "openchat.db".into())),
            jwt_secret: lookup("OPENCHAT_JWT_SECRET").filter(|s| !s.is_empty()),
            token_ttl_hours,
        })
    }

    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_DB
    }
}

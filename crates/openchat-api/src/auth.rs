use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use rand_core::{OsRng, RngCore};
use sha2::Sha512;
use tracing::{info, warn};

use openchat_db::{NewUser, StoreError, UserStore};
use openchat_types::api::{AuthResponse, Claims, LoginRequest, MeResponse, RegisterRequest};
use openchat_types::models::{Identity, PASSWORD_SALT_LEN, User};

use crate::error::{ApiError, AuthError};
use crate::{AppState, run_blocking};

type HmacSha512 = Hmac<Sha512>;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

pub struct AuthConfig {
    /// HS512 secret. `None` or empty disables token issuance.
    pub signing_key: Option<String>,
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: None,
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }
}

/// A user together with a freshly issued bearer token.
#[derive(Debug)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Registers users, checks passwords and issues/verifies bearer tokens.
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    signing_key: Option<String>,
    token_ttl: Duration,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self {
            users,
            signing_key: config.signing_key.filter(|k| !k.is_empty()),
            token_ttl: config.token_ttl,
        }
    }

    pub fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        if self.users.find_user_by_username(username)?.is_some() {
            warn!("Registration rejected, username '{}' is taken", username);
            return Err(AuthError::UsernameTaken);
        }

        // No user row without a way to hand out its token.
        self.signing_key()?;
        self.token_expiry(Utc::now())?;

        let salt = generate_salt();
        let password_hash = hash_password(password, &salt);

        let user = self
            .users
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
                password_salt: salt,
            })
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::StorageUnavailable(other),
            })?;

        let token = self.issue_token(&user)?;
        info!("Registered user {} ({})", user.id, user.username);
        Ok(AuthSession { user, token })
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let Some(user) = self.users.find_user_by_username(username)? else {
            warn!("Login for unknown user '{}'", username);
            return Err(AuthError::UserNotFound);
        };

        if !verify_password(password, &user.password_salt, &user.password_hash) {
            warn!("Wrong password for user '{}'", username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        info!("User {} ({}) logged in", user.id, user.username);
        Ok(AuthSession { user, token })
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let key = self.signing_key()?;
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now.timestamp() as usize,
            exp: self.token_expiry(now)?.timestamp() as usize,
        };

        encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Checks signature and expiry and recovers who the token was issued to.
    pub fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        let key = self.signing_key()?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(key.as_bytes()),
            &Validation::new(Algorithm::HS512),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(token_data.claims.into())
    }

    fn token_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
        now.checked_add_signed(self.token_ttl)
            .ok_or_else(|| AuthError::TokenSigning("token lifetime out of range".into()))
    }

    fn signing_key(&self) -> Result<&str, AuthError> {
        self.signing_key
            .as_deref()
            .ok_or_else(|| AuthError::TokenSigning("no signing key configured".into()))
    }
}

fn generate_salt() -> Vec<u8> {
    let mut salt = vec![0u8; PASSWORD_SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

fn password_mac(password: &str, salt: &[u8]) -> HmacSha512 {
    let mut mac = HmacSha512::new_from_slice(salt).expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    mac
}

/// HMAC-SHA512 keyed by the salt. Always 64 bytes.
fn hash_password(password: &str, salt: &[u8]) -> Vec<u8> {
    password_mac(password, salt).finalize().into_bytes().to_vec()
}

/// Constant-time comparison against the stored hash.
fn verify_password(password: &str, salt: &[u8], expected: &[u8]) -> bool {
    password_mac(password, salt).verify_slice(expected).is_ok()
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    require_credentials(&req.username, &req.password)?;

    let session = run_blocking(move || state.auth.register(&req.username, &req.password)).await?;

    Ok(Json(AuthResponse {
        username: session.user.username,
        token: session.token,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    require_credentials(&req.username, &req.password)?;

    let session = run_blocking(move || state.auth.login(&req.username, &req.password)).await?;

    Ok(Json(AuthResponse {
        username: session.user.username,
        token: session.token,
    }))
}

/// Identity of the caller, as established by `require_auth`.
pub async fn me(Extension(identity): Extension<Identity>) -> Json<MeResponse> {
    Json(MeResponse {
        id: identity.user_id,
        username: identity.username,
    })
}

fn require_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".into()));
    }
    Ok(())
}

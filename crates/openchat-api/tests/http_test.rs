//! Drives the full router over an in-memory store, the way a client would.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use openchat_api::auth::AuthConfig;
use openchat_api::{AppStateInner, router};
use openchat_db::{Database, MemoryStore};

fn app() -> Router {
    let state = AppStateInner::new(
        Arc::new(MemoryStore::new()),
        AuthConfig {
            signing_key: Some("mysupersecretkey".into()),
            ..AuthConfig::default()
        },
    );
    router(Arc::new(state))
}

fn sqlite_app() -> Router {
    let state = AppStateInner::new(
        Arc::new(Database::open_in_memory().unwrap()),
        AuthConfig {
            signing_key: Some("mysupersecretkey".into()),
            ..AuthConfig::default()
        },
    );
    router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with(app, method, uri, body, None).await
}

async fn send_with(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

async fn create(app: &Router, sender: &str, content: &str, offset_secs: i64) -> Value {
    let timestamp = Utc::now() + Duration::seconds(offset_secs);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/messages",
        Some(json!({ "sender": sender, "content": content, "timestamp": timestamp })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn greeting_welcomes() {
    let (status, body) = send(&app(), Method::GET, "/api/greeting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to OPENCHAT!");
}

#[tokio::test]
async fn register_returns_username_and_token() {
    let app = app();
    let (status, body) = register(&app, "testuser", "testpassword").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "testuser");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn register_taken_username_is_bad_request() {
    let app = app();
    register(&app, "johndoe", "first").await;

    let (status, body) = register(&app, "johndoe", "testpassword").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already taken");
}

#[tokio::test]
async fn register_requires_both_fields() {
    let (status, _) = register(&app(), "", "testpassword").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_unknown_user_is_unauthorized() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/auth/login",
        Some(json!({ "username": "testuser", "password": "testpassword" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User doesn't exist");
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let app = app();
    register(&app, "johndoe", "right").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "username": "johndoe", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Wrong password");
}

#[tokio::test]
async fn login_token_identifies_the_user() {
    let app = app();
    register(&app, "johndoe", "right").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "username": "johndoe", "password": "right" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = send_with(&app, Method::GET, "/api/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "johndoe");
    assert_eq!(me["id"], 1);
}

#[tokio::test]
async fn me_rejects_missing_and_forged_tokens() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_with(&app, Method::GET, "/api/auth/me", None, Some("forged.token.value")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn get_all_messages_newest_first() {
    let app = app();
    create(&app, "user1", "Hello", 0).await;
    create(&app, "user2", "Hi", 5).await;
    create(&app, "user1", "How are you?", 10).await;

    let (status, body) = send(&app, Method::GET, "/api/messages", None).await;
    assert_eq!(status, StatusCode::OK);

    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["content"], "How are you?");
    assert_eq!(messages[2]["content"], "Hello");
}

#[tokio::test]
async fn get_all_messages_empty() {
    let (status, body) = send(&app(), Method::GET, "/api/messages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_without_timestamp_defaults_to_now() {
    let app = app();
    let before = Utc::now();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/messages",
        Some(json!({ "sender": "user1", "content": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let timestamp: chrono::DateTime<Utc> = serde_json::from_value(body["timestamp"].clone()).unwrap();
    assert!(timestamp >= before);
}

#[tokio::test]
async fn create_null_message_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/messages", Some(Value::Null)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message is required");

    let (status, _) = send(&app, Method::POST, "/api/messages", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = send(&app, Method::GET, "/api/messages", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn get_message_by_id() {
    let app = app();
    let created = create(&app, "user1", "Hello", 0).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/api/messages/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello");

    let (status, body) = send(&app, Method::GET, "/api/messages/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Message not found");
}

#[tokio::test]
async fn update_message_content() {
    let app = app();
    let created = create(&app, "user1", "Hello", 0).await;
    let uri = format!("/api/messages/{}", created["id"]);

    let (status, updated) = send(&app, Method::PUT, &uri, Some(json!({ "content": "X" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "X");
    assert_eq!(updated["sender"], created["sender"]);
    assert_eq!(updated["timestamp"], created["timestamp"]);

    let (_, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(fetched["content"], "X");
}

#[tokio::test]
async fn update_null_content_wins_over_missing_id() {
    let app = app();
    let (status, body) = send(&app, Method::PUT, "/api/messages/999", Some(json!({ "content": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message content is required");

    let (status, _) = send(&app, Method::PUT, "/api/messages/999", Some(json!({ "content": "X" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_message() {
    let app = app();
    let created = create(&app, "user1", "Hello", 0).await;
    let uri = format!("/api/messages/{}", created["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Message deleted");

    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_json_bad_request() {
    let app = app();
    for method in [Method::GET, Method::DELETE] {
        let (status, body) = send(&app, method, "/api/messages/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().is_some_and(|m| m.starts_with("Invalid message id")));
    }

    let (status, body) = send(&app, Method::PUT, "/api/messages/abc", Some(json!({ "content": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().is_some_and(|m| m.starts_with("Invalid message id")));
}

#[tokio::test]
async fn five_digit_year_survives_sqlite_store() {
    let app = sqlite_app();
    create(&app, "user1", "now", 0).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/messages",
        Some(json!({ "sender": "user1", "content": "far future", "timestamp": "+10000-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, all) = send(&app, Method::GET, "/api/messages", None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = all.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "far future");
    assert_eq!(messages[1]["content"], "now");

    let uri = format!("/api/messages/{}", created["id"]);
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["timestamp"], created["timestamp"]);
}

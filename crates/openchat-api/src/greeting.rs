use axum::Json;

use openchat_types::api::MessageBody;

pub const GREETING: &str = "Welcome to OPENCHAT!";

pub async fn greeting() -> Json<MessageBody> {
    Json(MessageBody::new(GREETING))
}

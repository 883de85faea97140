use axum::{routing::{get, post}, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

// Placeholders for the auth provider's client endpoints. The real session
// lives in the provider's cookie and is checked by `middleware::auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/session", get(session))
        .route("/api/auth/_log", post(log))
}

pub async fn session() -> Json<Value> {
    Json(json!({ "user": null, "expires": null }))
}

/// Accepts and discards whatever the client logs.
pub async fn log(body: axum::body::Bytes) -> Json<Value> {
    tracing::trace!("Discarded {} byte client auth log", body.len());
    Json(json!({ "success": true }))
}

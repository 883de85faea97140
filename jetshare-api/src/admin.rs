use axum::{extract::State, routing::get, Json, Router};
use jetshare_core::{ClientScope, Jet};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JetsResponse {
    pub jets: Vec<Jet>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/admin/jets", get(list_jets))
}

/// GET /api/admin/jets
/// Full fleet catalog, read with the service-role client.
pub async fn list_jets(State(state): State<AppState>) -> Result<Json<JetsResponse>, AppError> {
    let client = state.clients.client(ClientScope::Privileged);
    let jets = client
        .list_jets()
        .await
        .map_err(AppError::upstream("Failed to fetch jets"))?;

    Ok(Json(JetsResponse { jets }))
}

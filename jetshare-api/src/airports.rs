use axum::{extract::State, routing::get, Json, Router};
use jetshare_core::{Airport, ClientScope};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/airports", get(list_airports))
}

/// GET /api/airports
/// Public reference data; the body is a bare array sorted by city.
pub async fn list_airports(State(state): State<AppState>) -> Result<Json<Vec<Airport>>, AppError> {
    let airports = state
        .clients
        .client(ClientScope::Anonymous)
        .list_airports()
        .await
        .map_err(AppError::upstream("Failed to fetch airports"))?;

    Ok(Json(airports))
}

use axum::{
    extract::State,
    http::{header, Method},
    routing::get,
    Json, Router,
};
use jetshare_core::simulation::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
use jetshare_core::{ClientScope, SimulationRun};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::error::AppError;
use crate::extract::ValidatedQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<SimulationRun>,
}

/// The simulator is embedded on other origins, so this is the one route
/// that answers cross-origin requests.
pub fn routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/simulation/history", get(history))
        .layer(cors)
}

/// GET /api/simulation/history?limit=N
pub async fn history(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    let history = state
        .clients
        .client(ClientScope::Privileged)
        .list_runs(limit)
        .await
        .map_err(AppError::upstream("Failed to fetch simulation history"))?;

    Ok(Json(HistoryResponse { history }))
}

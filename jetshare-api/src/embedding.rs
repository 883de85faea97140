use axum::{extract::State, routing::post, Json, Router};
use jetshare_core::embedding::DEFAULT_TOP_K;
use jetshare_core::{EmbeddingRecord, QueryResponse, VectorQuery};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub values: Vec<f32>,
    pub metadata: Option<Map<String, Value>>,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[validate(length(min = 1))]
    pub vector: Vec<f32>,
    pub filter: Option<Value>,
    #[validate(range(min = 1, max = 10000))]
    pub top_k: Option<u32>,
    pub include_metadata: Option<bool>,
    pub include_values: Option<bool>,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteRequest {
    #[validate(length(min = 1))]
    pub id: String,
    pub namespace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/embedding/upsert", post(upsert))
        .route("/api/embedding/query", post(query))
        .route("/api/embedding/delete", post(delete))
}

/// An empty namespace means the index's default namespace.
fn namespace(ns: Option<String>) -> Option<String> {
    ns.filter(|n| !n.is_empty())
}

impl From<QueryRequest> for VectorQuery {
    fn from(req: QueryRequest) -> Self {
        VectorQuery {
            vector: req.vector,
            top_k: req.top_k.unwrap_or(DEFAULT_TOP_K),
            filter: req.filter,
            include_metadata: req.include_metadata.unwrap_or(true),
            include_values: req.include_values.unwrap_or(false),
            namespace: namespace(req.namespace),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/embedding/upsert
pub async fn upsert(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpsertRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ns = namespace(req.namespace);
    let record = EmbeddingRecord {
        id: req.id,
        values: req.values,
        metadata: req.metadata,
    };

    state
        .vectors
        .upsert(record, ns.as_deref())
        .await
        .map_err(AppError::upstream("Failed to upsert embedding"))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/embedding/query
/// The index's answer is relayed as-is.
pub async fn query(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let query = VectorQuery::from(req);
    let result = state
        .vectors
        .query(&query)
        .await
        .map_err(AppError::upstream("Failed to query embeddings"))?;

    tracing::debug!("Vector query returned {} matches", result.matches.len());
    Ok(Json(result))
}

/// POST /api/embedding/delete
pub async fn delete(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DeleteRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ns = namespace(req.namespace);
    state
        .vectors
        .delete(&req.id, ns.as_deref())
        .await
        .map_err(AppError::upstream("Failed to delete embedding"))?;

    Ok(Json(SuccessResponse { success: true }))
}

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod airports;
pub mod auth;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod jetshare;
pub mod middleware;
pub mod simulation;
pub mod state;

pub use error::AppError;
pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(admin::routes())
        .merge(airports::routes())
        .merge(embedding::routes())
        .merge(jetshare::routes(state.clone()))
        .merge(simulation::routes())
        .merge(auth::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

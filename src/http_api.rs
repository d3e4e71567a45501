pub mod handlers;
pub mod response;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict_single))
        .route("/predict/bulk", post(handlers::predict_bulk))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub mod health;
pub mod metrics;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::infra::app_state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .route("/healthz", get(health::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

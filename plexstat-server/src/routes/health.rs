use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use crate::infra::app_state::AppState;

/// `200` once any refresh has committed, `503` until then.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.status.snapshot();
    let ready = snapshot.is_ready();
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if ready { "ok" } else { "starting" },
        "uptime_seconds": (Utc::now() - state.started_at).num_seconds(),
        "refreshes": {
            "success": snapshot.successes,
            "failure": snapshot.failures,
            "overlap": snapshot.overlaps,
        },
        "last_success": snapshot.last_success,
        "last_error": snapshot.last_error,
        "last_report": snapshot.last_report,
    });

    (code, Json(body)).into_response()
}

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{exposition, infra::app_state::AppState};

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = exposition::render(&state.counters.snapshot(), &state.status.snapshot());
    ([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body)
}

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;

use crate::SharedState;

pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// Flips to 503 during graceful shutdown so load balancers drain first.
pub async fn readyz(State(state): State<SharedState>) -> StatusCode {
    if state.readiness.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::ApiState;

/// 200 while the database answers, 503 otherwise.
pub(super) async fn get_health(State(state): State<ApiState>) -> StatusCode {
    match state.repo.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(task = "healthz", error = format!("{:?}", e));
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

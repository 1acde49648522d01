use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness message returned by `GET /`.
pub const LIVENESS_MESSAGE: &str = "Vitals monitor is running";

/// Liveness response payload.
#[derive(Serialize)]
pub struct LivenessResponse {
    pub message: &'static str,
}

/// GET / -- static liveness indicator.
async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: LIVENESS_MESSAGE,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(liveness))
}

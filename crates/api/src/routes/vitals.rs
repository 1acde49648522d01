use axum::extract::State;
use axum::{routing::get, Json, Router};
use vitals_core::Snapshot;

use crate::state::AppState;

/// GET /latest-iot-data -- last value written per metric, `null` when absent.
///
/// Reflects whatever the monitor last wrote, which may be mid-cycle.
async fn latest_iot_data(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshot.read().await)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/latest-iot-data", get(latest_iot_data))
}

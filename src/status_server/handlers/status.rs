//! JSON status handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::super::types::{DatabaseStatus, RequestCounts, StatusResponse, StatusState};
use crate::error_handling::Outcome;

/// JSON status endpoint with policy, database and counters
pub async fn status_handler(State(state): State<StatusState>) -> Response {
    let gate = &state.gate;
    let stats = gate.stats();

    let response = StatusResponse {
        mode: gate.mode().to_string(),
        country_count: gate.countries().len(),
        trust_headers: gate.trusts_headers(),
        update_interval_seconds: gate.update_interval().as_secs(),
        refresh_running: gate.is_refreshing(),
        uptime_seconds: state.start_time.elapsed().as_secs_f64(),
        database: gate.database_info().map(DatabaseStatus::from),
        requests: RequestCounts {
            total: stats.total_requests(),
            forwarded: stats.get(Outcome::Forwarded),
            denied: stats.total_denied(),
        },
        counters: stats
            .snapshot()
            .into_iter()
            .map(|(outcome, count)| (outcome.name(), count))
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

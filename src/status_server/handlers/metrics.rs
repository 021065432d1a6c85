//! Prometheus metrics handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt::Write;

use super::super::types::StatusState;

/// Prometheus-compatible metrics endpoint
pub async fn metrics_handler(State(state): State<StatusState>) -> Response {
    let gate = &state.gate;
    let mut metrics = String::new();

    metrics.push_str(
        "# HELP geo_gate_events_total Gate events by outcome\n# TYPE geo_gate_events_total counter\n",
    );
    for (outcome, count) in gate.stats().snapshot() {
        let _ = writeln!(
            metrics,
            "geo_gate_events_total{{outcome=\"{}\"}} {}",
            outcome.name(),
            count
        );
    }

    let loaded_at = gate
        .database_info()
        .and_then(|info| info.loaded_at.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let _ = write!(
        metrics,
        r#"
# HELP geo_gate_requests_total Requests evaluated by the gate
# TYPE geo_gate_requests_total counter
geo_gate_requests_total {}

# HELP geo_gate_database_loaded_timestamp_seconds Unix time the active database was loaded
# TYPE geo_gate_database_loaded_timestamp_seconds gauge
geo_gate_database_loaded_timestamp_seconds {}

# HELP geo_gate_countries Number of configured country codes
# TYPE geo_gate_countries gauge
geo_gate_countries {}

# HELP geo_gate_uptime_seconds Seconds since the status server started
# TYPE geo_gate_uptime_seconds gauge
geo_gate_uptime_seconds {}
"#,
        gate.stats().total_requests(),
        loaded_at,
        gate.countries().len(),
        state.start_time.elapsed().as_secs_f64()
    );

    (StatusCode::OK, metrics).into_response()
}

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::duration::format_duration;
use crate::config::{ChaosConfig, ConfigError};
use crate::http::response::rfc3339_now;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct UpdateStatus {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct StatsReport {
    pub total_requests: u64,
    pub delays_injected: u64,
    pub errors_injected: u64,
    pub timeouts_injected: u64,
    pub management_requests: u64,
    pub delay_percentage: f64,
    pub error_percentage: f64,
    pub timeout_percentage: f64,
    pub uptime: String,
    pub started_at: String,
    pub config: ChaosConfig,
}

#[derive(Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub chaos: &'static str,
    pub timestamp: String,
    pub target: String,
}

pub async fn get_config(State(state): State<AppState>) -> Json<ChaosConfig> {
    Json(ChaosConfig::clone(&state.engine.config()))
}

/// Replace the whole configuration. Fields missing from the body fall back
/// to zero values.
pub async fn update_config(State(state): State<AppState>, body: Bytes) -> Response {
    match state.engine.replace_from_json(&body) {
        Ok(config) => {
            tracing::info!(
                delay_probability = config.delay_probability,
                error_probability = config.error_probability,
                timeout_probability = config.timeout_probability,
                "Configuration updated"
            );
            Json(UpdateStatus { status: "updated" }).into_response()
        }
        Err(e @ ConfigError::Validation(_)) => {
            tracing::warn!(error = %e, "Rejected configuration update");
            (StatusCode::BAD_REQUEST, format!("Invalid configuration: {e}")).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected configuration update");
            (StatusCode::BAD_REQUEST, "Invalid JSON").into_response()
        }
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsReport> {
    let stats = state.engine.stats();
    let snapshot = stats.snapshot();

    Json(StatsReport {
        total_requests: snapshot.total_requests,
        delays_injected: snapshot.delays_injected,
        errors_injected: snapshot.errors_injected,
        timeouts_injected: snapshot.timeouts_injected,
        management_requests: snapshot.management_requests,
        delay_percentage: snapshot.delay_percentage(),
        error_percentage: snapshot.error_percentage(),
        timeout_percentage: snapshot.timeout_percentage(),
        uptime: format_duration(snapshot.uptime),
        started_at: stats
            .started_at()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        config: ChaosConfig::clone(&state.engine.config()),
    })
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        chaos: "enabled",
        timestamp: rfc3339_now(),
        target: state.forwarder.target().to_string(),
    })
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

//! Health check endpoint handler.
//!
//! Reports whether the most recent sampling pass produced rows and how long
//! the service has been up.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-sysstats — More info: https://www.herakles.now — Support: exporter@herakles.now";

/// Formats an uptime in seconds as `1h 2m 3s`.
pub fn format_uptime(uptime_secs: u64) -> String {
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let telemetry = &state.telemetry;
    let samples = telemetry.samples_total.get() as u64;
    let failures = telemetry.sample_failures_total.get() as u64;
    // No pass yet counts as healthy
    let healthy = samples == 0 || telemetry.last_sample_success.get() >= 1.0;

    let (status, message) = if healthy {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Last sampling pass failed")
    };

    let mut out = String::new();
    writeln!(out, "{message}").ok();
    writeln!(out).ok();
    writeln!(
        out,
        "Uptime:                 {}",
        format_uptime(state.start_time.elapsed().as_secs())
    )
    .ok();
    writeln!(out, "Sampling passes:        {}", samples).ok();
    writeln!(out, "Failed passes:          {}", failures).ok();
    writeln!(
        out,
        "Last pass duration:     {:.3}s",
        telemetry.sample_duration_seconds.get()
    )
    .ok();
    writeln!(
        out,
        "Processes reported:     {}",
        telemetry.processes_reported.get() as u64
    )
    .ok();
    writeln!(out).ok();
    writeln!(out, "{FOOTER_TEXT}").ok();

    debug!("Health check: {} - {}", status, message);
    (status, [("Content-Type", "text/plain; charset=utf-8")], out)
}

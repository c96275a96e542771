//! Metrics endpoint handler for Prometheus scraping.
//!
//! Host gauges are refreshed on each scrape; sampling telemetry is updated
//! by the passes themselves.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_sysstats::system::{read_load_average, read_memory_info};
use prometheus::{Encoder, TextEncoder};
use tracing::{debug, error, instrument};

use crate::handlers::system::read_blocking;
use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 16 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
    Disabled,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        match self {
            MetricsError::EncodingFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response(),
            MetricsError::Disabled => {
                (StatusCode::NOT_FOUND, "Telemetry is disabled").into_response()
            }
        }
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    debug!("Processing /metrics request");

    if !state.config.enable_telemetry.unwrap_or(true) {
        return Err(MetricsError::Disabled);
    }

    let root = state.proc_root.clone();
    if let Ok(load) = read_blocking("load average", move || read_load_average(&root)).await {
        state.telemetry.set_load(&load);
    }
    let root = state.proc_root.clone();
    if let Ok(mem) = read_blocking("memory information", move || read_memory_info(&root)).await {
        state.telemetry.set_memory(&mem);
    }

    let families = state.registry.gather();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if encoder.encode(&families, &mut buffer).is_err() {
        error!("Failed to encode Prometheus metrics");
        return Err(MetricsError::EncodingFailed);
    }

    debug!("Metrics request completed: {} bytes", buffer.len());
    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}

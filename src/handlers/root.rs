//! Root endpoint handler with the plain-text index of all endpoints.

use axum::{extract::State, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::health::{format_uptime, FOOTER_TEXT};
use crate::state::SharedState;

const ENDPOINTS: &[(&str, &str)] = &[
    ("/processes", "Per-process CPU and memory usage (JSON, ?process=<pid|name>)"),
    ("/process_info", "Process and thread counts by state (JSON)"),
    ("/load_avg", "1, 5 and 15 minute load averages (JSON)"),
    ("/memory_info", "Physical memory and swap usage (JSON)"),
    ("/cpu_usage_info", "System CPU time share per mode over a short window (JSON)"),
    ("/cpu_info", "Per-processor vendor, model and clock (JSON)"),
    ("/os_info", "OS name, kernel, host name and system counts (JSON)"),
    ("/network_info", "Network interface traffic counters (JSON)"),
    ("/disk_info", "Filesystem space and inode usage (JSON)"),
    ("/io_analysis", "Block device I/O counters (JSON)"),
    ("/metrics", "Prometheus telemetry of the service"),
    ("/health", "Service health"),
    ("/config", "Effective configuration"),
];

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let settings = state.sampler.settings();
    let host = state.sampler.host();

    let mut out = String::new();
    writeln!(out, "HERAKLES SYSSTATS {}", env!("CARGO_PKG_VERSION")).ok();
    writeln!(out, "Built: {}", env!("VERGEN_BUILD_TIMESTAMP")).ok();
    writeln!(
        out,
        "Uptime: {}",
        format_uptime(state.start_time.elapsed().as_secs())
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "SAMPLING").ok();
    writeln!(out, "--------").ok();
    writeln!(out, "interval:        {} ms", settings.interval.as_millis()).ok();
    writeln!(out, "baseline_policy: {}", settings.baseline_policy).ok();
    writeln!(out, "logical_cores:   {}", host.logical_cores).ok();
    writeln!(out).ok();

    writeln!(out, "ENDPOINTS").ok();
    writeln!(out, "---------").ok();
    for (path, description) in ENDPOINTS {
        writeln!(out, "{:16} {}", path, description).ok();
    }
    writeln!(out).ok();
    writeln!(out, "{FOOTER_TEXT}").ok();

    ([("Content-Type", "text/plain; charset=utf-8")], out)
}

//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the effective service configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::{DEFAULT_BIND_ADDR, DEFAULT_PORT};
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

fn format_list(list: &Option<Vec<String>>) -> String {
    match list {
        Some(names) if !names.is_empty() => names.join(", "),
        _ => "(none)".to_string(),
    }
}

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");

    let cfg = &state.config;
    let settings = state.sampler.settings();
    let host = state.sampler.host();

    let mut out = String::new();

    writeln!(out, "HERAKLES SYSSTATS - CONFIGURATION").ok();
    writeln!(out, "=================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(
        out,
        "bind:                 {}",
        cfg.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    )
    .ok();
    writeln!(
        out,
        "port:                 {}",
        cfg.port.unwrap_or(DEFAULT_PORT)
    )
    .ok();
    writeln!(
        out,
        "enable_health:        {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "enable_telemetry:     {}",
        cfg.enable_telemetry.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "log_level:            {}",
        cfg.log_level.as_deref().unwrap_or("info")
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "SAMPLING").ok();
    writeln!(out, "--------").ok();
    writeln!(
        out,
        "sample_interval_ms:   {}",
        settings.interval.as_millis()
    )
    .ok();
    writeln!(
        out,
        "sample_timeout_ms:    {}",
        state.sample_timeout.as_millis()
    )
    .ok();
    writeln!(out, "baseline_policy:      {}", settings.baseline_policy).ok();
    writeln!(out, "proc_root:            {}", state.proc_root.display()).ok();
    writeln!(out, "sys_root:             {}", state.sys_root.display()).ok();
    writeln!(
        out,
        "cpu_usage_interval:   {}",
        state.cpu_usage_interval.as_millis()
    )
    .ok();
    writeln!(
        out,
        "test_data_file:       {}",
        cfg.test_data_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "FILTERS").ok();
    writeln!(out, "-------").ok();
    writeln!(out, "include_names:        {}", format_list(&cfg.include_names)).ok();
    writeln!(out, "exclude_names:        {}", format_list(&cfg.exclude_names)).ok();
    writeln!(out).ok();

    writeln!(out, "HOST").ok();
    writeln!(out, "----").ok();
    writeln!(out, "logical_cores:        {}", host.logical_cores).ok();
    writeln!(
        out,
        "physical_memory:      {} bytes",
        host.physical_memory_bytes
    )
    .ok();
    writeln!(out, "page_size:            {} bytes", host.page_size_bytes).ok();
    writeln!(out).ok();
    writeln!(out, "{FOOTER_TEXT}").ok();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        out,
    )
}

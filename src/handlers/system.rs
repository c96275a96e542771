//! Host reader endpoints: process state counts, load average, memory,
//! system CPU usage, CPU, OS, network, disk and block device information.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use herakles_sysstats::collectors::{
    read_cpu_info, read_disk_info, read_io_stats, read_network_info, read_os_info, CpuInfo,
    DiskInfo, IoStats, NetworkInterface, OsInfo,
};
use herakles_sysstats::process::count_process_states;
use herakles_sysstats::system::{read_load_average, read_memory_info};
use herakles_sysstats::{
    sample_cpu_usage, CpuUsage, LoadAverage, MemoryInfo, ProcessStateCounts, SampleError,
};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::state::SharedState;

/// Error type for host reader endpoints.
#[derive(Debug)]
pub enum ReadError {
    Unavailable(String),
}

impl IntoResponse for ReadError {
    fn into_response(self) -> Response {
        match self {
            ReadError::Unavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": reason })),
            )
                .into_response(),
        }
    }
}

/// Runs a blocking /proc read off the async executor.
pub(crate) async fn read_blocking<T, F>(what: &'static str, f: F) -> Result<T, ReadError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!("Failed to read {}: {}", what, e);
            Err(ReadError::Unavailable(format!("{} unavailable: {}", what, e)))
        }
        Err(e) => Err(ReadError::Unavailable(format!(
            "{} reader task failed: {}",
            what, e
        ))),
    }
}

/// Handler for the /process_info endpoint.
#[instrument(skip(state))]
pub async fn process_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<ProcessStateCounts>, ReadError> {
    debug!("Processing /process_info request");
    let root = state.proc_root.clone();
    let counts = read_blocking("process information", move || {
        count_process_states(&root).map_err(|e| e.to_string())
    })
    .await?;
    Ok(Json(counts))
}

/// Handler for the /load_avg endpoint.
#[instrument(skip(state))]
pub async fn load_avg_handler(
    State(state): State<SharedState>,
) -> Result<Json<LoadAverage>, ReadError> {
    debug!("Processing /load_avg request");
    let root = state.proc_root.clone();
    let load = read_blocking("load average", move || read_load_average(&root)).await?;
    state.telemetry.set_load(&load);
    Ok(Json(load))
}

/// Handler for the /memory_info endpoint.
#[instrument(skip(state))]
pub async fn memory_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<MemoryInfo>, ReadError> {
    debug!("Processing /memory_info request");
    let root = state.proc_root.clone();
    let mem = read_blocking("memory information", move || read_memory_info(&root)).await?;
    state.telemetry.set_memory(&mem);
    Ok(Json(mem))
}

/// Handler for the /cpu_usage_info endpoint.
///
/// Reads the aggregate CPU counters twice, `cpu_usage_interval` apart.
#[instrument(skip(state))]
pub async fn cpu_usage_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<CpuUsage>, ReadError> {
    debug!("Processing /cpu_usage_info request");
    let ctx = state.sample_context();
    match sample_cpu_usage(&state.proc_root, state.cpu_usage_interval, &ctx).await {
        Ok(usage) => Ok(Json(usage)),
        Err(SampleError::Cancelled) => Err(ReadError::Unavailable(
            "cpu usage measurement cancelled".to_string(),
        )),
        Err(e) => {
            warn!("Failed to measure cpu usage: {}", e);
            Err(ReadError::Unavailable(e.to_string()))
        }
    }
}

/// Handler for the /cpu_info endpoint.
#[instrument(skip(state))]
pub async fn cpu_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<CpuInfo>>, ReadError> {
    debug!("Processing /cpu_info request");
    let root = state.proc_root.clone();
    let cpus = read_blocking("cpu information", move || read_cpu_info(&root)).await?;
    Ok(Json(cpus))
}

/// Handler for the /os_info endpoint. Unreadable fields are null.
#[instrument(skip(state))]
pub async fn os_info_handler(State(state): State<SharedState>) -> Result<Json<OsInfo>, ReadError> {
    debug!("Processing /os_info request");
    let root = state.proc_root.clone();
    let release = state.os_release_path.clone();
    let info = read_blocking("os information", move || Ok(read_os_info(&root, &release))).await?;
    Ok(Json(info))
}

/// Handler for the /network_info endpoint.
#[instrument(skip(state))]
pub async fn network_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<NetworkInterface>>, ReadError> {
    debug!("Processing /network_info request");
    let root = state.proc_root.clone();
    let sys_root = state.sys_root.clone();
    let interfaces =
        read_blocking("network information", move || read_network_info(&root, &sys_root)).await?;
    Ok(Json(interfaces))
}

/// Handler for the /disk_info endpoint.
#[instrument(skip(state))]
pub async fn disk_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<DiskInfo>>, ReadError> {
    debug!("Processing /disk_info request");
    let root = state.proc_root.clone();
    let disks = read_blocking("disk information", move || read_disk_info(&root)).await?;
    Ok(Json(disks))
}

/// Handler for the /io_analysis endpoint.
#[instrument(skip(state))]
pub async fn io_analysis_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<IoStats>>, ReadError> {
    debug!("Processing /io_analysis request");
    let root = state.proc_root.clone();
    let stats = read_blocking("io statistics", move || read_io_stats(&root)).await?;
    Ok(Json(stats))
}

//! HTTP endpoint handlers for the service.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Plain-text index
//! - `/processes`: Per-process CPU and memory usage rows (JSON)
//! - `/process_info`, `/load_avg`, `/memory_info`: Host readers (JSON)
//! - `/cpu_usage_info`: System CPU usage per mode over a short window (JSON)
//! - `/cpu_info`, `/os_info`, `/network_info`, `/disk_info`, `/io_analysis`:
//!   CPU, OS, network, filesystem and block device readers (JSON)
//! - `/metrics`: Prometheus telemetry endpoint
//! - `/health`: Health check endpoint
//! - `/config`: Configuration display endpoint

pub mod config;
pub mod health;
pub mod metrics;
pub mod processes;
pub mod root;
pub mod system;

// Re-export handlers
pub use config::config_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use processes::processes_handler;
pub use root::root_handler;
pub use system::{
    cpu_info_handler, cpu_usage_info_handler, disk_info_handler, io_analysis_handler,
    load_avg_handler, memory_info_handler, network_info_handler, os_info_handler,
    process_info_handler,
};

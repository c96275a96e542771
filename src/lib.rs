//! Herakles Sysstats Library
//!
//! Host telemetry read from the operating system and shaped into rows:
//! per-process CPU and memory usage, system-wide CPU usage, process state
//! counts, load average, memory, CPU, OS, network, disk and block device
//! information.
//!
//! # Process usage sampling
//!
//! CPU utilization per process is derived from two snapshots of cumulative
//! tick counters taken a short interval apart (100 ms by default). Each
//! process's tick delta is divided by the system-wide tick delta over the
//! same window and scaled by the number of logical cores.
//!
//! - Processes that exit during the window are dropped.
//! - Processes that start during the window follow the [`BaselinePolicy`].
//! - A zero system tick delta reports 0 % for every process.
//! - A counter that goes backwards reports an unknown (`None`) CPU figure.
//! - Percentages are rounded half-up to two decimal places.
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_sysstats::{platform, SampleContext, Sampler, SamplerSettings};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), herakles_sysstats::SampleError> {
//! let sources = platform::default_sources(Path::new("/proc"))?;
//! let sampler = Sampler::new(sources, SamplerSettings::default());
//!
//! let ctx = SampleContext::new().with_timeout(Duration::from_secs(1));
//! for row in sampler.sample_or_empty(&ctx).await {
//!     println!("{} {} {:?}%", row.pid, row.name, row.cpu_percent);
//! }
//! # Ok(())
//! # }
//! ```

pub mod collectors;
pub mod error;
pub mod numeric;
pub mod platform;
pub mod process;
pub mod sampler;
pub mod source;
pub mod system;

// Re-export main types for convenience
pub use error::SampleError;
pub use process::{
    correlate, BaselinePolicy, CorrelatedProcessUsage, NameFilter, ProcessFilter, ProcessSample,
    ProcessStateCounts, Snapshot, SnapshotSet,
};
pub use sampler::{
    sample_cpu_usage, sample_process_usage, SampleContext, Sampler, SamplerSettings,
    DEFAULT_CPU_USAGE_INTERVAL, DEFAULT_SAMPLE_INTERVAL,
};
pub use source::{HostParameters, PlatformSources, ProcessSnapshotSource, SystemCounterSource};
pub use system::{CpuUsage, LoadAverage, MemoryInfo};

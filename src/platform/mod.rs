//! Platform adapters supplying snapshots to the sampler.
//!
//! - `procfs`: Linux /proc readers
//! - `fixture`: replay of recorded snapshots from a JSON test data file

pub mod fixture;
pub mod procfs;

pub use fixture::{fixture_sources, load_fixture, Fixture, FixtureSource, RecordedSnapshot};
pub use procfs::{read_host_parameters, ProcfsCpuCounters, ProcfsProcessSource, DEFAULT_PROC_ROOT};

use std::path::Path;
#[cfg(target_os = "linux")]
use std::sync::Arc;

use crate::error::SampleError;
use crate::source::PlatformSources;

/// Sources for the running platform, reading from `proc_root`.
#[cfg(target_os = "linux")]
pub fn default_sources(proc_root: &Path) -> Result<PlatformSources, SampleError> {
    if !proc_root.is_dir() {
        return Err(SampleError::unavailable(
            "procfs",
            format!("{} is not a directory", proc_root.display()),
        ));
    }

    Ok(PlatformSources {
        processes: Arc::new(ProcfsProcessSource::new(proc_root)),
        counters: Arc::new(ProcfsCpuCounters::new(proc_root)),
        host: read_host_parameters(proc_root),
    })
}

/// Sources for the running platform. Only Linux is implemented.
#[cfg(not(target_os = "linux"))]
pub fn default_sources(_proc_root: &Path) -> Result<PlatformSources, SampleError> {
    Err(SampleError::unavailable(
        "platform",
        format!("unsupported platform: {}", std::env::consts::OS),
    ))
}

//! Linux `/proc` implementations of the sampling sources.
//!
//! Per-process ticks come from `/proc/<pid>/stat` (utime + stime) and the
//! system total from the aggregate `cpu` line of `/proc/stat`. Both are in
//! USER_HZ clock ticks, so no unit conversion is needed before correlation.

use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::SampleError;
use crate::numeric::ticks_to_seconds;
use crate::process::{collect_proc_entries, read_proc_stat, ProcessSample, CLK_TCK, ONLINE_CPUS, PAGE_SIZE};
use crate::source::{HostParameters, ProcessSnapshotSource, SystemCounterSource};
use crate::system::{read_boot_time, read_cpu_total, read_memory_info};

/// Default mount point of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Enumerates processes by scanning `<root>/<pid>/stat`.
#[derive(Debug, Clone)]
pub struct ProcfsProcessSource {
    root: PathBuf,
}

impl ProcfsProcessSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProcessSnapshotSource for ProcfsProcessSource {
    fn name(&self) -> &'static str {
        "procfs process list"
    }

    fn enumerate(&self) -> Result<Vec<ProcessSample>, SampleError> {
        let boot_time =
            read_boot_time(&self.root).map_err(|e| SampleError::unavailable(self.name(), e))?;
        let entries = collect_proc_entries(&self.root, None).map_err(|e| {
            SampleError::unavailable(
                self.name(),
                format!("Failed to read {}: {}", self.root.display(), e),
            )
        })?;

        let mut samples = Vec::with_capacity(entries.len());
        for entry in entries {
            // Processes exit between listing and reading; skip them quietly
            let stat = match read_proc_stat(&entry.proc_path) {
                Ok(s) => s,
                Err(e) => {
                    trace!("Skipping pid {}: {}", entry.pid, e);
                    continue;
                }
            };

            let started_after_boot = ticks_to_seconds(stat.starttime, *CLK_TCK) as u64;
            samples.push(ProcessSample::new(
                entry.pid,
                &stat.comm,
                stat.cpu_ticks(),
                stat.rss_pages,
                boot_time.saturating_add(started_after_boot),
            )
            .with_start_ticks(stat.starttime));
        }

        trace!("Enumerated {} processes from {}", samples.len(), self.root.display());
        Ok(samples)
    }
}

/// System-wide tick total from `<root>/stat`.
#[derive(Debug, Clone)]
pub struct ProcfsCpuCounters {
    root: PathBuf,
}

impl ProcfsCpuCounters {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SystemCounterSource for ProcfsCpuCounters {
    fn name(&self) -> &'static str {
        "procfs cpu counters"
    }

    fn total_ticks(&self) -> Result<u64, SampleError> {
        read_cpu_total(&self.root)
            .map(|stat| stat.total())
            .map_err(|e| SampleError::unavailable(self.name(), e))
    }
}

/// Reads host constants. Unreadable values become 0, which marks them unknown.
pub fn read_host_parameters(root: &Path) -> HostParameters {
    let physical_memory_bytes = match read_memory_info(root) {
        Ok(info) => info.total_bytes,
        Err(e) => {
            debug!("Physical memory unknown: {}", e);
            0
        }
    };

    HostParameters {
        logical_cores: *ONLINE_CPUS,
        physical_memory_bytes,
        page_size_bytes: *PAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_counters_missing_root() {
        let dir = tempdir().expect("Failed to create temp dir");
        let counters = ProcfsCpuCounters::new(dir.path().join("missing"));
        assert!(matches!(
            counters.total_ticks(),
            Err(SampleError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_host_parameters_without_meminfo() {
        let dir = tempdir().expect("Failed to create temp dir");
        let host = read_host_parameters(dir.path());
        assert_eq!(host.physical_memory_bytes, 0);
        assert!(!host.memory_known());
    }

    #[test]
    fn test_host_parameters_with_meminfo() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("meminfo"), "MemTotal: 2048 kB\n").unwrap();
        let host = read_host_parameters(dir.path());
        assert_eq!(host.physical_memory_bytes, 2048 * 1024);
        assert!(host.logical_cores >= 1);
    }
}

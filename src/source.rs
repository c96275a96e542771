//! Capability interfaces implemented once per platform.
//!
//! The correlator never touches the operating system directly. Each
//! platform supplies a process enumerator, a system-wide tick counter and
//! the host constants used to normalize memory figures.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::SampleError;
use crate::process::ProcessSample;

/// Enumerates every process visible at the caller's privilege level.
///
/// Processes that vanish or cannot be read mid-scan are omitted; only a
/// failure to list processes at all is an error. Per-process ticks must use
/// the same unit as [`SystemCounterSource::total_ticks`].
pub trait ProcessSnapshotSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn enumerate(&self) -> Result<Vec<ProcessSample>, SampleError>;
}

/// Cumulative system-wide CPU ticks across all cores and scheduling classes.
pub trait SystemCounterSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn total_ticks(&self) -> Result<u64, SampleError>;
}

/// Host constants needed to turn samples into percentages.
///
/// A zero `physical_memory_bytes` or `page_size_bytes` means "unknown" and
/// suppresses `memory_percent` in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostParameters {
    pub logical_cores: u32,
    pub physical_memory_bytes: u64,
    /// Multiplier from `resident_memory` to bytes (1 when the source reports bytes).
    pub page_size_bytes: u64,
}

impl HostParameters {
    pub fn memory_known(&self) -> bool {
        self.physical_memory_bytes > 0 && self.page_size_bytes > 0
    }
}

/// The set of collaborators a sampler needs for one platform.
#[derive(Clone)]
pub struct PlatformSources {
    pub processes: Arc<dyn ProcessSnapshotSource>,
    pub counters: Arc<dyn SystemCounterSource>,
    pub host: HostParameters,
}

impl std::fmt::Debug for PlatformSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSources")
            .field("processes", &self.processes.name())
            .field("counters", &self.counters.name())
            .field("host", &self.host)
            .finish()
    }
}

//! Process samples and the two-generation snapshot set.
//!
//! A `Snapshot` is built fresh for every sampling pass and dropped as soon
//! as the correlated rows are produced. Nothing here is shared between
//! invocations.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};

/// Maximum stored length of a process name, in characters.
pub const MAX_PROCESS_NAME_LEN: usize = 256;

/// Truncates `name` to `MAX_PROCESS_NAME_LEN` characters.
pub fn bounded_name(name: &str) -> String {
    name.chars().take(MAX_PROCESS_NAME_LEN).collect()
}

/// One process's state at a single point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    /// Cumulative user+system ticks, same unit as the system-wide total.
    pub cpu_ticks: u64,
    /// Resident set size in the source's native unit (pages or bytes).
    pub resident_memory: u64,
    /// Process start time in seconds since the Unix epoch.
    pub started_at_seconds: u64,
    /// Start time in clock ticks since boot, when the source exposes it.
    /// Unlike `started_at_seconds` it does not move with the wall clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ticks: Option<u64>,
}

impl ProcessSample {
    /// Builds a sample, truncating the name to `MAX_PROCESS_NAME_LEN` characters.
    pub fn new(
        pid: u32,
        name: &str,
        cpu_ticks: u64,
        resident_memory: u64,
        started_at_seconds: u64,
    ) -> Self {
        Self {
            pid,
            name: bounded_name(name),
            cpu_ticks,
            resident_memory,
            started_at_seconds,
            start_ticks: None,
        }
    }

    pub fn with_start_ticks(mut self, start_ticks: u64) -> Self {
        self.start_ticks = Some(start_ticks);
        self
    }

    /// Two samples describe the same process when pid and start time agree.
    /// A pid reused between snapshots has a different start time.
    ///
    /// Start ticks are compared when both samples carry them, since the
    /// epoch start time shifts whenever the boot time is re-derived from a
    /// stepped wall clock.
    pub fn same_process(&self, other: &ProcessSample) -> bool {
        if self.pid != other.pid {
            return false;
        }
        match (self.start_ticks, other.start_ticks) {
            (Some(a), Some(b)) => a == b,
            _ => self.started_at_seconds == other.started_at_seconds,
        }
    }
}

/// All processes plus the system-wide tick total captured at one instant.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub system_ticks: u64,
    processes: HashMap<u32, ProcessSample>,
}

impl Snapshot {
    /// Builds a snapshot keyed by pid. On duplicate pids the last sample wins.
    pub fn new(system_ticks: u64, samples: Vec<ProcessSample>) -> Self {
        let mut processes = HashMap::with_capacity(samples.len());
        for sample in samples {
            processes.insert(sample.pid, sample);
        }
        Self {
            system_ticks,
            processes,
        }
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessSample> {
        self.processes.get(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Samples ordered by pid, so output rows are stable across runs.
    pub fn samples_by_pid(&self) -> Vec<&ProcessSample> {
        let mut samples: Vec<&ProcessSample> = self.processes.values().collect();
        samples.sort_unstable_by_key(|s| s.pid);
        samples
    }
}

/// Two snapshots taken a short interval apart (`first` at T0, `second` at T1).
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    pub first: Snapshot,
    pub second: Snapshot,
}

/// One output row of the per-process usage query.
///
/// Fields are independently nullable: `cpu_percent` is `None` when a tick
/// counter went backwards, `memory_percent` is `None` when total physical
/// memory is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedProcessUsage {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
    pub resident_bytes: u64,
    pub running_since_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_truncated() {
        let long = "x".repeat(MAX_PROCESS_NAME_LEN + 40);
        let sample = ProcessSample::new(1, &long, 0, 0, 0);
        assert_eq!(sample.name.chars().count(), MAX_PROCESS_NAME_LEN);
    }

    #[test]
    fn test_snapshot_duplicate_pid_last_wins() {
        let snap = Snapshot::new(
            10,
            vec![
                ProcessSample::new(7, "a", 1, 0, 100),
                ProcessSample::new(7, "b", 2, 0, 100),
            ],
        );
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get(7).map(|s| s.name.as_str()), Some("b"));
    }

    #[test]
    fn test_same_process_detects_pid_reuse() {
        let a = ProcessSample::new(42, "old", 10, 0, 1000);
        let b = ProcessSample::new(42, "new", 1, 0, 1001);
        assert!(!a.same_process(&b));
        assert!(a.same_process(&a.clone()));
    }

    #[test]
    fn test_same_process_prefers_start_ticks() {
        // Boot time moved by one second between the two reads
        let a = ProcessSample::new(42, "tmux", 10, 0, 1000).with_start_ticks(500);
        let b = ProcessSample::new(42, "tmux", 12, 0, 1001).with_start_ticks(500);
        assert!(a.same_process(&b));

        let reused = ProcessSample::new(42, "tmux", 1, 0, 1000).with_start_ticks(900);
        assert!(!a.same_process(&reused));
    }

    #[test]
    fn test_samples_by_pid_sorted() {
        let snap = Snapshot::new(
            0,
            vec![
                ProcessSample::new(30, "c", 0, 0, 0),
                ProcessSample::new(10, "a", 0, 0, 0),
                ProcessSample::new(20, "b", 0, 0, 0),
            ],
        );
        let pids: Vec<u32> = snap.samples_by_pid().iter().map(|s| s.pid).collect();
        assert_eq!(pids, vec![10, 20, 30]);
    }
}

//! Correlation of two process snapshots into per-process usage rows.
//!
//! Rows are produced for every process in the second snapshot. A process
//! seen only in the first snapshot has exited and is dropped. A process seen
//! only in the second snapshot has no baseline and is handled according to
//! [`BaselinePolicy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::numeric::{cpu_percent, memory_percent, tick_delta};
use crate::process::sample::{CorrelatedProcessUsage, ProcessSample, SnapshotSet};
use crate::source::HostParameters;

/// What to do with a process that has no sample in the first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselinePolicy {
    /// Omit the process. A single sample says nothing about current usage.
    #[default]
    Suppress,
    /// Report the process with a first-side tick count of zero. This
    /// attributes its whole lifetime CPU time to the sampling window.
    ZeroBaseline,
}

impl BaselinePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselinePolicy::Suppress => "suppress",
            BaselinePolicy::ZeroBaseline => "zero_baseline",
        }
    }
}

impl fmt::Display for BaselinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaselinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "suppress" => Ok(BaselinePolicy::Suppress),
            "zero_baseline" | "zero-baseline" | "zero" => Ok(BaselinePolicy::ZeroBaseline),
            other => Err(format!(
                "Invalid baseline policy '{}', expected 'suppress' or 'zero_baseline'",
                other
            )),
        }
    }
}

/// Correlates `set.first` and `set.second` into usage rows ordered by pid.
///
/// `now_epoch_seconds` is the wall clock used for `running_since_seconds`.
pub fn correlate(
    set: &SnapshotSet,
    host: &HostParameters,
    policy: BaselinePolicy,
    now_epoch_seconds: u64,
) -> Vec<CorrelatedProcessUsage> {
    // None: the system counter went backwards, every cpu_percent is unknown.
    let system_delta = tick_delta(set.second.system_ticks, set.first.system_ticks);
    if system_delta.is_none() {
        trace!(
            first = set.first.system_ticks,
            second = set.second.system_ticks,
            "System tick counter regressed"
        );
    }

    let mut rows = Vec::with_capacity(set.second.len());

    for current in set.second.samples_by_pid() {
        let baseline_ticks = match set.first.get(current.pid) {
            Some(previous) if previous.same_process(current) => previous.cpu_ticks,
            _ => match policy {
                BaselinePolicy::Suppress => {
                    trace!(pid = current.pid, "No baseline sample, suppressing");
                    continue;
                }
                BaselinePolicy::ZeroBaseline => 0,
            },
        };

        rows.push(usage_row(
            current,
            baseline_ticks,
            system_delta,
            host,
            now_epoch_seconds,
        ));
    }

    rows
}

fn usage_row(
    current: &ProcessSample,
    baseline_ticks: u64,
    system_delta: Option<u64>,
    host: &HostParameters,
    now_epoch_seconds: u64,
) -> CorrelatedProcessUsage {
    let cpu = match (system_delta, tick_delta(current.cpu_ticks, baseline_ticks)) {
        (Some(sys), Some(proc_delta)) => Some(cpu_percent(proc_delta, sys, host.logical_cores)),
        _ => None,
    };

    let resident_bytes = current.resident_memory.saturating_mul(host.page_size_bytes);
    let memory = if host.memory_known() {
        memory_percent(resident_bytes, host.physical_memory_bytes)
    } else {
        None
    };

    CorrelatedProcessUsage {
        pid: current.pid,
        name: current.name.clone(),
        cpu_percent: cpu,
        memory_percent: memory,
        resident_bytes,
        running_since_seconds: now_epoch_seconds.saturating_sub(current.started_at_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::sample::Snapshot;

    fn host() -> HostParameters {
        HostParameters {
            logical_cores: 1,
            physical_memory_bytes: 1024 * 4096,
            page_size_bytes: 4096,
        }
    }

    #[test]
    fn test_baseline_policy_parse() {
        assert_eq!("suppress".parse::<BaselinePolicy>(), Ok(BaselinePolicy::Suppress));
        assert_eq!("zero_baseline".parse::<BaselinePolicy>(), Ok(BaselinePolicy::ZeroBaseline));
        assert_eq!("zero".parse::<BaselinePolicy>(), Ok(BaselinePolicy::ZeroBaseline));
        assert!("skip".parse::<BaselinePolicy>().is_err());
    }

    #[test]
    fn test_running_since_saturates() {
        let set = SnapshotSet {
            first: Snapshot::new(0, vec![ProcessSample::new(1, "init", 0, 0, 500)]),
            second: Snapshot::new(100, vec![ProcessSample::new(1, "init", 0, 0, 500)]),
        };

        let rows = correlate(&set, &host(), BaselinePolicy::Suppress, 800);
        assert_eq!(rows[0].running_since_seconds, 300);

        // Clock behind start time
        let rows = correlate(&set, &host(), BaselinePolicy::Suppress, 100);
        assert_eq!(rows[0].running_since_seconds, 0);
    }

    #[test]
    fn test_resident_bytes_uses_page_size() {
        let set = SnapshotSet {
            first: Snapshot::new(0, vec![ProcessSample::new(1, "a", 0, 256, 0)]),
            second: Snapshot::new(100, vec![ProcessSample::new(1, "a", 0, 256, 0)]),
        };
        let rows = correlate(&set, &host(), BaselinePolicy::Suppress, 0);
        assert_eq!(rows[0].resident_bytes, 256 * 4096);
        assert_eq!(rows[0].memory_percent, Some(25.0));
    }

    #[test]
    fn test_pid_reuse_is_treated_as_new_process() {
        let set = SnapshotSet {
            first: Snapshot::new(1000, vec![ProcessSample::new(9, "old", 5000, 0, 10)]),
            second: Snapshot::new(2000, vec![ProcessSample::new(9, "new", 50, 0, 20)]),
        };

        let rows = correlate(&set, &host(), BaselinePolicy::Suppress, 30);
        assert!(rows.is_empty());

        let rows = correlate(&set, &host(), BaselinePolicy::ZeroBaseline, 30);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "new");
        assert_eq!(rows[0].cpu_percent, Some(5.0));
    }
}

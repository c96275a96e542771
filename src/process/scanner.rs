//! Process scanning utilities for discovering process entries in /proc.
//!
//! This module provides functions to scan the /proc filesystem for process
//! directories and to count processes by scheduler state.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::process::stat::read_proc_stat;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Scans a /proc root for process entries with numeric PIDs.
///
/// Returns an error only when the root itself cannot be listed.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> Result<Vec<ProcEntry>, std::io::Error> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        out.push(ProcEntry { pid, proc_path: p });
        if let Some(maxp) = max {
            if out.len() >= maxp {
                break;
            }
        }
    }
    Ok(out)
}

/// Process counts by scheduler state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStateCounts {
    pub total_processes: u64,
    pub running_processes: u64,
    /// Interruptible (`S`) and uninterruptible (`D`) sleep.
    pub sleeping_processes: u64,
    pub stopped_processes: u64,
    pub zombie_processes: u64,
    pub total_threads: u64,
}

/// Counts processes by state from `<root>/<pid>/stat`.
///
/// Every numeric directory counts toward the total, even if its stat file
/// has vanished by the time it is read.
pub fn count_process_states(root: &Path) -> Result<ProcessStateCounts, std::io::Error> {
    let mut counts = ProcessStateCounts::default();

    for entry in collect_proc_entries(root, None)? {
        counts.total_processes += 1;

        let stat = match read_proc_stat(&entry.proc_path) {
            Ok(s) => s,
            Err(e) => {
                trace!("Skipping state of pid {}: {}", entry.pid, e);
                continue;
            }
        };

        match stat.state {
            'R' => counts.running_processes += 1,
            'S' | 'D' => counts.sleeping_processes += 1,
            'T' => counts.stopped_processes += 1,
            'Z' => counts.zombie_processes += 1,
            other => trace!("Unhandled process state '{}' for pid {}", other, entry.pid),
        }
        counts.total_threads += stat.num_threads;
    }

    Ok(counts)
}

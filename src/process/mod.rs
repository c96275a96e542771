//! Process-related modules for sampling, correlation and filtering.
//!
//! This module provides:
//! - `sample`: Process samples and two-generation snapshot sets
//! - `correlator`: Delta computation between two snapshots
//! - `stat`: Parsing of /proc/<pid>/stat and clock constants
//! - `scanner`: Process discovery and state counting
//! - `filter`: Row filtering by pid or name

pub mod correlator;
pub mod filter;
pub mod sample;
pub mod scanner;
pub mod stat;

// Re-export commonly used types
pub use correlator::{correlate, BaselinePolicy};
pub use filter::{apply_filters, NameFilter, ProcessFilter};
pub use sample::{
    bounded_name, CorrelatedProcessUsage, ProcessSample, Snapshot, SnapshotSet,
    MAX_PROCESS_NAME_LEN,
};
pub use scanner::{collect_proc_entries, count_process_states, ProcEntry, ProcessStateCounts};
pub use stat::{parse_stat_content, read_proc_stat, ProcStat, CLK_TCK, ONLINE_CPUS, PAGE_SIZE};

//! System-wide readers for the /proc filesystem.
//!
//! This module provides functions to read load average, memory information,
//! aggregate CPU ticks, per-mode CPU usage between two readings and boot time. Every reader takes the /proc root so
//! it can be pointed at a fixture tree in tests.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::numeric::{round2, tick_delta};

/// System load averages for 1, 5, and 15 minute intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

/// Memory information from /proc/meminfo, all values in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub buffers_bytes: u64,
    pub cached_bytes: u64,
    pub swap_cached_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_free_bytes: u64,
}

/// Aggregate CPU tick counters from the first `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields).
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }
}

/// Share of CPU time spent in each scheduling mode between two readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CpuUsage {
    pub user_percent: f64,
    pub nice_percent: f64,
    pub system_percent: f64,
    pub idle_percent: f64,
    pub iowait_percent: f64,
    pub irq_percent: f64,
    pub softirq_percent: f64,
    pub steal_percent: f64,
}

/// Per-mode usage from two readings of the aggregate `cpu` line.
///
/// Each mode's delta is divided by the sum of all deltas. A zero total
/// yields all zeros. Returns `None` if any counter went backwards.
pub fn cpu_usage_between(first: &CpuStat, second: &CpuStat) -> Option<CpuUsage> {
    let user = tick_delta(second.user, first.user)?;
    let nice = tick_delta(second.nice, first.nice)?;
    let system = tick_delta(second.system, first.system)?;
    let idle = tick_delta(second.idle, first.idle)?;
    let iowait = tick_delta(second.iowait, first.iowait)?;
    let irq = tick_delta(second.irq, first.irq)?;
    let softirq = tick_delta(second.softirq, first.softirq)?;
    let steal = tick_delta(second.steal, first.steal)?;

    let total = user + nice + system + idle + iowait + irq + softirq + steal;
    if total == 0 {
        return Some(CpuUsage::default());
    }
    let pct = |delta: u64| round2(delta as f64 * 100.0 / total as f64);

    Some(CpuUsage {
        user_percent: pct(user),
        nice_percent: pct(nice),
        system_percent: pct(system),
        idle_percent: pct(idle),
        iowait_percent: pct(iowait),
        irq_percent: pct(irq),
        softirq_percent: pct(softirq),
        steal_percent: pct(steal),
    })
}

/// Parses the first line of /proc/loadavg.
///
/// Format: "0.00 0.01 0.05 1/234 5678"
pub fn parse_load_average(content: &str) -> Result<LoadAverage, String> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(format!(
            "Invalid /proc/loadavg format: expected at least 3 fields, got {}",
            parts.len()
        ));
    }

    let one_min = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 1min load average: {}", e))?;
    let five_min = parts[1]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 5min load average: {}", e))?;
    let fifteen_min = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 15min load average: {}", e))?;

    Ok(LoadAverage {
        one_min,
        five_min,
        fifteen_min,
    })
}

/// Reads load average from `<root>/loadavg`.
pub fn read_load_average(root: &Path) -> Result<LoadAverage, String> {
    let path = root.join("loadavg");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_load_average(&content)
}

/// Parses kilobyte values from meminfo lines ("   1234 kB").
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Parses /proc/meminfo content. Only `MemTotal` is mandatory.
pub fn parse_meminfo(content: &str) -> Result<MemoryInfo, String> {
    let mut info = MemoryInfo::default();
    let mut have_total = false;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(kb) = parse_kb_value(value) else {
            continue;
        };
        let bytes = kb.saturating_mul(1024);
        match key.trim() {
            "MemTotal" => {
                info.total_bytes = bytes;
                have_total = true;
            }
            "MemFree" => info.free_bytes = bytes,
            "MemAvailable" => info.available_bytes = bytes,
            "Buffers" => info.buffers_bytes = bytes,
            "Cached" => info.cached_bytes = bytes,
            "SwapCached" => info.swap_cached_bytes = bytes,
            "SwapTotal" => info.swap_total_bytes = bytes,
            "SwapFree" => info.swap_free_bytes = bytes,
            _ => {}
        }
    }

    if !have_total {
        return Err("Failed to parse MemTotal from /proc/meminfo".to_string());
    }

    info.used_bytes = info.total_bytes.saturating_sub(info.free_bytes);
    info.swap_used_bytes = info.swap_total_bytes.saturating_sub(info.swap_free_bytes);
    Ok(info)
}

/// Reads memory information from `<root>/meminfo`.
pub fn read_memory_info(root: &Path) -> Result<MemoryInfo, String> {
    let path = root.join("meminfo");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_meminfo(&content)
}

/// Parses the aggregate `cpu` line of /proc/stat (not the per-core `cpuN` lines).
pub fn parse_cpu_total(content: &str) -> Result<CpuStat, String> {
    let line = content
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| "No aggregate cpu line found in /proc/stat".to_string())?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return Err(format!(
            "Invalid cpu line in /proc/stat: expected at least 7 counters, got {}",
            parts.len() - 1
        ));
    }

    let field = |idx: usize| -> Result<u64, String> {
        parts[idx]
            .parse::<u64>()
            .map_err(|e| format!("Failed to parse cpu counter {}: {}", idx, e))
    };

    Ok(CpuStat {
        user: field(1)?,
        nice: field(2)?,
        system: field(3)?,
        idle: field(4)?,
        iowait: field(5)?,
        irq: field(6)?,
        softirq: field(7)?,
        // Kernels before 2.6.11 have no steal column
        steal: if parts.len() > 8 { field(8)? } else { 0 },
    })
}

/// Reads aggregate CPU ticks from `<root>/stat`.
pub fn read_cpu_total(root: &Path) -> Result<CpuStat, String> {
    let path = root.join("stat");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_cpu_total(&content)
}

/// Reads system boot time (seconds since epoch) from the `btime` line of `<root>/stat`.
pub fn read_boot_time(root: &Path) -> Result<u64, String> {
    let path = root.join("stat");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    content
        .lines()
        .find_map(|line| line.strip_prefix("btime "))
        .ok_or_else(|| format!("No btime line found in {}", path.display()))?
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("Failed to parse btime: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "cpu  4705 356 584 3699176 23 0 27 11 0 0\n\
                             cpu0 1393 280 213 924392 6 0 15 3 0 0\n\
                             intr 114930548 113199788 3 0 5 263 0 4 [...]\n\
                             ctxt 1990473\n\
                             btime 1062191376\n\
                             processes 2915\n";

    #[test]
    fn test_parse_load_average() {
        let load = parse_load_average("0.52 0.58 0.59 2/1190 12345").expect("valid loadavg");
        assert!((load.one_min - 0.52).abs() < 0.001);
        assert!((load.five_min - 0.58).abs() < 0.001);
        assert!((load.fifteen_min - 0.59).abs() < 0.001);
    }

    #[test]
    fn test_parse_load_average_invalid() {
        assert!(parse_load_average("0.52 0.58").is_err());
        assert!(parse_load_average("abc def ghi 1/2 3").is_err());
    }

    #[test]
    fn test_parse_kb_value() {
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("abc"), None);
        assert_eq!(parse_kb_value("-1 kB"), None);
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16384 kB\n\
                       MemFree:         4096 kB\n\
                       MemAvailable:    8192 kB\n\
                       Buffers:          512 kB\n\
                       Cached:          2048 kB\n\
                       SwapCached:        16 kB\n\
                       SwapTotal:       1024 kB\n\
                       SwapFree:         256 kB\n";
        let info = parse_meminfo(content).expect("valid meminfo");
        assert_eq!(info.total_bytes, 16384 * 1024);
        assert_eq!(info.free_bytes, 4096 * 1024);
        assert_eq!(info.used_bytes, (16384 - 4096) * 1024);
        assert_eq!(info.available_bytes, 8192 * 1024);
        assert_eq!(info.buffers_bytes, 512 * 1024);
        assert_eq!(info.cached_bytes, 2048 * 1024);
        assert_eq!(info.swap_cached_bytes, 16 * 1024);
        assert_eq!(info.swap_used_bytes, (1024 - 256) * 1024);
    }

    #[test]
    fn test_parse_meminfo_missing_total() {
        assert!(parse_meminfo("MemFree: 10 kB\n").is_err());
    }

    #[test]
    fn test_parse_cpu_total() {
        let stat = parse_cpu_total(PROC_STAT).expect("valid stat");
        assert_eq!(stat.user, 4705);
        assert_eq!(stat.steal, 11);
        assert_eq!(
            stat.total(),
            4705 + 356 + 584 + 3699176 + 23 + 0 + 27 + 11
        );
    }

    #[test]
    fn test_parse_cpu_total_without_steal() {
        let stat = parse_cpu_total("cpu 1 2 3 4 5 6 7\n").expect("valid stat");
        assert_eq!(stat.steal, 0);
        assert_eq!(stat.total(), 28);
    }

    #[test]
    fn test_parse_cpu_total_ignores_per_core_lines() {
        assert!(parse_cpu_total("cpu0 1 2 3 4 5 6 7\n").is_err());
    }

    #[test]
    fn test_cpu_usage_between() {
        let first = parse_cpu_total("cpu  100 0 50 800 10 0 0 0\n").unwrap();
        let second = parse_cpu_total("cpu  130 10 60 890 10 0 0 0\n").unwrap();

        let usage = cpu_usage_between(&first, &second).expect("counters advanced");
        assert_eq!(usage.user_percent, 21.43);
        assert_eq!(usage.nice_percent, 7.14);
        assert_eq!(usage.system_percent, 7.14);
        assert_eq!(usage.idle_percent, 64.29);
        assert_eq!(usage.iowait_percent, 0.0);
    }

    #[test]
    fn test_cpu_usage_between_idle_window() {
        let stat = parse_cpu_total(PROC_STAT).unwrap();
        assert_eq!(cpu_usage_between(&stat, &stat), Some(CpuUsage::default()));
    }

    #[test]
    fn test_cpu_usage_between_regression() {
        let first = parse_cpu_total("cpu  100 0 50 800 10 0 0 0\n").unwrap();
        let second = parse_cpu_total("cpu  90 0 60 900 10 0 0 0\n").unwrap();
        assert_eq!(cpu_usage_between(&first, &second), None);
    }

    #[test]
    fn test_read_boot_time() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("stat"), PROC_STAT).unwrap();
        assert_eq!(read_boot_time(dir.path()), Ok(1062191376));
    }
}

//! Block device I/O statistics from `<proc>/diskstats`.

use serde::Serialize;
use std::fs;
use std::path::Path;

/// Cumulative I/O counters for one block device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IoStats {
    pub major_no: u64,
    pub minor_no: u64,
    pub device_name: String,
    pub read_completed: u64,
    pub read_merged: u64,
    pub sector_read: u64,
    pub time_spent_reading_ms: u64,
    pub write_completed: u64,
    pub write_merged: u64,
    pub sector_written: u64,
    pub time_spent_writing_ms: u64,
    pub io_in_progress: u64,
    pub time_spent_io_ms: u64,
    pub weighted_time_spent_io_ms: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name read_ios read_merges read_sectors read_ticks
/// write_ios write_merges write_sectors write_ticks ios_in_progress
/// time_in_queue weighted_time_in_queue, followed on newer kernels by
/// discard and flush columns, which are ignored.
pub fn parse_diskstats(content: &str) -> Vec<IoStats> {
    let mut stats = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue;
        }
        let field = |idx: usize| parts[idx].parse::<u64>().unwrap_or(0);

        stats.push(IoStats {
            major_no: field(0),
            minor_no: field(1),
            device_name: parts[2].to_string(),
            read_completed: field(3),
            read_merged: field(4),
            sector_read: field(5),
            time_spent_reading_ms: field(6),
            write_completed: field(7),
            write_merged: field(8),
            sector_written: field(9),
            time_spent_writing_ms: field(10),
            io_in_progress: field(11),
            time_spent_io_ms: field(12),
            weighted_time_spent_io_ms: field(13),
        });
    }

    stats
}

/// Reads block device statistics from `<proc_root>/diskstats`.
pub fn read_io_stats(proc_root: &Path) -> Result<Vec<IoStats>, String> {
    let path = proc_root.join("diskstats");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(parse_diskstats(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "\
   7       0 loop0 57 0 2160 21 0 0 0 0 0 44 21 0 0 0 0
   8       0 sda 226484 54374 14580106 84216 320593 374457 20396464 502893 0 406284 615290 0 0 0 0 12345 28180
   8       1 sda1 226000 54000 14570000 84000 320000 374000 20390000 502000 0 406000 615000
 259       0 nvme0n1 1 2
";

    #[test]
    fn test_parse_diskstats() {
        let stats = parse_diskstats(DISKSTATS);
        let names: Vec<&str> = stats.iter().map(|s| s.device_name.as_str()).collect();
        assert_eq!(names, vec!["loop0", "sda", "sda1"]);

        let sda = &stats[1];
        assert_eq!((sda.major_no, sda.minor_no), (8, 0));
        assert_eq!(sda.read_completed, 226484);
        assert_eq!(sda.sector_read, 14580106);
        assert_eq!(sda.write_completed, 320593);
        assert_eq!(sda.sector_written, 20396464);
        assert_eq!(sda.time_spent_io_ms, 406284);
        assert_eq!(sda.weighted_time_spent_io_ms, 615290);
    }

    #[test]
    fn test_read_io_stats() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(read_io_stats(dir.path()).is_err());

        fs::write(dir.path().join("diskstats"), DISKSTATS).unwrap();
        assert_eq!(read_io_stats(dir.path()).unwrap().len(), 3);
    }
}

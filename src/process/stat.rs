//! Parsing of `/proc/<pid>/stat` and kernel clock constants.
//!
//! The comm field is enclosed in parentheses and may itself contain spaces
//! or parentheses, so all numeric fields are located relative to the last
//! closing parenthesis.

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as f64;
            }
        }
    }
    // Fallback to common default for error cases or non-Unix platforms
    100.0
}

fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    0
}

fn get_online_cpus() -> u32 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_NPROCESSORS_ONLN
        unsafe {
            let n = libc::sysconf(libc::_SC_NPROCESSORS_ONLN);
            if n > 0 {
                return n as u32;
            }
        }
    }
    1
}

/// System clock ticks per second (for start time conversion).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Memory page size in bytes, 0 if unknown.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Number of online logical processors.
pub static ONLINE_CPUS: Lazy<u32> = Lazy::new(get_online_cpus);

/// Fields of `/proc/<pid>/stat` used by the sampler and process counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    /// User-mode ticks (field 14).
    pub utime: u64,
    /// Kernel-mode ticks (field 15).
    pub stime: u64,
    /// Thread count (field 20).
    pub num_threads: u64,
    /// Start time in ticks since boot (field 22).
    pub starttime: u64,
    /// Resident set size in pages (field 24).
    pub rss_pages: u64,
}

impl ProcStat {
    /// Total CPU ticks consumed (user + system).
    pub fn cpu_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Parses the content of a `/proc/<pid>/stat` file.
pub fn parse_stat_content(content: &str) -> Result<ProcStat, std::io::Error> {
    let open = content
        .find('(')
        .ok_or_else(|| std::io::Error::other("Invalid stat format: missing '('"))?;
    let close = content
        .rfind(')')
        .ok_or_else(|| std::io::Error::other("Invalid stat format: missing ')'"))?;
    if close < open {
        return Err(std::io::Error::other("Invalid stat format: unbalanced comm"));
    }

    let pid: u32 = content[..open]
        .trim()
        .parse()
        .map_err(|_| std::io::Error::other("Failed to parse pid field"))?;
    let comm = content[open + 1..close].to_string();

    // rest[0] is field 3 (state)
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() <= 21 {
        return Err(std::io::Error::other("Invalid stat format"));
    }

    let state = rest[0].chars().next().unwrap_or('?');
    let field = |idx: usize, name: &str| -> Result<u64, std::io::Error> {
        rest[idx]
            .parse::<u64>()
            .map_err(|_| std::io::Error::other(format!("Failed to parse {} field", name)))
    };

    Ok(ProcStat {
        pid,
        comm,
        state,
        utime: field(11, "utime")?,
        stime: field(12, "stime")?,
        num_threads: field(17, "num_threads")?,
        starttime: field(19, "starttime")?,
        // rss is signed in the kernel; clamp bogus negatives to 0
        rss_pages: rest[21].parse::<i64>().map(|v| v.max(0) as u64).unwrap_or(0),
    })
}

/// Reads and parses `<proc_path>/stat`.
pub fn read_proc_stat(proc_path: &Path) -> Result<ProcStat, std::io::Error> {
    let content = fs::read_to_string(proc_path.join("stat"))?;
    parse_stat_content(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STAT_LINE: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 3 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    // -------------------------------------------------------------------------
    // Tests for parse_stat_content
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_stat_content() {
        let stat = parse_stat_content(STAT_LINE).expect("valid stat line");
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "test_process");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.utime, 1000);
        assert_eq!(stat.stime, 500);
        assert_eq!(stat.cpu_ticks(), 1500);
        assert_eq!(stat.num_threads, 3);
        assert_eq!(stat.starttime, 12345);
        assert_eq!(stat.rss_pages, 1234);
    }

    #[test]
    fn test_parse_stat_comm_with_spaces_and_parens() {
        let line = STAT_LINE.replace("(test_process)", "(Web Content (x))");
        let stat = parse_stat_content(&line).expect("valid stat line");
        assert_eq!(stat.comm, "Web Content (x)");
        assert_eq!(stat.utime, 1000);
        assert_eq!(stat.rss_pages, 1234);
    }

    #[test]
    fn test_parse_stat_too_short() {
        assert!(parse_stat_content("1234 (test) S 1 2 3").is_err());
        assert!(parse_stat_content("").is_err());
        assert!(parse_stat_content("1234 test S 1 2 3").is_err());
    }

    #[test]
    fn test_parse_stat_non_numeric_ticks() {
        let line = STAT_LINE.replace(" 1000 500 ", " abc 500 ");
        assert!(parse_stat_content(&line).is_err());
    }

    #[test]
    fn test_read_proc_stat_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(read_proc_stat(dir.path()).is_err());
    }

    #[test]
    fn test_read_proc_stat_from_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("stat"), STAT_LINE).expect("Failed to write stat file");
        let stat = read_proc_stat(dir.path()).expect("stat should parse");
        assert_eq!(stat.cpu_ticks(), 1500);
    }

    #[test]
    fn test_clock_constants_sane() {
        assert!(*CLK_TCK > 0.0);
        assert!(*ONLINE_CPUS >= 1);
    }
}

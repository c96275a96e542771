//! Operating system identification and counters.

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::process::count_process_states;

/// Default location of the distribution release file.
pub const DEFAULT_OS_RELEASE: &str = "/etc/os-release";

/// Host and kernel identification plus a few system-wide counts.
///
/// Every field is `None` when its source could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OsInfo {
    /// `PRETTY_NAME` from os-release, e.g. "Debian GNU/Linux 12 (bookworm)".
    pub name: Option<String>,
    /// Kernel name and release, e.g. "Linux 6.1.0-18-amd64".
    pub version: Option<String>,
    pub host_name: Option<String>,
    pub domain_name: Option<String>,
    pub architecture: Option<String>,
    /// Allocated file handles.
    pub handle_count: Option<u64>,
    pub process_count: Option<u64>,
    pub thread_count: Option<u64>,
    pub up_since_seconds: Option<u64>,
}

/// Extracts `PRETTY_NAME` from os-release content, without quotes.
pub fn parse_os_release(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|v| !v.is_empty())
}

/// First field of `/proc/sys/fs/file-nr`: allocated file handles.
pub fn parse_file_nr(content: &str) -> Option<u64> {
    content.split_whitespace().next()?.parse().ok()
}

/// Whole seconds since boot from `/proc/uptime`.
pub fn parse_uptime(content: &str) -> Option<u64> {
    let secs: f64 = content.split_whitespace().next()?.parse().ok()?;
    (secs >= 0.0).then_some(secs as u64)
}

fn read_with<T>(path: &Path, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content),
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// Kernel identification from `uname`: (version, host name, domain name, architecture).
#[cfg(unix)]
fn kernel_identity() -> (Option<String>, Option<String>, Option<String>, Option<String>) {
    let uts = match nix::sys::utsname::uname() {
        Ok(uts) => uts,
        Err(e) => {
            debug!("uname failed: {}", e);
            return (None, None, None, None);
        }
    };

    let text = |s: &std::ffi::OsStr| {
        let s = s.to_string_lossy().into_owned();
        // Linux reports an unset domain as "(none)"
        (!s.is_empty() && s != "(none)").then_some(s)
    };

    let version = Some(format!(
        "{} {}",
        uts.sysname().to_string_lossy(),
        uts.release().to_string_lossy()
    ));

    #[cfg(any(target_os = "linux", target_os = "android"))]
    let domain_name = text(uts.domainname());
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    let domain_name = None;

    (version, text(uts.nodename()), domain_name, text(uts.machine()))
}

#[cfg(not(unix))]
fn kernel_identity() -> (Option<String>, Option<String>, Option<String>, Option<String>) {
    (None, None, None, None)
}

/// Collects OS information from `uname`, `os_release` and `<proc_root>`.
pub fn read_os_info(proc_root: &Path, os_release: &Path) -> OsInfo {
    let (version, host_name, domain_name, architecture) = kernel_identity();

    let (process_count, thread_count) = match count_process_states(proc_root) {
        Ok(counts) => (Some(counts.total_processes), Some(counts.total_threads)),
        Err(e) => {
            debug!("Process counts unavailable: {}", e);
            (None, None)
        }
    };

    OsInfo {
        name: read_with(os_release, parse_os_release),
        version,
        host_name,
        domain_name,
        architecture,
        handle_count: read_with(&proc_root.join("sys/fs/file-nr"), parse_file_nr),
        process_count,
        thread_count,
        up_since_seconds: read_with(&proc_root.join("uptime"), parse_uptime),
    }
}

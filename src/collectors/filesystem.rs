//! Mounted filesystem usage.
//!
//! Mount points come from `<proc>/mounts`; space and inode figures from
//! `statvfs`. Pseudo filesystems and system mount points are skipped, as are
//! filesystems reporting zero total space.

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Filesystem types that never hold user data.
const IGNORED_FS_TYPES: &[&str] = &[
    "autofs",
    "binfmt_misc",
    "bpf",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "fusectl",
    "hugetlbfs",
    "iso9660",
    "mqueue",
    "nsfs",
    "overlay",
    "proc",
    "procfs",
    "pstore",
    "rpc_pipefs",
    "securityfs",
    "selinuxfs",
    "squashfs",
    "sysfs",
    "tracefs",
];

/// Top-level directories whose mounts are skipped along with everything below them.
const IGNORED_MOUNT_ROOTS: &[&str] = &["dev", "proc", "sys", "run", "snap"];

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Space and inode usage of one mounted filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiskInfo {
    pub file_system: String,
    pub file_system_type: String,
    pub mount_point: String,
    pub total_space_bytes: u64,
    pub used_space_bytes: u64,
    /// Space available to unprivileged users.
    pub free_space_bytes: u64,
    pub total_inodes: u64,
    pub used_inodes: u64,
    pub free_inodes: u64,
}

/// Decodes the octal escapes the kernel uses for whitespace in mount paths.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(b) = u8::try_from(value) {
                    out.push(b);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses `/proc/mounts` content.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let device = parts.next()?;
            let mount_point = parts.next()?;
            let fstype = parts.next()?;
            Some(MountEntry {
                device: unescape_mount_field(device),
                mount_point: unescape_mount_field(mount_point),
                fstype: fstype.to_string(),
            })
        })
        .collect()
}

/// Returns true for pseudo filesystems and system mount points.
pub fn should_skip_filesystem(fstype: &str, mount_point: &str) -> bool {
    if IGNORED_FS_TYPES.contains(&fstype) {
        return true;
    }

    let Some(rest) = mount_point.strip_prefix('/') else {
        return false;
    };
    let under = |dir: &str| rest == dir || rest.starts_with(&format!("{dir}/"));
    if IGNORED_MOUNT_ROOTS.iter().any(|dir| under(*dir)) {
        return true;
    }

    // Container layers below the docker root, not the root itself
    rest.strip_prefix("var/lib/docker/")
        .is_some_and(|layer| !layer.is_empty())
}

/// Queries `statvfs` for `entry`. Returns `None` when the call fails or the
/// filesystem reports no space at all.
#[cfg(unix)]
pub fn filesystem_usage(entry: &MountEntry) -> Option<DiskInfo> {
    let stat = match nix::sys::statvfs::statvfs(entry.mount_point.as_str()) {
        Ok(stat) => stat,
        Err(e) => {
            debug!("statvfs failed for {}: {}", entry.mount_point, e);
            return None;
        }
    };

    let block_size = stat.fragment_size() as u64;
    let total_space_bytes = block_size.saturating_mul(stat.blocks() as u64);
    if total_space_bytes == 0 {
        return None;
    }
    let free_blocks = stat.blocks_free() as u64;
    let total_inodes = stat.files() as u64;
    let free_inodes = stat.files_free() as u64;

    Some(DiskInfo {
        file_system: entry.device.clone(),
        file_system_type: entry.fstype.clone(),
        mount_point: entry.mount_point.clone(),
        total_space_bytes,
        used_space_bytes: total_space_bytes.saturating_sub(block_size.saturating_mul(free_blocks)),
        free_space_bytes: block_size.saturating_mul(stat.blocks_available() as u64),
        total_inodes,
        used_inodes: total_inodes.saturating_sub(free_inodes),
        free_inodes,
    })
}

#[cfg(not(unix))]
pub fn filesystem_usage(_entry: &MountEntry) -> Option<DiskInfo> {
    None
}

/// Reads usage for every real filesystem listed in `<proc_root>/mounts`.
pub fn read_disk_info(proc_root: &Path) -> Result<Vec<DiskInfo>, String> {
    let path = proc_root.join("mounts");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    Ok(parse_mounts(&content)
        .iter()
        .filter(|m| !should_skip_filesystem(&m.fstype, &m.mount_point))
        .filter_map(filesystem_usage)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_should_skip_filesystem() {
        assert!(should_skip_filesystem("proc", "/proc"));
        assert!(should_skip_filesystem("sysfs", "/sys"));
        assert!(should_skip_filesystem("overlay", "/"));
        assert!(should_skip_filesystem("tmpfs", "/dev/shm"));
        assert!(should_skip_filesystem("tmpfs", "/run/user/1000"));
        assert!(should_skip_filesystem("ext4", "/var/lib/docker/overlay2"));
        assert!(!should_skip_filesystem("ext4", "/var/lib/docker"));
        assert!(!should_skip_filesystem("ext4", "/"));
        assert!(!should_skip_filesystem("xfs", "/data"));
        assert!(!should_skip_filesystem("ext4", "/devel"));
        assert!(!should_skip_filesystem("tmpfs", "/tmp"));
    }

    #[test]
    fn test_parse_mounts() {
        let mounts = parse_mounts(
            "/dev/sda1 / ext4 rw,relatime 0 0\n\
             /dev/sdb1 /mnt/My\\040Disk vfat rw 0 0\n\
             garbage\n",
        );
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].fstype, "ext4");
        assert_eq!(mounts[1].mount_point, "/mnt/My Disk");
    }

    #[test]
    fn test_filesystem_usage_of_temp_dir() {
        let dir = tempdir().expect("Failed to create temp dir");
        let entry = MountEntry {
            device: "testfs".into(),
            mount_point: dir.path().display().to_string(),
            fstype: "ext4".into(),
        };

        if let Some(info) = filesystem_usage(&entry) {
            assert!(info.used_space_bytes <= info.total_space_bytes);
            assert!(info.used_inodes <= info.total_inodes);
            assert_eq!(info.file_system, "testfs");
        }
    }

    #[test]
    fn test_read_disk_info_skips_pseudo_and_missing() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("mounts"),
            "proc /proc proc rw 0 0\n/dev/sdz9 /does/not/exist ext4 rw 0 0\n",
        )
        .unwrap();

        assert!(read_disk_info(dir.path()).unwrap().is_empty());
    }
}

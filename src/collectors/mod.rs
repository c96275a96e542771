//! Host information readers beyond the process sampler.
//!
//! - `cpuinfo`: Per-processor details
//! - `os`: OS identification and system-wide counts
//! - `netdev`: Network interface counters, speed and IPv4 address
//! - `filesystem`: Mounted filesystem space and inode usage
//! - `diskstats`: Block device I/O counters

pub mod cpuinfo;
pub mod diskstats;
pub mod filesystem;
pub mod netdev;
pub mod os;

pub use cpuinfo::{read_cpu_info, CpuInfo};
pub use diskstats::{read_io_stats, IoStats};
pub use filesystem::{read_disk_info, DiskInfo};
pub use netdev::{read_network_info, NetworkInterface};
pub use os::{read_os_info, OsInfo, DEFAULT_OS_RELEASE};

//! Network interface statistics.
//!
//! Counters come from `<proc>/net/dev`, link speed from
//! `<sys>/class/net/<iface>/speed` and IPv4 addresses from `getifaddrs`.

use ahash::AHashMap as HashMap;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One network interface with its cumulative traffic counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub interface_name: String,
    pub ipv4_address: Option<String>,
    /// `None` when the link is down or the driver reports no speed.
    pub speed_mbps: Option<u64>,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
}

/// Parses `/proc/net/dev` content. Malformed lines are skipped.
pub fn parse_net_dev(content: &str) -> Vec<NetworkInterface> {
    let mut interfaces = Vec::new();

    // Skip the two header lines
    for line in content.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 16 {
            continue;
        }
        let field = |idx: usize| values[idx].parse::<u64>().unwrap_or(0);

        interfaces.push(NetworkInterface {
            interface_name: name.trim().to_string(),
            rx_bytes: field(0),
            rx_packets: field(1),
            rx_errors: field(2),
            rx_dropped: field(3),
            tx_bytes: field(8),
            tx_packets: field(9),
            tx_errors: field(10),
            tx_dropped: field(11),
            ..NetworkInterface::default()
        });
    }

    interfaces
}

/// Link speed in Mbps. Down links report -1, which becomes `None`.
pub fn read_interface_speed(sys_root: &Path, interface: &str) -> Option<u64> {
    let path = sys_root.join("class/net").join(interface).join("speed");
    let content = fs::read_to_string(path).ok()?;
    let speed: i64 = content.trim().parse().ok()?;
    u64::try_from(speed).ok().filter(|s| *s > 0)
}

/// First IPv4 address of every interface that has one.
#[cfg(unix)]
pub fn ipv4_addresses() -> HashMap<String, String> {
    let mut addresses = HashMap::new();

    let ifaddrs = match nix::ifaddrs::getifaddrs() {
        Ok(ifaddrs) => ifaddrs,
        Err(e) => {
            debug!("Failed to list interface addresses: {}", e);
            return addresses;
        }
    };

    for ifaddr in ifaddrs {
        let Some(sin) = ifaddr.address.as_ref().and_then(|a| a.as_sockaddr_in()) else {
            continue;
        };
        let ip = std::net::Ipv4Addr::from(sin.ip());
        addresses
            .entry(ifaddr.interface_name)
            .or_insert_with(|| ip.to_string());
    }

    addresses
}

#[cfg(not(unix))]
pub fn ipv4_addresses() -> HashMap<String, String> {
    HashMap::new()
}

/// Reads all interfaces from `<proc_root>/net/dev`, enriched with speed and IPv4 address.
pub fn read_network_info(proc_root: &Path, sys_root: &Path) -> Result<Vec<NetworkInterface>, String> {
    let path = proc_root.join("net/dev");
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let mut interfaces = parse_net_dev(&content);
    let mut addresses = ipv4_addresses();
    for iface in &mut interfaces {
        iface.speed_mbps = read_interface_speed(sys_root, &iface.interface_name);
        iface.ipv4_address = addresses.remove(&iface.interface_name);
    }

    Ok(interfaces)
}

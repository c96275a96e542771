//! Numeric conversions used by the correlator.
//!
//! Percentages are reported with two decimal places using round-half-up,
//! i.e. `floor(v * 100 + 0.5) / 100`.

/// Rounds a non-negative value to two decimal places, half-up.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Returns `curr - prev`, or `None` when the counter went backwards.
pub fn tick_delta(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// CPU utilization of one process over a sampling window.
///
/// `cores * process_delta * 100 / system_delta`. The system total sums all
/// cores, so multiplying by the core count yields "percent of one core",
/// which may exceed 100 for multi-threaded processes.
pub fn cpu_percent(process_delta: u64, system_delta: u64, cores: u32) -> f64 {
    if system_delta == 0 {
        return 0.0;
    }
    let cores = cores.max(1) as f64;
    round2(cores * process_delta as f64 * 100.0 / system_delta as f64)
}

/// Share of physical memory in percent, `None` when the total is unknown.
pub fn memory_percent(resident_bytes: u64, physical_memory_bytes: u64) -> Option<f64> {
    if physical_memory_bytes == 0 {
        return None;
    }
    Some(round2(
        resident_bytes as f64 / physical_memory_bytes as f64 * 100.0,
    ))
}

/// Converts kernel clock ticks to seconds.
pub fn ticks_to_seconds(ticks: u64, ticks_per_second: f64) -> f64 {
    if ticks_per_second <= 0.0 {
        return 0.0;
    }
    ticks as f64 / ticks_per_second
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(12.345), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(10.0), 10.0);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_tick_delta_regression() {
        assert_eq!(tick_delta(1200, 1000), Some(200));
        assert_eq!(tick_delta(1000, 1000), Some(0));
        assert_eq!(tick_delta(999, 1000), None);
    }

    #[test]
    fn test_cpu_percent() {
        assert_eq!(cpu_percent(200, 2000, 1), 10.0);
        assert_eq!(cpu_percent(200, 2000, 4), 40.0);
        // Zero cores is treated as one
        assert_eq!(cpu_percent(200, 2000, 0), 10.0);
        assert_eq!(cpu_percent(200, 0, 8), 0.0);
    }

    #[test]
    fn test_memory_percent() {
        assert_eq!(
            memory_percent(2_147_483_648, 17_179_869_184),
            Some(12.5)
        );
        assert_eq!(memory_percent(1024, 0), None);
    }

    #[test]
    fn test_ticks_to_seconds() {
        assert_eq!(ticks_to_seconds(1500, 100.0), 15.0);
        assert_eq!(ticks_to_seconds(1500, 0.0), 0.0);
    }
}

//! Prometheus telemetry for the sampling service itself.
//!
//! Exposes the duration and outcome of sampling passes plus a few host
//! gauges that are refreshed on every /metrics scrape.

use herakles_sysstats::{LoadAverage, MemoryInfo};
use prometheus::{Counter, Gauge, Opts, Registry};

/// Sampler and host gauges registered with the service registry.
#[derive(Clone)]
pub struct Telemetry {
    pub sample_duration_seconds: Gauge,
    pub samples_total: Counter,
    pub sample_failures_total: Counter,
    pub processes_reported: Gauge,
    pub last_sample_success: Gauge,

    pub load_1: Gauge,
    pub load_5: Gauge,
    pub load_15: Gauge,
    pub memory_total_bytes: Gauge,
    pub memory_available_bytes: Gauge,
}

impl Telemetry {
    /// Creates and registers all metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let sample_duration_seconds = Gauge::new(
            "sysstats_sample_duration_seconds",
            "Wall time of the last process usage sampling pass",
        )?;
        let samples_total = Counter::with_opts(Opts::new(
            "sysstats_samples_total",
            "Process usage sampling passes started",
        ))?;
        let sample_failures_total = Counter::with_opts(Opts::new(
            "sysstats_sample_failures_total",
            "Sampling passes that returned no rows because of an error or cancellation",
        ))?;
        let processes_reported = Gauge::new(
            "sysstats_processes_reported",
            "Rows returned by the last sampling pass",
        )?;
        let last_sample_success = Gauge::new(
            "sysstats_last_sample_success",
            "1 if the last sampling pass completed, 0 otherwise",
        )?;

        let load_1 = Gauge::new("sysstats_load_1", "System load average over 1 minute")?;
        let load_5 = Gauge::new("sysstats_load_5", "System load average over 5 minutes")?;
        let load_15 = Gauge::new("sysstats_load_15", "System load average over 15 minutes")?;
        let memory_total_bytes =
            Gauge::new("sysstats_memory_total_bytes", "Total physical memory")?;
        let memory_available_bytes = Gauge::new(
            "sysstats_memory_available_bytes",
            "Memory available for new workloads",
        )?;

        registry.register(Box::new(sample_duration_seconds.clone()))?;
        registry.register(Box::new(samples_total.clone()))?;
        registry.register(Box::new(sample_failures_total.clone()))?;
        registry.register(Box::new(processes_reported.clone()))?;
        registry.register(Box::new(last_sample_success.clone()))?;
        registry.register(Box::new(load_1.clone()))?;
        registry.register(Box::new(load_5.clone()))?;
        registry.register(Box::new(load_15.clone()))?;
        registry.register(Box::new(memory_total_bytes.clone()))?;
        registry.register(Box::new(memory_available_bytes.clone()))?;

        Ok(Self {
            sample_duration_seconds,
            samples_total,
            sample_failures_total,
            processes_reported,
            last_sample_success,
            load_1,
            load_5,
            load_15,
            memory_total_bytes,
            memory_available_bytes,
        })
    }

    /// Records the outcome of one sampling pass.
    pub fn record_sample(&self, seconds: f64, rows: usize, ok: bool) {
        self.samples_total.inc();
        self.sample_duration_seconds.set(seconds);
        self.processes_reported.set(rows as f64);
        if ok {
            self.last_sample_success.set(1.0);
        } else {
            self.sample_failures_total.inc();
            self.last_sample_success.set(0.0);
        }
    }

    pub fn set_load(&self, load: &LoadAverage) {
        self.load_1.set(load.one_min);
        self.load_5.set(load.five_min);
        self.load_15.set(load.fifteen_min);
    }

    pub fn set_memory(&self, mem: &MemoryInfo) {
        self.memory_total_bytes.set(mem.total_bytes as f64);
        self.memory_available_bytes.set(mem.available_bytes as f64);
    }
}

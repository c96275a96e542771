//! Application state management for the service.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and subcommands.

use herakles_sysstats::platform::{default_sources, fixture_sources, load_fixture};
use herakles_sysstats::{
    CorrelatedProcessUsage, NameFilter, SampleContext, SampleError, Sampler,
};
use prometheus::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::telemetry::Telemetry;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Builds the sampler for the configured platform or test data file.
pub fn build_sampler(config: &Config) -> Result<Sampler, Box<dyn std::error::Error>> {
    let settings = config.sampler_settings()?;

    let sources = match config.test_data_file.as_deref() {
        Some(path) => {
            info!("Replaying recorded snapshots from {}", path.display());
            fixture_sources(load_fixture(path)?)
        }
        None => default_sources(&config.proc_root())?,
    };

    debug!(
        "Sampler ready: {} cores, {} bytes memory, {} byte pages",
        sources.host.logical_cores, sources.host.physical_memory_bytes, sources.host.page_size_bytes
    );
    Ok(Sampler::new(sources, settings))
}

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub telemetry: Telemetry,
    pub config: Arc<Config>,
    pub sampler: Arc<Sampler>,
    /// Root used for load average, memory and process state reads.
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub os_release_path: PathBuf,
    pub cpu_usage_interval: Duration,
    pub name_filter: NameFilter,
    pub sample_timeout: Duration,
    /// Flipped to `true` on shutdown to abort in-flight sampling passes.
    pub shutdown: watch::Receiver<bool>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Builds the state with a fresh telemetry registry.
    pub fn new(
        config: Config,
        sampler: Sampler,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();
        let telemetry = Telemetry::new(&registry)?;

        Ok(Self {
            registry,
            telemetry,
            name_filter: config.name_filter(),
            proc_root: config.proc_root(),
            sys_root: config.sys_root(),
            os_release_path: config.os_release_path(),
            cpu_usage_interval: config.cpu_usage_interval(),
            sample_timeout: config.sample_timeout(),
            config: Arc::new(config),
            sampler: Arc::new(sampler),
            shutdown,
            start_time: Instant::now(),
        })
    }

    pub fn sample_context(&self) -> SampleContext {
        SampleContext::new()
            .with_timeout(self.sample_timeout)
            .with_cancel(self.shutdown.clone())
    }

    /// Runs one sampling pass and records its outcome. Failures yield no rows.
    pub async fn sample(&self) -> Vec<CorrelatedProcessUsage> {
        let start = Instant::now();
        let outcome = self.sampler.sample(&self.sample_context()).await;
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(rows) => {
                self.telemetry.record_sample(elapsed, rows.len(), true);
                rows
            }
            Err(SampleError::Cancelled) => {
                debug!("Sampling pass cancelled after {:.3}s", elapsed);
                self.telemetry.record_sample(elapsed, 0, false);
                Vec::new()
            }
            Err(e) => {
                warn!("Sampling pass failed: {}", e);
                self.telemetry.record_sample(elapsed, 0, false);
                Vec::new()
            }
        }
    }
}

/// State over a fake proc tree with an empty recorded sampler.
#[cfg(test)]
pub(crate) fn test_state(proc_root: &std::path::Path) -> SharedState {
    use herakles_sysstats::platform::{Fixture, RecordedSnapshot};
    use herakles_sysstats::HostParameters;

    let sources = fixture_sources(Fixture {
        host: HostParameters {
            logical_cores: 1,
            physical_memory_bytes: 0,
            page_size_bytes: 0,
        },
        snapshots: vec![RecordedSnapshot {
            system_ticks: 0,
            processes: Vec::new(),
        }],
    });
    let config = Config {
        proc_root: Some(proc_root.to_path_buf()),
        sys_root: Some(proc_root.join("sys")),
        ..Config::default()
    };
    let sampler = Sampler::new(sources, Default::default());
    let (_tx, rx) = watch::channel(false);

    Arc::new(AppState::new(config, sampler, rx).expect("test state"))
}

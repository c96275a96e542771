//! Two-sample process usage measurement.
//!
//! A pass captures system ticks and the process list, waits one interval,
//! captures both again and correlates the two snapshots. The wait is the
//! only suspension point and can be cut short by a deadline or a
//! cancellation signal. Snapshots live only for the duration of the pass.
//!
//! System-wide CPU usage per scheduling mode is measured the same way from
//! two readings of the aggregate `cpu` line.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::error::SampleError;
use crate::process::{correlate, BaselinePolicy, CorrelatedProcessUsage, Snapshot, SnapshotSet};
use crate::source::{HostParameters, PlatformSources};
use crate::system::{cpu_usage_between, read_cpu_total, CpuStat, CpuUsage};

/// Default delay between the two snapshots.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default delay between the two system-wide CPU readings.
pub const DEFAULT_CPU_USAGE_INTERVAL: Duration = Duration::from_millis(150);

/// Per-sampler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    pub interval: Duration,
    pub baseline_policy: BaselinePolicy,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            baseline_policy: BaselinePolicy::default(),
        }
    }
}

/// Caller-supplied bounds for one sampling pass.
#[derive(Debug, Clone, Default)]
pub struct SampleContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl SampleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the pass if it is still waiting `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abandon the pass once `true` is sent on the channel.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleeps for `interval` unless the deadline passes or cancellation fires first.
    async fn wait(&self, interval: Duration) -> Result<(), SampleError> {
        if self.is_cancelled() {
            return Err(SampleError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => loop {
                    let fired = *rx.borrow_and_update();
                    if fired {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        // Sender gone, nobody can cancel any more
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = tokio::time::sleep(interval) => Ok(()),
            _ = deadline => Err(SampleError::Cancelled),
            _ = cancelled => Err(SampleError::Cancelled),
        }
    }
}

/// Captures system ticks, then the process list, off the async executor.
async fn capture(sources: &PlatformSources) -> Result<Snapshot, SampleError> {
    let counters = Arc::clone(&sources.counters);
    let processes = Arc::clone(&sources.processes);

    tokio::task::spawn_blocking(move || -> Result<Snapshot, SampleError> {
        let system_ticks = counters.total_ticks()?;
        let samples = processes.enumerate()?;
        Ok(Snapshot::new(system_ticks, samples))
    })
    .await
    .map_err(|e| SampleError::unavailable("sampler", format!("snapshot task failed: {}", e)))?
}

fn now_epoch_seconds() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Runs one full two-sample pass and returns one row per correlated process.
#[instrument(skip_all, fields(interval_ms = settings.interval.as_millis() as u64))]
pub async fn sample_process_usage(
    sources: &PlatformSources,
    settings: &SamplerSettings,
    ctx: &SampleContext,
) -> Result<Vec<CorrelatedProcessUsage>, SampleError> {
    if settings.interval.is_zero() {
        return Err(SampleError::InvalidInterval(settings.interval));
    }

    let first = capture(sources).await?;
    ctx.wait(settings.interval).await?;
    let second = capture(sources).await?;

    debug!(
        first_processes = first.len(),
        second_processes = second.len(),
        system_delta = second.system_ticks as i128 - first.system_ticks as i128,
        "Captured snapshot pair"
    );

    let set = SnapshotSet { first, second };
    let rows = correlate(
        &set,
        &sources.host,
        settings.baseline_policy,
        now_epoch_seconds(),
    );
    Ok(rows)
}

async fn read_cpu_times(proc_root: &Path) -> Result<CpuStat, SampleError> {
    let root = proc_root.to_path_buf();
    tokio::task::spawn_blocking(move || read_cpu_total(&root))
        .await
        .map_err(|e| SampleError::unavailable("sampler", format!("cpu counter task failed: {}", e)))?
        .map_err(|e| SampleError::unavailable("procfs cpu counters", e))
}

/// Measures system-wide CPU usage per mode over `interval`.
///
/// Reads `<proc_root>/stat` twice with the same cancellable wait used by
/// process passes.
#[instrument(skip(ctx), fields(interval_ms = interval.as_millis() as u64))]
pub async fn sample_cpu_usage(
    proc_root: &Path,
    interval: Duration,
    ctx: &SampleContext,
) -> Result<CpuUsage, SampleError> {
    if interval.is_zero() {
        return Err(SampleError::InvalidInterval(interval));
    }

    let first = read_cpu_times(proc_root).await?;
    ctx.wait(interval).await?;
    let second = read_cpu_times(proc_root).await?;

    cpu_usage_between(&first, &second).ok_or_else(|| {
        SampleError::unavailable("procfs cpu counters", "cpu counters went backwards")
    })
}

/// Process usage sampler bound to one platform.
#[derive(Debug, Clone)]
pub struct Sampler {
    sources: PlatformSources,
    settings: SamplerSettings,
}

impl Sampler {
    pub fn new(sources: PlatformSources, settings: SamplerSettings) -> Self {
        Self { sources, settings }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn host(&self) -> &HostParameters {
        &self.sources.host
    }

    pub async fn sample(
        &self,
        ctx: &SampleContext,
    ) -> Result<Vec<CorrelatedProcessUsage>, SampleError> {
        sample_process_usage(&self.sources, &self.settings, ctx).await
    }

    /// Like [`Sampler::sample`], but any failure yields an empty result.
    pub async fn sample_or_empty(&self, ctx: &SampleContext) -> Vec<CorrelatedProcessUsage> {
        match self.sample(ctx).await {
            Ok(rows) => rows,
            Err(SampleError::Cancelled) => {
                debug!("Process usage sampling cancelled");
                Vec::new()
            }
            Err(e) => {
                warn!("Process usage sampling failed: {}", e);
                Vec::new()
            }
        }
    }
}

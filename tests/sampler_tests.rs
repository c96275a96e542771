//! Sampling passes against scripted sources.

use herakles_sysstats::{
    BaselinePolicy, HostParameters, PlatformSources, ProcessSample, ProcessSnapshotSource,
    SampleContext, SampleError, Sampler, SamplerSettings, SystemCounterSource,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Replays one scripted value per call, failing once the script runs out.
struct Scripted<T> {
    steps: Mutex<VecDeque<Result<T, String>>>,
}

impl<T: Clone> Scripted<T> {
    fn new(steps: Vec<Result<T, String>>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
        }
    }

    fn next(&self, name: &'static str) -> Result<T, SampleError> {
        let mut steps = self.steps.lock().unwrap();
        match steps.pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(reason)) => Err(SampleError::unavailable(name, reason)),
            None => Err(SampleError::unavailable(name, "script exhausted")),
        }
    }
}

struct Counters(Scripted<u64>);

impl SystemCounterSource for Counters {
    fn name(&self) -> &'static str {
        "scripted counters"
    }

    fn total_ticks(&self) -> Result<u64, SampleError> {
        self.0.next("scripted counters")
    }
}

struct Processes(Scripted<Vec<ProcessSample>>);

impl ProcessSnapshotSource for Processes {
    fn name(&self) -> &'static str {
        "scripted processes"
    }

    fn enumerate(&self) -> Result<Vec<ProcessSample>, SampleError> {
        self.0.next("scripted processes")
    }
}

fn sources(
    ticks: Vec<Result<u64, String>>,
    lists: Vec<Result<Vec<ProcessSample>, String>>,
) -> PlatformSources {
    PlatformSources {
        processes: Arc::new(Processes(Scripted::new(lists))),
        counters: Arc::new(Counters(Scripted::new(ticks))),
        host: HostParameters {
            logical_cores: 1,
            physical_memory_bytes: 1024 * 4096,
            page_size_bytes: 4096,
        },
    }
}

fn sample(pid: u32, ticks: u64) -> ProcessSample {
    ProcessSample::new(pid, "worker", ticks, 256, 1_000)
}

fn settings(interval_ms: u64) -> SamplerSettings {
    SamplerSettings {
        interval: Duration::from_millis(interval_ms),
        baseline_policy: BaselinePolicy::Suppress,
    }
}

#[tokio::test]
async fn test_pass_correlates_two_snapshots() {
    let sampler = Sampler::new(
        sources(
            vec![Ok(50_000), Ok(52_000)],
            vec![
                Ok(vec![sample(100, 1_000), sample(101, 10)]),
                Ok(vec![sample(100, 1_200), sample(102, 5)]),
            ],
        ),
        settings(10),
    );

    let rows = sampler.sample(&SampleContext::new()).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pid, 100);
    assert_eq!(rows[0].cpu_percent, Some(10.0));
    assert_eq!(rows[0].memory_percent, Some(25.0));
    assert_eq!(rows[0].resident_bytes, 256 * 4096);
}

#[tokio::test]
async fn test_zero_baseline_policy_reports_new_processes() {
    let sampler = Sampler::new(
        sources(
            vec![Ok(1_000), Ok(2_000)],
            vec![Ok(vec![]), Ok(vec![sample(200, 500)])],
        ),
        SamplerSettings {
            interval: Duration::from_millis(5),
            baseline_policy: BaselinePolicy::ZeroBaseline,
        },
    );

    let rows = sampler.sample(&SampleContext::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cpu_percent, Some(50.0));
}

#[tokio::test]
async fn test_zero_system_delta_reports_zero() {
    let sampler = Sampler::new(
        sources(
            vec![Ok(7_000), Ok(7_000)],
            vec![Ok(vec![sample(1, 10)]), Ok(vec![sample(1, 90)])],
        ),
        settings(5),
    );

    let rows = sampler.sample(&SampleContext::new()).await.unwrap();
    assert_eq!(rows[0].cpu_percent, Some(0.0));
}

#[tokio::test]
async fn test_zero_interval_is_rejected() {
    let sampler = Sampler::new(sources(vec![], vec![]), settings(0));

    let err = sampler.sample(&SampleContext::new()).await.unwrap_err();
    assert!(matches!(err, SampleError::InvalidInterval(d) if d.is_zero()));
}

#[tokio::test]
async fn test_counter_failure_yields_error_and_empty_result() {
    let failing = || sources(vec![Err("permission denied".into())], vec![Ok(vec![sample(1, 1)])]);

    let sampler = Sampler::new(failing(), settings(5));
    let err = sampler.sample(&SampleContext::new()).await.unwrap_err();
    assert!(matches!(
        err,
        SampleError::SourceUnavailable { source_name: "scripted counters", .. }
    ));

    let sampler = Sampler::new(failing(), settings(5));
    assert!(sampler.sample_or_empty(&SampleContext::new()).await.is_empty());
}

#[tokio::test]
async fn test_second_enumeration_failure_yields_empty_result() {
    let sampler = Sampler::new(
        sources(
            vec![Ok(1_000), Ok(2_000)],
            vec![Ok(vec![sample(1, 1)]), Err("directory vanished".into())],
        ),
        settings(5),
    );

    assert!(sampler.sample_or_empty(&SampleContext::new()).await.is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let (tx, rx) = watch::channel(false);
    tx.send_replace(true);

    let sampler = Sampler::new(
        sources(
            vec![Ok(1_000), Ok(2_000)],
            vec![Ok(vec![sample(1, 1)]), Ok(vec![sample(1, 2)])],
        ),
        settings(10),
    );

    let ctx = SampleContext::new().with_cancel(rx);
    assert!(ctx.is_cancelled());
    let err = sampler.sample(&ctx).await.unwrap_err();
    assert!(matches!(err, SampleError::Cancelled));
}

#[tokio::test]
async fn test_cancel_during_wait_aborts_pass() {
    let (tx, rx) = watch::channel(false);
    let sampler = Sampler::new(
        sources(
            vec![Ok(1_000), Ok(2_000)],
            vec![Ok(vec![sample(1, 1)]), Ok(vec![sample(1, 2)])],
        ),
        settings(10_000),
    );

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send_replace(true);
    });

    let start = Instant::now();
    let ctx = SampleContext::new().with_cancel(rx);
    let result = tokio::time::timeout(Duration::from_secs(5), sampler.sample(&ctx))
        .await
        .expect("cancellation should end the pass well before the interval");

    assert!(matches!(result, Err(SampleError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_deadline_shorter_than_interval() {
    let sampler = Sampler::new(
        sources(
            vec![Ok(1_000), Ok(2_000)],
            vec![Ok(vec![sample(1, 1)]), Ok(vec![sample(1, 2)])],
        ),
        settings(10_000),
    );

    let ctx = SampleContext::new().with_timeout(Duration::from_millis(20));
    let result = tokio::time::timeout(Duration::from_secs(5), sampler.sample_or_empty(&ctx))
        .await
        .expect("deadline should end the pass well before the interval");

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_dropped_sender_does_not_cancel() {
    let (tx, rx) = watch::channel(false);
    drop(tx);

    let sampler = Sampler::new(
        sources(
            vec![Ok(1_000), Ok(2_000)],
            vec![Ok(vec![sample(1, 100)]), Ok(vec![sample(1, 150)])],
        ),
        settings(10),
    );

    let rows = sampler
        .sample(&SampleContext::new().with_cancel(rx))
        .await
        .unwrap();
    assert_eq!(rows[0].cpu_percent, Some(5.0));
}

#[tokio::test]
async fn test_concurrent_passes_are_independent() {
    let make = || {
        Sampler::new(
            sources(
                vec![Ok(0), Ok(1_000)],
                vec![Ok(vec![sample(1, 0)]), Ok(vec![sample(1, 250)])],
            ),
            settings(10),
        )
    };
    let (a, b) = (make(), make());

    let ctx = SampleContext::new();
    let (ra, rb) = tokio::join!(a.sample(&ctx), b.sample(&ctx));

    assert_eq!(ra.unwrap()[0].cpu_percent, Some(25.0));
    assert_eq!(rb.unwrap()[0].cpu_percent, Some(25.0));
}

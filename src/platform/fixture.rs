//! Replay of recorded snapshots from a JSON test-data file.
//!
//! Used instead of /proc when a test data file is configured. Each call to
//! `total_ticks` advances to the next recorded snapshot (wrapping around),
//! and the following `enumerate` returns that snapshot's processes. The
//! cursor is shared, so concurrent passes over one fixture interleave.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::SampleError;
use crate::process::{bounded_name, ProcessSample};
use crate::source::{HostParameters, PlatformSources, ProcessSnapshotSource, SystemCounterSource};

/// One recorded snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSnapshot {
    pub system_ticks: u64,
    pub processes: Vec<ProcessSample>,
}

/// Contents of a test data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub host: HostParameters,
    pub snapshots: Vec<RecordedSnapshot>,
}

/// Loads and validates a fixture file.
pub fn load_fixture(path: &Path) -> anyhow::Result<Fixture> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read test data file {}", path.display()))?;
    let mut fixture: Fixture = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse test data file {}", path.display()))?;
    if fixture.snapshots.is_empty() {
        bail!("Test data file {} contains no snapshots", path.display());
    }
    for snapshot in &mut fixture.snapshots {
        normalize_samples(&mut snapshot.processes);
    }
    Ok(fixture)
}

/// Applies the same bounds as samples built by a live source.
fn normalize_samples(samples: &mut [ProcessSample]) {
    for sample in samples.iter_mut() {
        sample.name = bounded_name(&sample.name);
    }
}

struct FixtureState {
    snapshots: Vec<RecordedSnapshot>,
    next: usize,
    current: Option<usize>,
}

/// Process and counter source backed by a [`Fixture`].
#[derive(Clone)]
pub struct FixtureSource {
    state: Arc<Mutex<FixtureState>>,
}

impl FixtureSource {
    pub fn new(snapshots: Vec<RecordedSnapshot>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FixtureState {
                snapshots,
                next: 0,
                current: None,
            })),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FixtureState>, SampleError> {
        self.state
            .lock()
            .map_err(|e| SampleError::unavailable("fixture", format!("Failed to acquire lock: {}", e)))
    }
}

impl SystemCounterSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture counters"
    }

    fn total_ticks(&self) -> Result<u64, SampleError> {
        let mut state = self.lock()?;
        if state.snapshots.is_empty() {
            return Err(SampleError::unavailable(
                SystemCounterSource::name(self),
                "no recorded snapshots",
            ));
        }
        let idx = state.next % state.snapshots.len();
        state.next = idx + 1;
        state.current = Some(idx);
        Ok(state.snapshots[idx].system_ticks)
    }
}

impl ProcessSnapshotSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture process list"
    }

    fn enumerate(&self) -> Result<Vec<ProcessSample>, SampleError> {
        let state = self.lock()?;
        let idx = state.current.unwrap_or(0);
        state
            .snapshots
            .get(idx)
            .map(|s| s.processes.clone())
            .ok_or_else(|| {
                SampleError::unavailable(ProcessSnapshotSource::name(self), "no recorded snapshots")
            })
    }
}

/// Builds platform sources that replay `fixture`.
pub fn fixture_sources(fixture: Fixture) -> PlatformSources {
    let source = FixtureSource::new(fixture.snapshots);
    PlatformSources {
        processes: Arc::new(source.clone()),
        counters: Arc::new(source),
        host: fixture.host,
    }
}

//! Error types for the sampling subsystem.
//!
//! Only failures that prevent a whole sampling pass are represented here.
//! Per-process read failures are absorbed by the platform adapters, and a
//! zero tick delta or a missing baseline only shapes the reported values.

use std::time::Duration;

/// Errors that abort a sampling pass.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The process list or system counters could not be read at all.
    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        reason: String,
    },

    #[error("sampling interval must be greater than zero (got {0:?})")]
    InvalidInterval(Duration),

    /// The caller's deadline passed or the pass was cancelled before the second snapshot.
    #[error("sampling cancelled before the second snapshot")]
    Cancelled,
}

impl SampleError {
    pub fn unavailable(source_name: &'static str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name,
            reason: reason.into(),
        }
    }
}

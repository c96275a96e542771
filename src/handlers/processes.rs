//! Per-process usage endpoint.
//!
//! Every request runs its own two-sample pass, bounded by the configured
//! sample timeout. A failed or cancelled pass answers with an empty array.

use axum::{
    extract::{Query, State},
    Json,
};
use herakles_sysstats::process::apply_filters;
use herakles_sysstats::{CorrelatedProcessUsage, ProcessFilter};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    /// Numeric pid or exact process name
    pub process: Option<String>,
}

/// Handler for the /processes endpoint.
#[instrument(skip(state))]
pub async fn processes_handler(
    State(state): State<SharedState>,
    Query(query): Query<ProcessQuery>,
) -> Json<Vec<CorrelatedProcessUsage>> {
    debug!("Processing /processes request");

    let filter = query.process.as_deref().and_then(ProcessFilter::parse);
    if let Some(f) = &filter {
        debug!("Restricting rows to {}", f);
    }
    let rows = state.sample().await;
    let total = rows.len();
    let rows = apply_filters(rows, filter.as_ref(), &state.name_filter);

    debug!(
        "Sampled {} processes, returning {} after filtering",
        total,
        rows.len()
    );
    Json(rows)
}

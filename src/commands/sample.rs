//! Sample command implementation.
//!
//! Runs one or more sampling passes and prints the rows.

use herakles_sysstats::process::apply_filters;
use herakles_sysstats::{CorrelatedProcessUsage, ProcessFilter, SampleContext};
use std::cmp::Ordering;
use std::time::Instant;

use crate::cli::ConfigFormat;
use crate::config::Config;
use crate::state::build_sampler;

/// Orders rows by CPU usage, highest first; unknown CPU sorts last.
pub fn sort_by_cpu(rows: &mut [CorrelatedProcessUsage]) {
    rows.sort_by(|a, b| match (a.cpu_percent, b.cpu_percent) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.pid.cmp(&b.pid),
    });
}

fn render_rows(
    rows: &[CorrelatedProcessUsage],
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(rows)?,
        ConfigFormat::Yaml => serde_yaml::to_string(rows)?,
        ConfigFormat::Toml => {
            #[derive(serde::Serialize)]
            struct Rows<'a> {
                processes: &'a [CorrelatedProcessUsage],
            }
            toml::to_string_pretty(&Rows { processes: rows })?
        }
    })
}

/// Samples process usage and prints the rows.
pub async fn command_sample(
    process: Option<String>,
    iterations: usize,
    top: Option<usize>,
    format: ConfigFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let sampler = build_sampler(config)?;
    let filter = process.as_deref().and_then(ProcessFilter::parse);
    let names = config.name_filter();

    for iteration in 1..=iterations.max(1) {
        let start = Instant::now();
        let ctx = SampleContext::new().with_timeout(config.sample_timeout());
        let rows = sampler.sample(&ctx).await?;
        let sampled = rows.len();

        let mut rows = apply_filters(rows, filter.as_ref(), &names);
        sort_by_cpu(&mut rows);
        if let Some(n) = top {
            rows.truncate(n);
        }

        eprintln!(
            "🔄 Pass {}/{}: {} processes sampled, {} shown, {:.1}ms",
            iteration,
            iterations.max(1),
            sampled,
            rows.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        println!("{}", render_rows(&rows, &format)?);
    }

    Ok(())
}

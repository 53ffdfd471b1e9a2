mod config;
mod directory;
mod grouping;
mod language;
mod models;
mod output;
mod pipeline;
mod prober;
mod reference;
mod sampler;

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::PipelineConfig;
use crate::directory::{build_client, DirectoryClient};
use crate::grouping::{group_by_country, rescue_unknown};
use crate::prober::HttpProber;
use crate::reference::ReferenceData;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let scope = country_scope()?;
    if let Some(cc) = &scope {
        info!(country = %cc, "run scoped to a single country");
    }

    let cfg = PipelineConfig::load()?;
    let http = build_client()?;

    let reference = ReferenceData::load(&http, &cfg).await?;

    let catalog = DirectoryClient::new(http, &cfg).fetch_all_stations().await?;
    info!(stations = catalog.len(), "raw catalog loaded");

    let mut grouped = group_by_country(catalog);
    rescue_unknown(&mut grouped);

    let prober = HttpProber::new(cfg.probe_timeout())?;
    let dataset = pipeline::run(&grouped, &reference, &cfg, scope.as_deref(), &prober).await;

    output::write_atomic(Path::new(&cfg.output_path), &dataset)?;

    let total_stations: usize = dataset.values().map(Vec::len).sum();
    for (country, stations) in &dataset {
        info!(country = %country, stations = stations.len(), "emitted");
    }
    info!(
        countries = dataset.len(),
        stations = total_stations,
        output = %cfg.output_path,
        "dataset written"
    );
    Ok(())
}

/// Optional single-country scope: first positional argument, falling back to
/// the STATIONGEN_COUNTRY environment variable. An invalid code fails the
/// run (exit 1) rather than silently producing an empty dataset.
fn country_scope() -> Result<Option<String>> {
    let raw = match std::env::args().nth(1) {
        Some(arg) => Some(arg),
        None => std::env::var("STATIONGEN_COUNTRY").ok(),
    };
    let Some(raw) = raw else {
        return Ok(None);
    };
    let code = raw.trim();
    if code.is_empty() {
        return Ok(None);
    }
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        bail!("Invalid country code {code:?}: expected an ISO 3166-1 alpha-2 code like \"DE\"");
    }
    Ok(Some(code.to_uppercase()))
}

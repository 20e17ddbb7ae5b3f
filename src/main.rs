//! Performance pipeline — binary entrypoint.
//! Loads configuration, runs Discover → Measure → Analyze → Report once and
//! logs the resulting artifact path and stage counts.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use web_perf_analyzer::{config::AppConfig, pipeline};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::load_default()?;
    let outcome = pipeline::run(&config).await?;

    tracing::info!(
        artifact = %outcome.artifact_path.display(),
        discovered = outcome.counts.discovered,
        measured_sources = outcome.counts.measured_sources,
        insights = outcome.counts.insight_count,
        "pipeline completed"
    );
    Ok(())
}

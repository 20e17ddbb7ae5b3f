// src/pipeline.rs
//! Stage driver: Discover → Measure → Analyze → Report.
//!
//! Stages run strictly in sequence; each completes before the next starts.
//! Fetch and probe failures surface as recorded partial results, never as
//! pipeline errors. Only configuration and persistence failures terminate a
//! run.

use crate::analyze::analyze;
use crate::config::AppConfig;
use crate::discover::Discoverer;
use crate::measure::Measurer;
use crate::report::Reporter;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCounts {
    pub discovered: usize,
    pub measured_sources: usize,
    pub insight_count: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub artifact_path: PathBuf,
    pub counts: PipelineCounts,
}

/// Run one full pipeline pass against a resolved configuration.
pub async fn run(cfg: &AppConfig) -> Result<PipelineOutcome> {
    let discoverer = Discoverer::from_config(cfg)?;
    let measurer = Measurer::from_config(cfg)?;
    let reporter = Reporter::from_config(cfg);

    tracing::info!("starting discovery stage");
    let discovery = discoverer.discover_configured().await;
    tracing::info!(discovered = discovery.len(), "discovery stage completed");

    let snapshot = measurer.measure().await;

    let analysis = reporter.include_analysis().then(|| analyze(&snapshot));
    if let Some(result) = &analysis {
        tracing::info!(
            insights = result.insights.len(),
            has_errors = result.summary.has_errors,
            "analysis stage completed"
        );
    }

    let counts = PipelineCounts {
        discovered: discovery.len(),
        measured_sources: snapshot.source_count,
        insight_count: analysis.as_ref().map_or(0, |a| a.insights.len()),
    };

    let artifact_path = reporter
        .generate(snapshot, analysis, discovery)
        .context("persisting report")?;
    tracing::info!(artifact = %artifact_path.display(), "report stage completed");

    Ok(PipelineOutcome {
        artifact_path,
        counts,
    })
}

// src/report.rs
//! Versioned report assembly and persistence.
//!
//! Unlike the tolerant discovery/measurement stages, persistence is not
//! best-effort: any I/O failure propagates to the caller so the pipeline
//! never reports a fabricated success path.

use crate::analyze::AnalysisResult;
use crate::config::AppConfig;
use crate::discover::DiscoveryRecord;
use crate::measure::MeasurementSnapshot;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_VERSION: &str = "1.0";

/// The terminal artifact of one pipeline run. Written exactly once per
/// configured format, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub metrics: MeasurementSnapshot,
    pub analysis: Option<AnalysisResult>,
    pub discovery: Vec<DiscoveryRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Json,
    Text,
}

impl ReportFormat {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

pub struct Reporter {
    output_dir: PathBuf,
    formats: Vec<String>,
    include_analysis: bool,
}

impl Reporter {
    /// Reads `reporting.output_dir`, `reporting.formats` and
    /// `reporting.include_analysis`.
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(cfg.get_or("reporting.output_dir", "reports".to_string())),
            formats: cfg.get_or("reporting.formats", vec!["json".to_string()]),
            include_analysis: cfg.get_or("reporting.include_analysis", true),
        }
    }

    /// Whether the caller should bother running the Analyzer at all; when
    /// false the report's analysis field stays empty rather than computed.
    pub fn include_analysis(&self) -> bool {
        self.include_analysis
    }

    /// Assemble the report and write it in every configured format.
    /// Returns the first configured format's artifact path, or an empty path
    /// when no format is configured.
    pub fn generate(
        &self,
        metrics: MeasurementSnapshot,
        analysis: Option<AnalysisResult>,
        discovery: Vec<DiscoveryRecord>,
    ) -> Result<PathBuf> {
        let report = Report {
            timestamp: Utc::now(),
            version: REPORT_VERSION.to_string(),
            metrics,
            analysis,
            discovery,
        };
        self.persist(&report)
    }

    fn persist(&self, report: &Report) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("creating report output dir {}", self.output_dir.display())
        })?;

        let stem = format!("performance_report_{}", sanitize_timestamp(&report.timestamp));
        let mut paths: Vec<PathBuf> = Vec::new();
        for name in &self.formats {
            let Some(format) = ReportFormat::parse(name) else {
                tracing::warn!(format = %name, "unknown report format, skipping");
                continue;
            };
            let path = self.output_dir.join(format!("{stem}.{}", format.extension()));
            let body = match format {
                ReportFormat::Json => {
                    serde_json::to_string_pretty(report).context("serializing report to json")?
                }
                ReportFormat::Text => render_text(report),
            };
            fs::write(&path, body)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote report artifact");
            paths.push(path);
        }

        Ok(paths.into_iter().next().unwrap_or_default())
    }
}

/// Filenames replace `:` so report timestamps stay path-safe everywhere.
fn sanitize_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true).replace(':', "-")
}

pub fn read_report(path: &Path) -> Result<Report> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading report from {}", path.display()))?;
    serde_json::from_str(&raw).context("deserializing report")
}

fn render_text(report: &Report) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Performance report v{} — generated {}",
        report.version,
        report.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    let _ = writeln!(out, "\nDiscovered resources: {}", report.discovery.len());
    for record in &report.discovery {
        let _ = writeln!(
            out,
            "  [{}] {} ({} bytes, {:.3}s, depth {})",
            record.status_code,
            record.locator,
            record.content_length,
            record.response_time_seconds,
            record.depth
        );
    }

    let _ = writeln!(
        out,
        "\nMeasurement sources: {} (collected {})",
        report.metrics.source_count,
        report.metrics.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    for name in report.metrics.sources.keys() {
        let _ = writeln!(out, "  - {name}");
    }

    match &report.analysis {
        Some(analysis) => {
            let _ = writeln!(
                out,
                "\nAnalysis: {} source categories, errors: {}",
                analysis.summary.total_metrics, analysis.summary.has_errors
            );
            if let Some(note) = &analysis.summary.note {
                let _ = writeln!(out, "  note: {note}");
            }
            for insight in &analysis.insights {
                let _ = writeln!(out, "  insight: {insight}");
            }
            for rec in &analysis.recommendations {
                let _ = writeln!(out, "  recommendation: {rec}");
            }
        }
        None => {
            let _ = writeln!(out, "\nAnalysis: not included");
        }
    }

    out
}

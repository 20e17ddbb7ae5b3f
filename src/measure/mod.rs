// src/measure/mod.rs
//! Measurement snapshot assembly over named metric sources.
//!
//! Each configured source name dispatches to a [`MetricSource`] provider.
//! One endpoint's failure never prevents measurement of the rest, and an
//! unknown source name is skipped with a warning rather than an error.

pub mod providers;

use crate::config::AppConfig;
use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::time::Instant;

use crate::measure::providers::{http_probe::HttpProbe, system::SystemGauges};

/// One-time metrics registration (so series show up on a scrape).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "measurement_source_errors_total",
            "Metric source collection errors."
        );
        describe_counter!("probe_errors_total", "Failed endpoint probes.");
        describe_gauge!(
            "measurement_last_run_ts",
            "Unix ts when measurement last ran."
        );
    });
}

/// Host-level resource gauges. Keys are fixed and deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemMetrics {
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub disk_pct: f64,
    pub net_bytes_sent: u64,
    pub net_bytes_recv: u64,
    pub method: String,
}

/// One probed endpoint: an explicit success/error sum rather than optional
/// fields. Serialized shape keeps the `success` flag alongside the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EndpointMetric {
    Success {
        url: String,
        status_code: u16,
        response_time_seconds: f64,
        content_length: u64,
        success: bool,
    },
    Failure {
        url: String,
        error: String,
        success: bool,
    },
}

impl EndpointMetric {
    pub fn success(
        url: String,
        status_code: u16,
        response_time_seconds: f64,
        content_length: u64,
    ) -> Self {
        Self::Success {
            url,
            status_code,
            response_time_seconds,
            content_length,
            success: true,
        }
    }

    pub fn failure(url: String, error: String) -> Self {
        Self::Failure {
            url,
            error,
            success: false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

/// Metrics from one source category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SourceMetrics {
    System(SystemMetrics),
    Http(Vec<EndpointMetric>),
}

impl SourceMetrics {
    /// A source with nothing to report is left out of the snapshot.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::System(_) => false,
            Self::Http(list) => list.is_empty(),
        }
    }

    pub fn has_errors(&self) -> bool {
        match self {
            Self::System(_) => false,
            Self::Http(list) => list.iter().any(|m| !m.is_success()),
        }
    }
}

/// One point-in-time bundle of metrics across all active sources. Created
/// fresh per collection call, immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sources: BTreeMap<String, SourceMetrics>,
    pub source_count: usize,
}

impl MeasurementSnapshot {
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            sources: BTreeMap::new(),
            source_count: 0,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.sources.values().any(SourceMetrics::has_errors)
    }
}

/// A named provider of metrics.
#[async_trait::async_trait]
pub trait MetricSource: Send + Sync {
    async fn collect(&self) -> Result<SourceMetrics>;
    fn name(&self) -> &'static str;
}

pub struct Measurer {
    source_names: Vec<String>,
    system: SystemGauges,
    http: HttpProbe,
}

impl Measurer {
    /// Reads `measurement.sources`, `measurement.http_endpoints` and
    /// `measurement.http_timeout_seconds`.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let source_names = cfg.get_or(
            "measurement.sources",
            vec!["system".to_string(), "http".to_string()],
        );
        Ok(Self {
            source_names,
            system: SystemGauges::new(),
            http: HttpProbe::from_config(cfg)?,
        })
    }

    /// Collect every configured source into one timestamped snapshot.
    /// `source_count` counts populated source categories, not individual
    /// metric entries.
    pub async fn measure(&self) -> MeasurementSnapshot {
        ensure_metrics_described();
        tracing::info!("starting metrics collection");
        let started = Instant::now();

        let mut sources = BTreeMap::new();
        for name in &self.source_names {
            let provider: &dyn MetricSource = match name.as_str() {
                "system" => &self.system,
                "http" => &self.http,
                other => {
                    tracing::warn!(source = other, "unknown metrics source, skipping");
                    continue;
                }
            };
            match provider.collect().await {
                Ok(metrics) if metrics.is_empty() => {
                    tracing::debug!(source = provider.name(), "source yielded no metrics");
                }
                Ok(metrics) => {
                    sources.insert(provider.name().to_string(), metrics);
                }
                Err(e) => {
                    counter!("measurement_source_errors_total").increment(1);
                    tracing::warn!(error = ?e, source = provider.name(), "source collection failed");
                }
            }
        }

        let timestamp = Utc::now();
        gauge!("measurement_last_run_ts").set(timestamp.timestamp() as f64);
        tracing::info!(
            sources = sources.len(),
            elapsed_s = started.elapsed().as_secs_f64(),
            "metrics collection completed"
        );
        MeasurementSnapshot {
            timestamp,
            source_count: sources.len(),
            sources,
        }
    }
}

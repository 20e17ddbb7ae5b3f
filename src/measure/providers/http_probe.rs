// src/measure/providers/http_probe.rs
//! Timed GET probes against configured endpoints.
//!
//! A transport failure (connect error, timeout) is recorded as an error
//! variant for that endpoint and collection moves on; a non-2xx status is a
//! successful probe, not an error.

use crate::config::AppConfig;
use crate::measure::{EndpointMetric, MetricSource, SourceMetrics};
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;
use tokio::time::Instant;

pub struct HttpProbe {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl HttpProbe {
    /// Reads `measurement.http_endpoints` and
    /// `measurement.http_timeout_seconds`.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let timeout = cfg.get_or("measurement.http_timeout_seconds", 10u64);
        Self::new(
            cfg.get_or("measurement.http_endpoints", Vec::new()),
            Duration::from_secs(timeout),
        )
    }

    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building probe http client")?;
        Ok(Self { client, endpoints })
    }

    async fn probe(&self, url: &str) -> EndpointMetric {
        let started = Instant::now();
        let outcome = async {
            let resp = self.client.get(url).send().await?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.len() as u64))
        }
        .await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok((status_code, content_length)) => {
                tracing::info!(
                    url = %url,
                    status = status_code,
                    elapsed_s = round_to_millis(elapsed),
                    "probed endpoint"
                );
                EndpointMetric::success(
                    url.to_string(),
                    status_code,
                    round_to_millis(elapsed),
                    content_length,
                )
            }
            Err(e) => {
                counter!("probe_errors_total").increment(1);
                tracing::warn!(error = ?e, url = %url, "endpoint probe failed");
                EndpointMetric::failure(url.to_string(), e.to_string())
            }
        }
    }
}

/// Millisecond precision is enough for reporting; anything finer is noise.
fn round_to_millis(secs: f64) -> f64 {
    (secs * 1_000.0).round() / 1_000.0
}

#[async_trait]
impl MetricSource for HttpProbe {
    async fn collect(&self) -> Result<SourceMetrics> {
        let mut out = Vec::with_capacity(self.endpoints.len());
        for url in &self.endpoints {
            out.push(self.probe(url).await);
        }
        Ok(SourceMetrics::Http(out))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

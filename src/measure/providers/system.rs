// src/measure/providers/system.rs
//! Host-level resource gauges sampled through `sysinfo`.

use crate::measure::{MetricSource, SourceMetrics, SystemMetrics};
use anyhow::Result;
use async_trait::async_trait;
use sysinfo::{CpuExt, DiskExt, NetworkExt, NetworksExt, System, SystemExt};

pub struct SystemGauges;

impl SystemGauges {
    pub fn new() -> Self {
        Self
    }

    fn sample() -> SystemMetrics {
        let mut sys = System::new_all();
        sys.refresh_all();

        let cpu_pct = f64::from(sys.global_cpu_info().cpu_usage());

        let mem_pct = if sys.total_memory() > 0 {
            sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
        } else {
            0.0
        };

        let (disk_total, disk_avail) = sys
            .disks()
            .iter()
            .fold((0u64, 0u64), |(total, avail), d| {
                (total + d.total_space(), avail + d.available_space())
            });
        let disk_pct = if disk_total > 0 {
            (disk_total - disk_avail) as f64 / disk_total as f64 * 100.0
        } else {
            0.0
        };

        let (net_bytes_sent, net_bytes_recv) = sys
            .networks()
            .iter()
            .fold((0u64, 0u64), |(sent, recv), (_, data)| {
                (sent + data.total_transmitted(), recv + data.total_received())
            });

        SystemMetrics {
            cpu_pct,
            mem_pct,
            disk_pct,
            net_bytes_sent,
            net_bytes_recv,
            method: "sysinfo".to_string(),
        }
    }
}

impl Default for SystemGauges {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for SystemGauges {
    async fn collect(&self) -> Result<SourceMetrics> {
        tracing::debug!("collecting system gauges");
        Ok(SourceMetrics::System(Self::sample()))
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gauges_are_bounded_percentages() {
        let metrics = match SystemGauges::new().collect().await.unwrap() {
            SourceMetrics::System(m) => m,
            other => panic!("unexpected variant: {other:?}"),
        };
        assert!((0.0..=100.0).contains(&metrics.mem_pct));
        assert!((0.0..=100.0).contains(&metrics.disk_pct));
        assert_eq!(metrics.method, "sysinfo");
    }
}

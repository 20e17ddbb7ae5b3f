// src/analyze.rs
//! Pure rule evaluation over a measurement snapshot.
//!
//! The rule set is an ordered list of independent evaluators, each a pure
//! function of the snapshot. New rules are additive: they contribute to the
//! insight and recommendation accumulations without changing the calling
//! convention. `analyze` performs no I/O and keeps no state, so results are
//! recomputable from the same snapshot at any time.

use crate::measure::MeasurementSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub total_metrics: usize,
    pub has_errors: bool,
    /// Time of analysis, not of collection; analysis may run later.
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// What one rule contributes when it fires. Insights and recommendations
/// are separate accumulations that may diverge as rules are added.
#[derive(Debug, Clone, Default)]
pub struct RuleHit {
    pub insight: Option<String>,
    pub recommendation: Option<String>,
}

type Rule = fn(&MeasurementSnapshot) -> Option<RuleHit>;

/// Ordered rule set. Evaluation order is the declaration order.
const RULES: &[Rule] = &[collection_error_rule];

fn collection_error_rule(snapshot: &MeasurementSnapshot) -> Option<RuleHit> {
    if !snapshot.has_errors() {
        return None;
    }
    Some(RuleHit {
        insight: Some("Performance issues detected in metrics collection".to_string()),
        recommendation: Some(
            "Investigate error sources in metrics collection pipeline".to_string(),
        ),
    })
}

/// Derive summary, insights and recommendations from a snapshot.
/// An empty snapshot never fails; its summary notes the absence explicitly.
pub fn analyze(snapshot: &MeasurementSnapshot) -> AnalysisResult {
    tracing::debug!(sources = snapshot.source_count, "analyzing snapshot");

    let mut insights = Vec::new();
    let mut recommendations = Vec::new();
    for rule in RULES {
        if let Some(hit) = rule(snapshot) {
            insights.extend(hit.insight);
            recommendations.extend(hit.recommendation);
        }
    }

    let note = snapshot
        .sources
        .is_empty()
        .then(|| "no metrics were collected".to_string());

    AnalysisResult {
        summary: AnalysisSummary {
            total_metrics: snapshot.sources.len(),
            has_errors: snapshot.has_errors(),
            timestamp: Utc::now(),
            note,
        },
        insights,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{EndpointMetric, SourceMetrics};

    fn snapshot_with_http(entries: Vec<EndpointMetric>) -> MeasurementSnapshot {
        let mut snapshot = MeasurementSnapshot::empty();
        snapshot
            .sources
            .insert("http".to_string(), SourceMetrics::Http(entries));
        snapshot.source_count = snapshot.sources.len();
        snapshot
    }

    #[test]
    fn error_entries_set_has_errors_and_insights() {
        let snapshot = snapshot_with_http(vec![
            EndpointMetric::success("http://a.test".into(), 200, 0.01, 10),
            EndpointMetric::failure("http://b.test".into(), "timed out".into()),
        ]);
        let result = analyze(&snapshot);
        assert!(result.summary.has_errors);
        assert_eq!(result.summary.total_metrics, 1);
        assert!(!result.insights.is_empty());
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn clean_snapshot_yields_no_insights() {
        let snapshot = snapshot_with_http(vec![EndpointMetric::success(
            "http://a.test".into(),
            503,
            0.2,
            0,
        )]);
        let result = analyze(&snapshot);
        // non-2xx is not a collection error
        assert!(!result.summary.has_errors);
        assert!(result.insights.is_empty());
        assert!(result.recommendations.is_empty());
        assert!(result.summary.note.is_none());
    }

    #[test]
    fn empty_snapshot_notes_the_absence() {
        let result = analyze(&MeasurementSnapshot::empty());
        assert_eq!(result.summary.total_metrics, 0);
        assert!(!result.summary.has_errors);
        assert_eq!(result.summary.note.as_deref(), Some("no metrics were collected"));
    }

    #[test]
    fn analysis_is_idempotent_modulo_timestamp() {
        let snapshot = snapshot_with_http(vec![EndpointMetric::failure(
            "http://a.test".into(),
            "connection refused".into(),
        )]);
        let first = analyze(&snapshot);
        let second = analyze(&snapshot);
        assert_eq!(first.insights, second.insights);
        assert_eq!(first.recommendations, second.recommendations);
        assert_eq!(first.summary.total_metrics, second.summary.total_metrics);
        assert_eq!(first.summary.has_errors, second.summary.has_errors);
        assert_eq!(first.summary.note, second.summary.note);
    }
}

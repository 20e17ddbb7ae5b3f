// tests/measure_partial_failure.rs
mod common;

use serde_json::json;
use web_perf_analyzer::{AppConfig, EndpointMetric, Measurer, SourceMetrics};

fn measurement_config(sources: &[&str], endpoints: Vec<String>) -> AppConfig {
    let mut cfg = AppConfig::empty();
    cfg.set("measurement.sources", json!(sources));
    cfg.set("measurement.http_endpoints", json!(endpoints));
    cfg.set("measurement.http_timeout_seconds", json!(2));
    cfg
}

#[tokio::test]
async fn one_unreachable_endpoint_does_not_poison_the_rest() {
    let server = common::spawn_fixture_server().await;
    let dead = common::unreachable_url().await;
    let endpoints = vec![server.url("/one"), dead.clone(), server.url("/two")];

    let measurer = Measurer::from_config(&measurement_config(&["http"], endpoints)).unwrap();
    let snapshot = measurer.measure().await;

    let SourceMetrics::Http(entries) = &snapshot.sources["http"] else {
        panic!("http source missing");
    };
    assert_eq!(entries.len(), 3);
    assert_eq!(entries.iter().filter(|m| m.is_success()).count(), 2);

    let failed: Vec<_> = entries.iter().filter(|m| !m.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].url(), dead);
    assert!(failed[0].error().is_some());
    assert!(snapshot.has_errors());
}

#[tokio::test]
async fn unknown_source_is_skipped_and_the_rest_collected() {
    let measurer =
        Measurer::from_config(&measurement_config(&["bogus", "system"], Vec::new())).unwrap();
    let snapshot = measurer.measure().await;

    assert_eq!(snapshot.source_count, 1);
    assert!(snapshot.sources.contains_key("system"));
    assert!(!snapshot.has_errors());
}

#[tokio::test]
async fn empty_endpoint_list_leaves_http_unpopulated() {
    let measurer =
        Measurer::from_config(&measurement_config(&["system", "http"], Vec::new())).unwrap();
    let snapshot = measurer.measure().await;

    assert_eq!(snapshot.source_count, 1);
    assert!(!snapshot.sources.contains_key("http"));
}

#[tokio::test]
async fn probe_timings_have_millisecond_precision() {
    let server = common::spawn_fixture_server().await;
    let measurer =
        Measurer::from_config(&measurement_config(&["http"], vec![server.url("/t")])).unwrap();
    let snapshot = measurer.measure().await;

    let SourceMetrics::Http(entries) = &snapshot.sources["http"] else {
        panic!("http source missing");
    };
    match &entries[0] {
        EndpointMetric::Success {
            status_code,
            response_time_seconds,
            content_length,
            ..
        } => {
            assert_eq!(*status_code, 200);
            assert_eq!(*content_length, common::FIXTURE_BODY.len() as u64);
            let millis = response_time_seconds * 1_000.0;
            assert!((millis - millis.round()).abs() < 1e-9);
        }
        other => panic!("expected success, got {other:?}"),
    }
}

//! End-to-end tests: Scaler::connect over HTTP against the fake cluster.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tracing::Span;

use esscale_core::{MetricTargetType, Scaler, ScalerConfig, ScalerError};
use esscale_elasticsearch::ElasticsearchScaler;

use crate::fake_cluster::FakeCluster;

fn trigger(base: &str, template: &str, target: &str) -> ScalerConfig {
    ScalerConfig::new()
        .with_metadata("addresses", base)
        .with_metadata("index", "jobs")
        .with_metadata("searchTemplateName", template)
        .with_metadata("parameters", "queue:default")
        .with_metadata("valueLocation", "aggregations.pending.value")
        .with_metadata("targetValue", target)
}

async fn connect(cluster: &Arc<FakeCluster>) -> ElasticsearchScaler {
    let base = cluster.spawn().await;
    ElasticsearchScaler::connect(trigger(&base, "pending-jobs", "10"), Span::none())
        .await
        .unwrap()
}

#[tokio::test]
async fn reports_value_and_activity() {
    let cluster = Arc::new(FakeCluster::answering(
        json!({"aggregations": {"pending": {"value": 27.0}}}),
    ));
    let scaler = connect(&cluster).await;

    assert!(scaler.is_active().await.unwrap());
    let metric = scaler.current_value().await.unwrap();
    assert_eq!(metric.value, 27);
    assert_eq!(metric.metric_name, "s10-elasticsearch-pending-jobs");

    let seen = cluster.requests();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].body, json!({"id": "pending-jobs", "params": {"queue": "default"}}));
    assert_eq!(seen[0].body, seen[1].body);
}

#[tokio::test]
async fn zero_is_inactive() {
    let cluster = Arc::new(FakeCluster::answering(
        json!({"aggregations": {"pending": {"value": "0"}}}),
    ));
    let scaler = connect(&cluster).await;

    assert!(!scaler.is_active().await.unwrap());
    assert_eq!(scaler.current_value().await.unwrap().value, 0);
}

#[tokio::test]
async fn missing_value_is_never_zero() {
    let cluster = Arc::new(FakeCluster::answering(json!({"aggregations": {}})));
    let scaler = connect(&cluster).await;

    let active = scaler.is_active().await.unwrap_err();
    let value = scaler.current_value().await.unwrap_err();
    assert_eq!(active, ScalerError::InvalidValueType("absent".into()));
    assert_eq!(active, value);
}

#[tokio::test]
async fn template_not_found_surfaces_as_connection_error() {
    let cluster = Arc::new(FakeCluster::failing(
        StatusCode::NOT_FOUND,
        json!({"error": "template missing"}),
    ));
    let scaler = connect(&cluster).await;

    let active = scaler.is_active().await.unwrap_err();
    let value = scaler.current_value().await.unwrap_err();
    assert!(matches!(active, ScalerError::Connection(_)));
    assert_eq!(active, value);
}

#[tokio::test]
async fn slow_cluster_is_cancelled_at_the_deadline() {
    let cluster = Arc::new(FakeCluster::slow(
        json!({"aggregations": {"pending": {"value": 1}}}),
        Duration::from_secs(5),
    ));
    let base = cluster.spawn().await;
    let config = trigger(&base, "pending-jobs", "10").with_http_timeout(Duration::from_millis(100));
    let scaler = ElasticsearchScaler::connect(config, Span::none()).await.unwrap();

    let err = scaler.current_value().await.unwrap_err();
    assert!(matches!(err, ScalerError::Cancelled(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_cluster_fails_construction() {
    let result = ElasticsearchScaler::connect(
        trigger("http://127.0.0.1:9", "pending-jobs", "10"),
        Span::none(),
    )
    .await;
    assert!(matches!(result, Err(ScalerError::Connection(_))));
}

#[tokio::test]
async fn bad_configuration_fails_before_any_request() {
    let cluster = Arc::new(FakeCluster::answering(json!({})));
    let base = cluster.spawn().await;

    let mut config = trigger(&base, "pending-jobs", "10");
    config.trigger_metadata.remove("searchTemplateName");
    let err = ElasticsearchScaler::connect(config, Span::none())
        .await
        .err()
        .unwrap();
    assert_eq!(err, ScalerError::missing("searchTemplateName"));

    let config = trigger(&base, "pending-jobs", "notanumber");
    let err = ElasticsearchScaler::connect(config, Span::none())
        .await
        .err()
        .unwrap();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("targetValue"));

    assert!(cluster.requests().is_empty());
}

#[tokio::test]
async fn metric_names_track_template_and_target() {
    let cluster = Arc::new(FakeCluster::answering(json!({})));
    let base = cluster.spawn().await;

    let build = |template: &str, target: &str| {
        ElasticsearchScaler::connect(trigger(&base, template, target), Span::none())
    };
    let a = build("orders", "10").await.unwrap().metric_spec();
    let same = build("orders", "10").await.unwrap().metric_spec();
    let other_template = build("refunds", "10").await.unwrap().metric_spec();
    let other_target = build("orders", "20").await.unwrap().metric_spec();

    assert_eq!(a, same);
    assert_ne!(a.name, other_template.name);
    assert_ne!(a.name, other_target.name);
    assert_eq!(a.target_type, MetricTargetType::AverageValue);
    assert_eq!(other_target.target, 20);
}

#[tokio::test]
async fn close_is_idempotent() {
    let cluster = Arc::new(FakeCluster::answering(json!({})));
    let scaler = connect(&cluster).await;

    scaler.close().await.unwrap();
    scaler.close().await.unwrap();
    assert!(scaler.is_active().await.is_err());
}

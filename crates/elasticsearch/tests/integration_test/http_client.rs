//! Tests for HttpSearchClient against the fake cluster.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use esscale_core::{ScalerConfig, ScalerError};
use esscale_elasticsearch::*;

use crate::fake_cluster::FakeCluster;
use crate::tls_cluster;

fn metadata(addresses: &str) -> ElasticsearchMetadata {
    let cfg = ScalerConfig::new()
        .with_metadata("addresses", addresses)
        .with_metadata("index", "orders;returns")
        .with_metadata("searchTemplateName", "pending")
        .with_metadata("valueLocation", "hits.total.value")
        .with_metadata("targetValue", "5");
    ElasticsearchMetadata::parse(&cfg).unwrap()
}

#[tokio::test]
async fn ping_reaches_the_root_endpoint() {
    let cluster = Arc::new(FakeCluster::answering(json!({})));
    let base = cluster.spawn().await;

    let client = HttpSearchClient::new(&metadata(&base)).unwrap();
    client.ping().await.unwrap();
}

#[tokio::test]
async fn search_template_posts_to_joined_indexes() {
    let cluster = Arc::new(FakeCluster::answering(json!({"hits": {"total": {"value": 4}}})));
    let base = cluster.spawn().await;

    let meta = metadata(&base);
    let client = HttpSearchClient::new(&meta).unwrap();
    let query = build_query("pending", &["status:open".to_string()]).unwrap();
    let body = client.search_template(&meta.indexes, &query).await.unwrap();

    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["hits"]["total"]["value"], 4);

    let seen = cluster.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].indexes, "orders,returns");
    assert_eq!(seen[0].body, json!({"id": "pending", "params": {"status": "open"}}));
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn basic_auth_is_sent_when_configured() {
    let cluster = Arc::new(FakeCluster::answering(json!({})));
    let base = cluster.spawn().await;

    let cfg = ScalerConfig::new()
        .with_metadata("addresses", &base)
        .with_metadata("index", "orders")
        .with_metadata("searchTemplateName", "pending")
        .with_metadata("valueLocation", "count")
        .with_metadata("targetValue", "5")
        .with_auth("username", "elastic")
        .with_metadata("passwordFromEnv", "ES_PASSWORD")
        .with_env("ES_PASSWORD", "s3cret");
    let meta = ElasticsearchMetadata::parse(&cfg).unwrap();
    let client = HttpSearchClient::new(&meta).unwrap();

    client
        .search_template(&meta.indexes, &json!({"id": "pending"}))
        .await
        .unwrap();

    let seen = cluster.requests();
    assert_eq!(
        seen[0].authorization.as_deref(),
        Some("Basic ZWxhc3RpYzpzM2NyZXQ=")
    );
}

#[tokio::test]
async fn error_status_is_a_connection_error_with_body() {
    let cluster = Arc::new(FakeCluster::failing(
        StatusCode::NOT_FOUND,
        json!({"error": {
            "type": "resource_not_found_exception",
            "reason": "unable to find script [pending]"
        }}),
    ));
    let base = cluster.spawn().await;

    let meta = metadata(&base);
    let client = HttpSearchClient::new(&meta).unwrap();
    let err = client
        .search_template(&meta.indexes, &json!({"id": "pending"}))
        .await
        .unwrap_err();

    match err {
        ScalerError::Connection(msg) => {
            assert!(msg.contains("404"), "{msg}");
            assert!(msg.contains("unable to find script"), "{msg}");
        }
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn requests_alternate_between_addresses() {
    let first = Arc::new(FakeCluster::answering(json!({})));
    let second = Arc::new(FakeCluster::answering(json!({})));
    let a = first.spawn().await;
    let b = second.spawn().await;

    let meta = metadata(&format!("{a},{b}"));
    let client = HttpSearchClient::new(&meta).unwrap();
    for _ in 0..4 {
        client
            .search_template(&meta.indexes, &json!({"id": "pending"}))
            .await
            .unwrap();
    }

    assert_eq!(first.requests().len(), 2);
    assert_eq!(second.requests().len(), 2);
}

#[tokio::test]
async fn self_signed_certificate_is_rejected_by_default() {
    let base = tls_cluster::spawn_self_signed();

    let client = HttpSearchClient::new(&metadata(&base)).unwrap();
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ScalerError::Connection(_)), "{err:?}");
}

#[tokio::test]
async fn unsafe_ssl_accepts_self_signed_certificate() {
    let base = tls_cluster::spawn_self_signed();

    let mut meta = metadata(&base);
    meta.unsafe_ssl = true;
    let client = HttpSearchClient::new(&meta).unwrap();
    client.ping().await.unwrap();
}

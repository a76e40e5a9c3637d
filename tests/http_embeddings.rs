//! HTTP embedding provider tests against a local mock server.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use ragmill::{EmbeddingProvider, HttpEmbeddingConfig, HttpEmbeddingProvider, RagError};

fn provider_for(server: &MockServer, dimensions: usize) -> HttpEmbeddingProvider {
    let config = HttpEmbeddingConfig {
        base_url: Url::parse(&server.base_url()).unwrap(),
        model: "nomic-embed-text".to_string(),
        dimensions,
        timeout: Duration::from_secs(5),
    };
    HttpEmbeddingProvider::new(config).unwrap()
}

#[tokio::test]
async fn availability_probe_hits_the_tags_endpoint() {
    let server = MockServer::start_async().await;
    let tags = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({"models": []}));
        })
        .await;

    let provider = provider_for(&server, 3);
    assert!(provider.is_available().await);
    tags.assert_async().await;
}

#[tokio::test]
async fn availability_is_false_on_server_error_and_on_no_server() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(500);
        })
        .await;

    let provider = provider_for(&server, 3);
    assert!(!provider.is_available().await);

    // A provider pointed at a port nothing listens on is simply unavailable.
    let config = HttpEmbeddingConfig {
        base_url: Url::parse("http://127.0.0.1:9").unwrap(),
        timeout: Duration::from_millis(200),
        ..HttpEmbeddingConfig::default()
    };
    let dead = HttpEmbeddingProvider::new(config).unwrap();
    assert!(!dead.is_available().await);
}

#[tokio::test]
async fn embed_returns_the_vector_from_the_service() {
    let server = MockServer::start_async().await;
    let embed = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/embed")
                .json_body(json!({"model": "nomic-embed-text", "input": ["hello"]}));
            then.status(200)
                .json_body(json!({"embeddings": [[0.1, 0.2, 0.3]]}));
        })
        .await;

    let provider = provider_for(&server, 3);
    let vector = provider.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    embed.assert_async().await;
}

#[tokio::test]
async fn embed_batch_preserves_input_order() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(200)
                .json_body(json!({"embeddings": [[1.0, 0.0], [0.0, 1.0]]}));
        })
        .await;

    let provider = provider_for(&server, 2);
    let texts = vec!["first".to_string(), "second".to_string()];
    let vectors = provider.embed_batch(&texts).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn empty_batch_never_touches_the_network() {
    let server = MockServer::start_async().await;
    let embed = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(200).json_body(json!({"embeddings": []}));
        })
        .await;

    let provider = provider_for(&server, 3);
    let vectors = provider.embed_batch(&[]).await.unwrap();
    assert!(vectors.is_empty());
    embed.assert_hits_async(0).await;
}

#[tokio::test]
async fn http_error_status_maps_to_the_http_variant() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(503);
        })
        .await;

    let provider = provider_for(&server, 3);
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, RagError::Http(_)));
}

#[tokio::test]
async fn wrong_dimensionality_is_rejected() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(200).json_body(json!({"embeddings": [[0.1, 0.2]]}));
        })
        .await;

    let provider = provider_for(&server, 3);
    let err = provider.embed("hello").await.unwrap_err();
    assert!(matches!(err, RagError::VectorDimension { got: 2, want: 3 }));
}

#[tokio::test]
async fn vector_count_must_match_input_count() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/embed");
            then.status(200)
                .json_body(json!({"embeddings": [[0.1, 0.2, 0.3]]}));
        })
        .await;

    let provider = provider_for(&server, 3);
    let texts = vec!["a".to_string(), "b".to_string()];
    let err = provider.embed_batch(&texts).await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

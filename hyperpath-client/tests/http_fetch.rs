//! HttpFetcher against a mock HTTP server.

use hyperpath_client::{connect, ClientConfig, FetchError, HttpFetcher, QueryError};
use hyperpath_core::Fetcher;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new().with_base_url(Url::parse(&server.uri()).unwrap())
}

async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

/// Customer with two orders spread over two linked pages.
async fn mount_customer(server: &MockServer) {
    mount_json(
        server,
        "/customers/1",
        json!({"name": "Jane Doe", "order_url": "/customers/1/orders"}),
    )
    .await;
    mount_json(
        server,
        "/customers/1/orders",
        json!({"$item_url": ["/orders/1000"], "next_url": "/customers/1/orders/page/2"}),
    )
    .await;
    mount_json(
        server,
        "/customers/1/orders/page/2",
        json!({"$item_url": ["/orders/1001"]}),
    )
    .await;
    mount_json(server, "/orders/1000", json!({"order_number": "1000"})).await;
    mount_json(server, "/orders/1001", json!({"order_number": "1001"})).await;
}

#[tokio::test]
async fn test_relative_url_resolved_against_base() {
    let server = MockServer::start().await;
    mount_json(&server, "/customers/1", json!({"name": "Jane Doe"})).await;

    let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
    let document = fetcher.fetch("/customers/1").await.unwrap();

    assert_eq!(document, json!({"name": "Jane Doe"}));
    assert_eq!(requested_paths(&server).await, vec!["/customers/1"]);
}

#[tokio::test]
async fn test_absolute_url_without_base() {
    let server = MockServer::start().await;
    mount_json(&server, "/doc", json!([1, 2])).await;

    let fetcher = HttpFetcher::new(&ClientConfig::new()).unwrap();
    let document = fetcher.fetch(&format!("{}/doc", server.uri())).await.unwrap();

    assert_eq!(document, json!([1, 2]));
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("user-agent", "hyperpath-tests/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let fetcher =
        HttpFetcher::new(&config_for(&server).with_user_agent("hyperpath-tests/1.0")).unwrap();
    assert_eq!(fetcher.fetch("/doc").await.unwrap(), json!({"ok": true}));
}

#[tokio::test]
async fn test_not_found_is_status_error() {
    let server = MockServer::start().await;
    let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();

    let err = fetcher.fetch("/missing").await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(err.url().ends_with("/missing"));
}

#[tokio::test]
async fn test_server_error_keeps_truncated_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/boom"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(1000)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
    match fetcher.fetch("/boom").await.unwrap_err() {
        FetchError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
    let err = fetcher.fetch("/text").await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fetcher =
        HttpFetcher::new(&config_for(&server).with_timeout(Duration::from_millis(200))).unwrap();
    let err = fetcher.fetch("/slow").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_path_follows_links_across_pages() {
    let server = MockServer::start().await;
    mount_customer(&server).await;

    let evaluator = connect(&config_for(&server)).unwrap();
    let numbers = evaluator
        .follow_link("/customers/1", ["order", "order_number"])
        .unwrap()
        .into_values()
        .await
        .unwrap();

    assert_eq!(numbers, vec![json!("1000"), json!("1001")]);
    assert_eq!(
        requested_paths(&server).await,
        vec![
            "/customers/1",
            "/customers/1/orders",
            "/orders/1000",
            "/customers/1/orders/page/2",
            "/orders/1001",
        ]
    );
}

#[tokio::test]
async fn test_first_value_stops_fetching() {
    let server = MockServer::start().await;
    mount_customer(&server).await;

    let evaluator = connect(&config_for(&server)).unwrap();
    let first = evaluator
        .follow_link("/customers/1", ["order", "order_number"])
        .unwrap()
        .first()
        .await
        .unwrap();

    assert_eq!(first, Some(json!("1000")));
    assert_eq!(
        requested_paths(&server).await,
        vec!["/customers/1", "/customers/1/orders", "/orders/1000"]
    );
}

#[tokio::test]
async fn test_selection_query_over_http() {
    let server = MockServer::start().await;
    mount_customer(&server).await;

    let evaluator = connect(&config_for(&server)).unwrap();
    let result = evaluator
        .query_url("/customers/1", "{ name order { order_number } }")
        .await
        .unwrap();

    assert_eq!(
        result.into_value().await.unwrap(),
        json!({"name": ["Jane Doe"], "order": {"order_number": ["1000"]}})
    );
    // Only the first order is expanded; the second page is never requested.
    assert_eq!(
        requested_paths(&server).await,
        vec!["/customers/1", "/customers/1/orders", "/orders/1000"]
    );
}

#[tokio::test]
async fn test_query_surfaces_http_failure() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/customers/1",
        json!({"name": "Jane Doe", "order_url": "/gone"}),
    )
    .await;

    let evaluator = connect(&config_for(&server)).unwrap();
    let err = evaluator
        .query_url("/customers/1", "{ order { order_number } }")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::Fetch(FetchError::Status { status: 404, .. })
    ));
}

//! Integration tests for `P2000Client`.
//!
//! Uses `wiremock` to stand up a local HTTP server per test so no real
//! network traffic is made.

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use p2000::error::ScrapeError;
use p2000::models::ScraperConfig;
use p2000::services::{P2000Client, PageSource};

fn test_client(base_url: &str, timeout_secs: u64) -> P2000Client {
    P2000Client::new(&ScraperConfig {
        base_url: base_url.to_string(),
        user_agent: "p2000-test/0.1".to_string(),
        timeout_secs,
    })
    .expect("failed to build test client")
}

#[tokio::test]
async fn fetch_returns_body_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/utrecht/"))
        .and(header("user-agent", "p2000-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 5);
    let body = client.fetch("/utrecht/").await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn fetch_maps_404_to_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 5);
    let err = client.fetch("bestaat-niet").await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::NoData { ref region_path, .. } if region_path == "bestaat-niet"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn fetch_maps_server_error_to_connection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 5);
    let err = client.fetch("utrecht").await.unwrap_err();
    match err {
        ScrapeError::Connection { message, .. } => assert!(message.contains("503")),
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_maps_timeout_to_connection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let err = client.fetch("utrecht").await.unwrap_err();
    assert_eq!(err.setup_code(), "cannot_connect");
}

#[tokio::test]
async fn fetch_maps_refused_connection() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = test_client(&format!("http://127.0.0.1:{port}/"), 2);
    let err = client.fetch("utrecht").await.unwrap_err();
    assert!(matches!(err, ScrapeError::Connection { .. }), "got {err:?}");
}

#[tokio::test]
async fn fetch_does_not_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 5);
    assert!(client.fetch("utrecht").await.is_err());
}

#[allow(dead_code)]
mod common;

use common::TestServer;

use hookfeed_client::{ClientConfig, EventSource, FetchError, HttpEventSource};
use hookfeed_core::events::{EventKind, TestEventKind};

#[tokio::test]
async fn fetches_events_newest_first() {
    let server = TestServer::new().await;
    server.push_event("push", "first");
    server.push_event("merge", "second");

    let source = HttpEventSource::new(server.base_url()).unwrap();
    let resp = source.fetch_events().await.unwrap();

    assert_eq!(resp.count, 2);
    assert_eq!(resp.events[0].message, "second");
    assert_eq!(resp.events[0].kind, EventKind::Merge);
    assert_eq!(resp.events[1].kind, EventKind::Push);
}

#[tokio::test]
async fn server_error_surfaces_message() {
    let server = TestServer::new().await;
    server.fail_with(500, "db down");

    let source = HttpEventSource::new(server.base_url()).unwrap();
    let err = source.fetch_events().await.unwrap_err();

    assert_eq!(
        err,
        FetchError::Server {
            status: 500,
            message: "db down".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_body_is_payload_error() {
    let server = TestServer::new().await;
    server.serve_raw(r#"{"items": []}"#);

    let source = HttpEventSource::new(server.base_url()).unwrap();
    let err = source.fetch_events().await.unwrap_err();
    assert_eq!(err.kind(), "payload");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpEventSource::from_config(&ClientConfig {
        base_url: format!("http://{addr}"),
        request_timeout_secs: Some(2),
        ..ClientConfig::default()
    })
    .unwrap();
    let err = source.fetch_events().await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn test_event_then_fetch() {
    let server = TestServer::new().await;
    let source = HttpEventSource::new(server.base_url()).unwrap();

    source
        .send_test_event(TestEventKind::PullRequest)
        .await
        .unwrap();
    let resp = source.fetch_events().await.unwrap();

    assert_eq!(resp.count, 1);
    assert_eq!(resp.events[0].kind, EventKind::PullRequest);
    assert!(resp.events[0].message.contains("pull request"));
}

#[tokio::test]
async fn clear_returns_server_message() {
    let server = TestServer::new().await;
    server.push_event("push", "a");
    server.push_event("push", "b");
    let source = HttpEventSource::new(server.base_url()).unwrap();

    let message = source.clear_events().await.unwrap();
    assert_eq!(message, "Cleared 2 events from memory");
    assert_eq!(source.fetch_events().await.unwrap().count, 0);
}

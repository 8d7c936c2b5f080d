//! Aggregator over HTTP against a real echo server and a wiremock upstream.

use std::sync::Arc;
use std::time::Duration;

use aggregator_service::{AggregatorState, EchoClient};
use record_store::MemoryStorage;
use relay_api::{NewRecord, Record, RecordStorage, StorageError, StorageFuture};
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Running {
    url: String,
    shutdown: CancellationToken,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn spawn_echo() -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    tokio::spawn(echo_service::run(listener, shutdown.clone()));
    Running { url: format!("http://{addr}/"), shutdown }
}

async fn spawn_aggregator(echo_url: &str, storage: Arc<dyn RecordStorage>) -> Running {
    let client = EchoClient::new(echo_url, Duration::from_secs(5)).unwrap();
    let state = AggregatorState::new(Arc::new(client), storage);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    tokio::spawn(aggregator_service::run(listener, state, shutdown.clone()));
    Running { url: format!("http://{addr}/"), shutdown }
}

async fn get_json(url: &str, delay: &str) -> (StatusCode, serde_json::Value) {
    let resp = reqwest::Client::new()
        .get(url)
        .query(&[("delay", delay)])
        .send()
        .await
        .unwrap();
    let status = resp.status();
    let body = resp.text().await.unwrap();
    (status, serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
}

#[tokio::test]
async fn stores_concatenated_upstream_bodies_with_fresh_ids() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("delay", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<w>"))
        .expect(4)
        .mount(&upstream)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let aggregator = spawn_aggregator(&upstream.uri(), storage.clone()).await;

    let (status, first) = get_json(&aggregator.url, "0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, serde_json::json!({ "id": 1, "text": "<w><w>" }));

    let (status, second) = get_json(&aggregator.url, "0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, serde_json::json!({ "id": 2, "text": "<w><w>" }));

    assert_eq!(storage.len().await, 2);
}

// Single-threaded runtime: both echo calls are answered by the test
// thread, so the two halves of the text are the same identity.
#[tokio::test(flavor = "current_thread")]
async fn text_is_two_echo_identities() {
    let echo = spawn_echo().await;
    let storage = Arc::new(MemoryStorage::new());
    let aggregator = spawn_aggregator(&echo.url, storage.clone()).await;

    let (status, body) = get_json(&aggregator.url, "20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);

    let text = body["text"].as_str().unwrap();
    let (a, b) = text.split_at(text.len() / 2);
    assert!(!a.is_empty());
    assert_eq!(a, b);
    assert!(a.contains("@ThreadId("), "{text}");
}

#[tokio::test]
async fn missing_delay_is_rejected_without_writes() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x"))
        .expect(0)
        .mount(&upstream)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let aggregator = spawn_aggregator(&upstream.uri(), storage.clone()).await;

    let resp = reqwest::get(&aggregator.url).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&aggregator.url, "soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn unreachable_echo_is_bad_gateway_without_writes() {
    // Занять порт и сразу освободить: на нём никто не слушает.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let storage = Arc::new(MemoryStorage::new());
    let aggregator = spawn_aggregator(&format!("http://{addr}/"), storage.clone()).await;

    let (status, body) = get_json(&aggregator.url, "0").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.as_str().unwrap().starts_with("error: upstream:"), "{body}");
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn upstream_error_status_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let aggregator = spawn_aggregator(&upstream.uri(), storage.clone()).await;

    let (status, _) = get_json(&aggregator.url, "5").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn empty_upstream_bodies_are_bad_gateway_without_writes() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(2)
        .mount(&upstream)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let aggregator = spawn_aggregator(&upstream.uri(), storage.clone()).await;

    let (status, body) = get_json(&aggregator.url, "0").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.as_str().unwrap().starts_with("error: upstream:"), "{body}");
    assert!(storage.is_empty().await);
}

/// Storage, у которого отказал диск.
struct FullDisk;

impl RecordStorage for FullDisk {
    fn init(&self) -> StorageFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
    fn save(&self, _record: NewRecord) -> StorageFuture<'_, Record> {
        Box::pin(async { Err(StorageError::io("write", std::io::Error::other("no space left"))) })
    }
    fn find(&self, _id: u64) -> StorageFuture<'_, Option<Record>> {
        Box::pin(async { Ok(None) })
    }
    fn flush(&self) -> StorageFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

#[tokio::test]
async fn storage_failure_is_internal_error_without_a_record() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("w"))
        .mount(&upstream)
        .await;

    let aggregator = spawn_aggregator(&upstream.uri(), Arc::new(FullDisk)).await;

    let (status, body) = get_json(&aggregator.url, "0").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("id").is_none(), "{body}");
    assert!(body.as_str().unwrap().starts_with("error: storage:"), "{body}");
}

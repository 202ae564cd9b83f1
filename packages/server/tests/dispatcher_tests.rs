//! Integration tests for the crawler's dispatch loop.
//!
//! Loop tests run on paused tokio time, so idle waits and publish timeouts
//! elapse instantly. The broker round-trip test drives the real QStash
//! adapter against a wiremock server.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use pipeline_core::domains::dispatch::{DispatchOutcome, Dispatcher, DispatcherConfig};
use pipeline_core::kernel::{PublishBehavior, QStashAdapter, TestPublisher, TestUrlSource};
use qstash_client::QStashClient;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::init_tracing;

// =============================================================================
// Test Helpers
// =============================================================================

struct RunningDispatcher {
    source: Arc<TestUrlSource>,
    publisher: Arc<TestPublisher>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningDispatcher {
    fn start(source: TestUrlSource, publisher: TestPublisher, config: DispatcherConfig) -> Self {
        init_tracing();
        let source = Arc::new(source);
        let publisher = Arc::new(publisher);
        let dispatcher = Dispatcher::new(source.clone(), publisher.clone(), config);
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            dispatcher
                .run(token)
                .await
                .expect("dispatcher exits cleanly");
        });

        Self {
            source,
            publisher,
            shutdown,
            handle,
        }
    }

    /// Cancel and wait for the loop; fails if it does not stop within a second.
    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), self.handle)
            .await
            .expect("dispatcher stops promptly after shutdown")
            .expect("dispatcher task did not panic");
    }
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

// =============================================================================
// Loop behaviour
// =============================================================================

#[tokio::test(start_paused = true)]
async fn single_url_is_published_with_delay() {
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(["https://example.com/a"]),
        TestPublisher::new(),
        DispatcherConfig::default(),
    );

    advance(Duration::from_millis(500)).await;

    let published = running.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].delay, Duration::from_secs(60));
    assert_eq!(published[0].message.url(), "https://example.com/a");

    let body = published[0].body.as_object().expect("body is a JSON object");
    let keys: HashSet<&str> = body.keys().map(String::as_str).collect();
    assert_eq!(keys, HashSet::from(["id", "url", "ts"]));
    assert_eq!(body["url"], "https://example.com/a");

    let id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    assert_eq!(id.get_version_num(), 4);
    assert!(DateTime::parse_from_rfc3339(body["ts"].as_str().unwrap()).is_ok());

    assert_eq!(running.source.remaining(), 0);
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn empty_source_polls_once_per_idle_interval() {
    let running = RunningDispatcher::start(
        TestUrlSource::new(),
        TestPublisher::new(),
        DispatcherConfig::default(),
    );

    advance(Duration::from_millis(5500)).await;

    // Polls at t = 0, 1, 2, 3, 4, 5
    assert_eq!(running.source.poll_count(), 6);
    assert_eq!(running.publisher.attempt_count(), 0);
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_publish_is_dropped_and_loop_continues() {
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(["https://example.com/a", "https://example.com/b"]),
        TestPublisher::new().with_script([PublishBehavior::Reject { status: 500 }]),
        DispatcherConfig::default(),
    );

    advance(Duration::from_millis(500)).await;

    assert_eq!(running.publisher.attempt_count(), 2);
    let published = running.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].message.url(), "https://example.com/b");
    assert_eq!(running.source.remaining(), 0);
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn network_error_is_dropped_and_loop_continues() {
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(["https://example.com/a", "https://example.com/b"]),
        TestPublisher::new().with_script([PublishBehavior::NetworkError]),
        DispatcherConfig::default(),
    );

    advance(Duration::from_millis(500)).await;

    let published = running.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].message.url(), "https://example.com/b");
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn hung_publish_times_out_and_loop_continues() {
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(["https://example.com/a", "https://example.com/b"]),
        TestPublisher::new().with_script([PublishBehavior::Hang]),
        DispatcherConfig::default(),
    );

    advance(Duration::from_secs(5)).await;
    assert_eq!(running.publisher.attempt_count(), 1);
    assert_eq!(running.publisher.publish_count(), 0);

    advance(Duration::from_secs(6)).await;
    let published = running.publisher.published();
    assert_eq!(running.publisher.attempt_count(), 2);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].message.url(), "https://example.com/b");
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn source_error_waits_then_recovers() {
    let source = TestUrlSource::new();
    source.push_error("connection reset");
    source.push("https://example.com/a");

    let running =
        RunningDispatcher::start(source, TestPublisher::new(), DispatcherConfig::default());

    advance(Duration::from_millis(500)).await;
    assert_eq!(running.publisher.publish_count(), 0);

    advance(Duration::from_secs(1)).await;
    assert_eq!(running.publisher.publish_count(), 1);
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn every_url_gets_a_distinct_job_id() {
    let urls: Vec<String> = (0..50).map(|i| format!("https://example.com/{}", i)).collect();
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(urls.clone()),
        TestPublisher::new(),
        DispatcherConfig::default(),
    );

    advance(Duration::from_millis(500)).await;

    let published = running.publisher.published();
    assert_eq!(published.len(), 50);

    let ids: HashSet<Uuid> = published.iter().map(|p| p.message.id().into_uuid()).collect();
    assert_eq!(ids.len(), 50);

    // FIFO order is preserved
    let seen: Vec<&str> = published.iter().map(|p| p.message.url()).collect();
    assert_eq!(seen, urls.iter().map(String::as_str).collect::<Vec<_>>());
    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn same_url_twice_is_published_twice() {
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(["https://example.com/a", "https://example.com/a"]),
        TestPublisher::new(),
        DispatcherConfig::default(),
    );

    advance(Duration::from_millis(500)).await;

    let published = running.publisher.published();
    assert_eq!(published.len(), 2);
    assert_ne!(published[0].message.id(), published[1].message.id());
    running.stop().await;
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_idle_wait() {
    let running = RunningDispatcher::start(
        TestUrlSource::new(),
        TestPublisher::new(),
        DispatcherConfig {
            idle_interval: Duration::from_secs(3600),
            ..DispatcherConfig::default()
        },
    );

    advance(Duration::from_millis(100)).await;
    assert_eq!(running.source.poll_count(), 1);

    running.stop().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_publish_and_drops_job() {
    let running = RunningDispatcher::start(
        TestUrlSource::with_urls(["https://example.com/a", "https://example.com/b"]),
        TestPublisher::new().with_script([PublishBehavior::Hang]),
        DispatcherConfig {
            publish_timeout: Duration::from_secs(3600),
            ..DispatcherConfig::default()
        },
    );

    advance(Duration::from_millis(100)).await;
    assert_eq!(running.publisher.attempt_count(), 1);

    let source = running.source.clone();
    let publisher = running.publisher.clone();
    running.stop().await;

    assert_eq!(publisher.publish_count(), 0);
    // The interrupted job is gone; the next one was never popped
    assert_eq!(source.remaining(), 1);
}

// =============================================================================
// Broker round-trip
// =============================================================================

#[tokio::test]
async fn poll_once_publishes_through_qstash() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/publish/orchestrator"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Upstash-Delay", "60"))
        .and(header("Content-Type", "application/json"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"messageId": "msg_1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = QStashClient::new(
        format!("{}/v2/publish/orchestrator", server.uri()),
        "test-token".into(),
    )
    .unwrap();
    let dispatcher = Dispatcher::new(
        Arc::new(TestUrlSource::with_urls(["https://example.com/a"])),
        Arc::new(QStashAdapter::new(Arc::new(client))),
        DispatcherConfig::default(),
    );

    let outcome = dispatcher.poll_once().await.unwrap();

    match outcome {
        DispatchOutcome::Published {
            url,
            broker_message_id,
            ..
        } => {
            assert_eq!(url, "https://example.com/a");
            assert_eq!(broker_message_id.as_deref(), Some("msg_1"));
        }
        other => panic!("expected Published, got {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["url"], "https://example.com/a");
    assert_eq!(body.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn poll_once_surfaces_broker_rejection() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = QStashClient::new(format!("{}/v2/publish", server.uri()), "t".into()).unwrap();
    let source = Arc::new(TestUrlSource::with_urls(["https://example.com/a"]));
    let dispatcher = Dispatcher::new(
        source.clone(),
        Arc::new(QStashAdapter::new(Arc::new(client))),
        DispatcherConfig::default(),
    );

    let err = dispatcher.poll_once().await.unwrap_err();

    assert!(matches!(
        err,
        pipeline_core::domains::dispatch::DispatchError::PublishRejected { status: 500 }
    ));
    assert_eq!(source.remaining(), 0);
}

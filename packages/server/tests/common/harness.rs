//! Test harness for integration testing.
//!
//! The HTTP harness runs the real router against in-memory test doubles.
//! The Redis harness shares one container across all tests that need it;
//! those tests are `#[ignore]`d because they need Docker.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pipeline_core::domains::ingestion::testing::TEST_PUBLIC_KEY_PEM;
use pipeline_core::domains::ingestion::SigningKey;
use pipeline_core::kernel::{TestContentStore, TestDependencies};
use pipeline_core::server::build_app;
use qstash_client::SIGNATURE_HEADER;
use serde_json::Value;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;
use tower::ServiceExt;

/// Initialize tracing once per test binary.
///
/// Run tests with: RUST_LOG=debug cargo test -- --nocapture
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Status and parsed JSON body of a response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Orchestrator router wired to in-memory dependencies.
pub struct TestHarness {
    pub deps: TestDependencies,
    pub app: Router,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // In-memory doubles are dropped with the harness
    }
}

impl TestHarness {
    /// Harness configured with the test broker's public key.
    pub fn new() -> Self {
        let key = SigningKey::from_config(TEST_PUBLIC_KEY_PEM)
            .expect("test public key is valid");
        Self::with_deps(TestDependencies::new().with_signing_key(key))
    }

    /// Harness with no signing key configured.
    pub fn without_signing_key() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    /// Harness whose content store rejects every write.
    pub fn with_failing_store() -> Self {
        let key = SigningKey::from_config(TEST_PUBLIC_KEY_PEM)
            .expect("test public key is valid");
        Self::with_deps(
            TestDependencies::new()
                .with_signing_key(key)
                .with_content_store(TestContentStore::failing()),
        )
    }

    pub fn with_deps(deps: TestDependencies) -> Self {
        init_tracing();
        let app = build_app(Arc::new(deps.server_deps()));
        Self { deps, app }
    }

    pub fn store(&self) -> &TestContentStore {
        &self.deps.content_store
    }

    /// POST a delivery to the webhook, optionally signed.
    pub async fn post_webhook(&self, body: impl Into<Body>, signature: Option<&str>) -> TestResponse {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/qstash")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let request = request.body(body.into()).expect("valid request");
        self.send(request).await
    }

    pub async fn get_health(&self) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .expect("valid request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared Redis container, started on first use and kept for the whole run.
struct SharedRedis {
    url: String,
    _container: ContainerAsync<Redis>,
}

static SHARED_REDIS: OnceCell<SharedRedis> = OnceCell::const_new();

impl SharedRedis {
    async fn init() -> Result<Self> {
        let container = Redis::default()
            .start()
            .await
            .context("Failed to start Redis container")?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(6379).await?;

        Ok(Self {
            url: format!("redis://{}:{}", host, port),
            _container: container,
        })
    }
}

/// URL of the shared Redis container.
pub async fn redis_url() -> &'static str {
    init_tracing();
    let shared = SHARED_REDIS
        .get_or_init(|| async {
            SharedRedis::init()
                .await
                .expect("Failed to initialize shared Redis container")
        })
        .await;
    &shared.url
}

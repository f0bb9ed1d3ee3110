//! Test helpers for integration tests
//!
//! Provides an in-memory client, mock HTTP servers, and environment checks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use futures::StreamExt;
use parking_lot::Mutex;
use roomchat_client::http::{ImageSearchClient, PushClient};
use roomchat_client::services::ServiceContextBuilder;
use roomchat_client::ServiceContext;
use roomchat_common::{try_init_tracing_with_config, AppConfig, JwtService, TracingConfig};
use roomchat_core::traits::ChangeStream;
use roomchat_core::ChangeEvent;
use roomchat_db::MemoryBackend;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Quiet tracing for tests; repeated calls are fine
pub fn init_test_tracing() {
    let _ = try_init_tracing_with_config(TracingConfig::test());
}

/// Fresh in-memory backend
pub fn memory_backend() -> MemoryBackend {
    MemoryBackend::new(JwtService::new(TEST_JWT_SECRET, 3600, 86_400))
}

/// Client context over an in-memory backend, keeping a handle for seeding
pub struct TestClient {
    pub ctx: ServiceContext,
    pub backend: MemoryBackend,
}

impl TestClient {
    pub fn new() -> Result<Self> {
        Self::build(memory_backend(), |b| b)
    }

    /// Customize the builder after the backend is attached
    pub fn build(
        backend: MemoryBackend,
        configure: impl FnOnce(ServiceContextBuilder) -> ServiceContextBuilder,
    ) -> Result<Self> {
        init_test_tracing();
        let builder = ServiceContext::builder().backend(backend.clone());
        let ctx = configure(builder)
            .build()
            .map_err(|e| anyhow::anyhow!("context: {e}"))?;
        Ok(Self { ctx, backend })
    }

    /// Second client sharing this backend, with its own session
    pub fn sibling(&self) -> Result<Self> {
        Self::build(self.backend.clone(), |b| b)
    }
}

/// Mock HTTP server instance that manages lifecycle
pub struct MockServer {
    pub addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl MockServer {
    /// Serve `router` on an ephemeral port
    pub async fn start(router: Router) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

/// Bodies received by a mock push relay
pub type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

/// Push relay that records every body and answers with `status`
pub async fn mock_push_relay(status: u16) -> Result<(MockServer, PushClient, Captured)> {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Json;

    let captured: Captured = Arc::default();
    let code = StatusCode::from_u16(status)?;

    let router = Router::new()
        .route(
            "/push/send",
            post(
                move |State(store): State<Captured>, Json(body): Json<serde_json::Value>| async move {
                    store.lock().push(body);
                    (code, Json(serde_json::json!({ "data": { "status": "ok" } })))
                },
            ),
        )
        .with_state(captured.clone());

    let server = MockServer::start(router).await?;
    let client = PushClient::new(server.url("/push/send"), 5)?;
    Ok((server, client, captured))
}

/// Image search API answering every query with `status` and `body`
pub async fn mock_image_search(
    status: u16,
    body: serde_json::Value,
) -> Result<(MockServer, ImageSearchClient)> {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Json;

    let code = StatusCode::from_u16(status)?;
    let router = Router::new().route(
        "/search/photos",
        get(move || {
            let body = body.clone();
            async move { (code, Json(body)) }
        }),
    );

    let server = MockServer::start(router).await?;
    let client = ImageSearchClient::new(server.url("/search/photos"), Some("test-key".to_string()), 5)?;
    Ok((server, client))
}

/// Next event on a change stream, or `None` after `wait`
pub async fn next_event(stream: &mut ChangeStream, wait: Duration) -> Option<ChangeEvent> {
    tokio::time::timeout(wait, stream.next()).await.ok().flatten()
}

/// Create a test configuration
pub fn test_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Helper to check if Postgres and Redis are available
pub fn check_test_env() -> bool {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    if std::env::var("REDIS_URL").is_err() {
        eprintln!("Skipping test: REDIS_URL not set");
        return false;
    }

    true
}

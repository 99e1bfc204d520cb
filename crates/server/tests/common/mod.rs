//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture wires the real router to mock Gemini and Shortcut services
//! and a temporary SQLite audit database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ticketsmith_core::{
    AuditFilter, AuditRecorder, AuditStore, Config, RequiredSetting, SqliteAuditStore,
    StoryTarget, StructuredGenerator, TicketCreator, TicketPipeline, TicketingService,
    testing::{MockLlmClient, MockTicketingService},
};
use ticketsmith_server::{api::create_router, metrics, state::AppState};

/// Re-export fixtures for test convenience
pub use ticketsmith_core::testing::fixtures;

/// Test fixture with controllable mocks.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ticket_creation() {
///     let fixture = TestFixture::new();
///     fixture.llm.push_text(fixtures::document_json("Add logout button")).await;
///
///     let response = fixture.post("/api/ai-ticket", json!({
///         "prompt": "Add a logout button",
///         "userId": 1
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock Gemini client - queue generated documents or failures
    pub llm: Arc<MockLlmClient>,
    /// Mock Shortcut service - created stories, listings, failures
    pub shortcut: Arc<MockTicketingService>,
    /// Audit store backing the pipeline
    pub store: Arc<SqliteAuditStore>,
    /// Temporary directory for the audit database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with every required setting present. Shortcut ids start at 42.
    pub fn new() -> Self {
        Self::with_config(fixtures::complete_config())
    }

    /// Fixture missing the given required settings.
    pub fn without(missing: &[RequiredSetting]) -> Self {
        let mut config = fixtures::complete_config();
        for setting in missing {
            match setting {
                RequiredSetting::GeminiApiKey => config.gemini.api_key = None,
                RequiredSetting::ShortcutApiKey => config.shortcut.api_key = None,
                RequiredSetting::DatabaseUrl => config.database.url = None,
            }
        }
        Self::with_config(config)
    }

    /// Build the app the way the binary does: the pipeline only when every
    /// required setting is present, the Shortcut client when its key is.
    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("audit.db");
        if config.database.url.is_some() {
            config.database.url = Some(format!("sqlite://{}", db_path.display()));
        }

        let llm = Arc::new(MockLlmClient::new());
        let shortcut = Arc::new(MockTicketingService::with_next_id(42));
        let store = Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));

        let config = Arc::new(config);

        let pipeline = config.missing_required().is_empty().then(|| {
            Arc::new(
                TicketPipeline::new(
                    Arc::clone(&config),
                    StructuredGenerator::new(llm.clone()),
                    TicketCreator::new(shortcut.clone(), StoryTarget::from(&config.shortcut)),
                    AuditRecorder::new(store.clone()),
                )
                .with_stage_observer(metrics::stage_observer()),
            )
        });

        let ticketing = config
            .is_present(RequiredSetting::ShortcutApiKey)
            .then(|| shortcut.clone() as Arc<dyn TicketingService>);

        let state = Arc::new(AppState::new(config, pipeline, ticketing));
        let router = create_router(state);

        Self {
            router,
            llm,
            shortcut,
            store,
            temp_dir,
        }
    }

    /// Number of audit rows written so far.
    pub fn audit_rows(&self) -> i64 {
        self.store
            .count(&AuditFilter::new())
            .expect("Failed to count audit rows")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let body = serde_json::to_string(&body).expect("Failed to encode body");
        self.request("POST", path, Some((body, "application/json"))).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some((body.to_string(), "application/json")))
            .await
    }

    /// Send a POST request with custom content type.
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        self.request("POST", path, Some((body.to_string(), content_type)))
            .await
    }

    /// GET returning the raw text body, for non-JSON endpoints.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<(String, &str)>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some((body, content_type)) => {
                request_builder = request_builder.header("Content-Type", content_type);
                Body::from(body)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert response status with helpful error message.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}

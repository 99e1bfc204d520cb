//! End-to-end tests with the real Gemini and Shortcut clients pointed at
//! local stub servers, and the real server driven by `TicketClient`.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;

use ticketsmith_core::{
    testing::fixtures, AuditFilter, AuditRecorder, AuditStore, ClientState, Config, GeminiClient,
    ShortcutClient, SqliteAuditStore, StoryTarget, StructuredGenerator, TicketClient,
    TicketCreator, TicketPipeline, TicketingService,
};
use ticketsmith_server::{api::create_router, metrics, state::AppState};

const GEMINI_KEY: &str = "stub-gemini-key";
const SHORTCUT_TOKEN: &str = "stub-shortcut-token";

#[derive(Clone)]
struct Stub {
    gemini_requests: Arc<Mutex<Vec<(String, Value)>>>,
    gemini_reply: Arc<Mutex<(StatusCode, Value)>>,
    stories: Arc<Mutex<Vec<Value>>>,
    story_reply: Arc<Mutex<(StatusCode, Value)>>,
}

impl Stub {
    fn new() -> Self {
        Self {
            gemini_requests: Arc::default(),
            gemini_reply: Arc::new(Mutex::new((
                StatusCode::OK,
                gemini_text(&fixtures::document_json("Add logout button")),
            ))),
            stories: Arc::default(),
            story_reply: Arc::new(Mutex::new((
                StatusCode::CREATED,
                json!({"id": 42, "app_url": "https://app.shortcut.com/acme/story/42"}),
            ))),
        }
    }

    fn reply_gemini(&self, status: StatusCode, body: Value) {
        *self.gemini_reply.lock().unwrap() = (status, body);
    }

    fn reply_story(&self, status: StatusCode, body: Value) {
        *self.story_reply.lock().unwrap() = (status, body);
    }
}

fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
        "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 80},
        "modelVersion": "gemini-test"
    })
}

async fn gemini_handler(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(GEMINI_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "message": "API key not valid"}})),
        );
    }
    stub.gemini_requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), body));
    let (status, reply) = stub.gemini_reply.lock().unwrap().clone();
    (status, Json(reply))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("Shortcut-Token").and_then(|v| v.to_str().ok()) == Some(SHORTCUT_TOKEN)
}

async fn create_story(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
    }
    let (status, reply) = stub.story_reply.lock().unwrap().clone();
    if status.is_success() {
        stub.stories.lock().unwrap().push(body);
    }
    (status, Json(reply))
}

async fn list_projects(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {"id": 1, "name": "Web", "description": "Customer web app", "archived": false}
        ])),
    )
}

async fn list_workflows(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"})));
    }
    (
        StatusCode::OK,
        Json(json!([{
            "id": 500000005,
            "name": "Engineering",
            "description": "",
            "states": [
                {"id": 500000006, "name": "Backlog", "description": "", "type": "unstarted", "position": 1},
                {"id": 500000010, "name": "Done", "description": "", "type": "done", "position": 5}
            ]
        }])),
    )
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

struct Harness {
    stub: Stub,
    app_url: String,
    store: Arc<SqliteAuditStore>,
    _temp_dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let stub = Stub::new();

        let gemini_url = serve(
            Router::new()
                .fallback(gemini_handler)
                .with_state(stub.clone()),
        )
        .await;
        let shortcut_url = serve(
            Router::new()
                .route("/api/v3/stories", post(create_story))
                .route("/api/v3/projects", get(list_projects))
                .route("/api/v3/workflows", get(list_workflows))
                .with_state(stub.clone()),
        )
        .await;

        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("audit.db");

        let mut config = Config::default();
        config.gemini.api_key = Some(GEMINI_KEY.to_string());
        config.gemini.model = "gemini-test".to_string();
        config.gemini.api_base = Some(gemini_url);
        config.shortcut.api_key = Some(SHORTCUT_TOKEN.to_string());
        config.shortcut.api_base = Some(format!("{}/api/v3", shortcut_url));
        config.database.url = Some(db_path.display().to_string());
        let config = Arc::new(config);

        let store = Arc::new(SqliteAuditStore::new(&db_path).unwrap());
        let shortcut: Arc<dyn TicketingService> =
            Arc::new(ShortcutClient::from_config(&config.shortcut).unwrap());
        let pipeline = TicketPipeline::new(
            Arc::clone(&config),
            StructuredGenerator::new(Arc::new(GeminiClient::from_config(&config.gemini).unwrap())),
            TicketCreator::new(shortcut.clone(), StoryTarget::from(&config.shortcut)),
            AuditRecorder::new(store.clone()),
        )
        .with_stage_observer(metrics::stage_observer());

        let state = Arc::new(AppState::new(
            config,
            Some(Arc::new(pipeline)),
            Some(shortcut),
        ));
        let app_url = serve(create_router(state)).await;

        Self {
            stub,
            app_url,
            store,
            _temp_dir: temp_dir,
        }
    }
}

#[tokio::test]
async fn test_ticket_client_round_trip() {
    let harness = Harness::start().await;
    let mut client = TicketClient::new(&harness.app_url).unwrap();

    let state = client
        .submit("Add a logout button to the navbar", 1)
        .await
        .unwrap()
        .clone();

    assert_eq!(
        state,
        ClientState::Success {
            story_id: 42,
            message: "AI ticket created successfully.".to_string()
        }
    );

    let gemini_requests = harness.stub.gemini_requests.lock().unwrap().clone();
    assert_eq!(gemini_requests.len(), 1);
    let (path, body) = &gemini_requests[0];
    assert_eq!(path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    assert!(body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Add a logout button to the navbar"));

    let stories = harness.stub.stories.lock().unwrap().clone();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["name"], "Add logout button");
    assert_eq!(stories[0]["project_id"], 1);
    assert!(stories[0].get("workflow_state_id").is_none());
    assert!(stories[0]["description"]
        .as_str()
        .unwrap()
        .contains("**Testing Requirements:**"));

    let rows = harness.store.query(&AuditFilter::new()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].shortcut_story_id, 42);
    assert_eq!(rows[0].raw_prompt, "Add a logout button to the navbar");
}

#[tokio::test]
async fn test_ticket_client_sees_shortcut_error() {
    let harness = Harness::start().await;
    harness
        .stub
        .reply_story(StatusCode::BAD_REQUEST, json!({"message": "Invalid project_id"}));
    let mut client = TicketClient::new(&harness.app_url).unwrap();

    let state = client.submit("Fix login", 1).await.unwrap();

    assert_eq!(
        state,
        &ClientState::Failed {
            message: "Shortcut API error: Invalid project_id".to_string()
        }
    );
    assert_eq!(harness.store.count(&AuditFilter::new()).unwrap(), 0);
}

#[tokio::test]
async fn test_ticket_client_sees_generation_error() {
    let harness = Harness::start().await;
    harness.stub.reply_gemini(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({"error": {"code": 503, "message": "The model is overloaded."}}),
    );
    let mut client = TicketClient::new(&harness.app_url).unwrap();

    let state = client.submit("Fix login", 1).await.unwrap();

    assert_eq!(
        state.message(),
        Some("Failed to generate a structured ticket from the prompt.")
    );
    assert!(harness.stub.stories.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ticket_client_sees_validation_error() {
    let harness = Harness::start().await;
    let mut client = TicketClient::new(&harness.app_url).unwrap();

    let state = client.submit("   ", 1).await.unwrap();

    assert_eq!(state.message(), Some("Invalid or missing prompt or userId."));
    assert!(harness.stub.gemini_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_ticket_client_unreachable_server() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut client = TicketClient::new(url).unwrap();
    let state = client.submit("Fix login", 1).await.unwrap();

    assert_eq!(state.label(), "failed");
    assert!(state.message().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_shortcut_info_through_real_client() {
    let harness = Harness::start().await;

    let body: Value = reqwest::get(format!("{}/api/shortcut-info", harness.app_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["projects"][0]["name"], "Web");
    assert_eq!(body["projects"][0]["description"], "Customer web app");
    assert_eq!(body["workflows"][0]["id"], 500000005);
    assert_eq!(body["workflowStates"].as_array().unwrap().len(), 2);
    assert_eq!(body["workflowStates"][1]["type"], "done");
}

//! Router tests for the study assistant API.
//!
//! The model transport is replaced by a counting mock, so these run without
//! network access or credentials:
//!   cargo test -p api --test router_tests

use api_lib::{
    config::Config,
    web::{router, AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use study_buddy_core::{
    views::{CHAT_FALLBACK_REPLY, FALLBACK_PLAN, SUMMARIZE_FAILURE_MESSAGE},
    ApiKey, GenerationRequest, GenerativeModelService, PortError, PortResult, StudyGateway,
    DEFAULT_MODEL,
};
use tokio::sync::Notify;
use tower::ServiceExt;

const SUMMARY_JSON: &str = r#"{"title":"Photosynthesis","mainPoints":["Plants convert light into chemical energy","Chlorophyll absorbs light"],"simplifiedExplanation":"Plants make food from sunlight.","flashcards":[{"question":"What absorbs light?","answer":"Chlorophyll"}]}"#;

/// Records every request and answers with a fixed reply.
struct MockModel {
    reply: Result<String, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockModel {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("connection refused".to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl GenerativeModelService for MockModel {
    async fn generate(&self, _api_key: &ApiKey, request: GenerationRequest) -> PortResult<String> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().map_err(PortError::Transport)
    }
}

/// Holds its first call until `release`; later calls answer at once.
struct GatedModel {
    reply: String,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedModel {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: text.to_string(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeModelService for GatedModel {
    async fn generate(&self, _api_key: &ApiKey, _request: GenerationRequest) -> PortResult<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.gate.notified().await;
        }
        Ok(self.reply.clone())
    }
}

fn test_config() -> Arc<Config> {
    Arc::new(Config::from_lookup(|_| None).unwrap())
}

fn app_with(model: Arc<dyn GenerativeModelService>, api_key: Option<ApiKey>) -> Router {
    let gateway = StudyGateway::new(model, api_key, DEFAULT_MODEL);
    router(Arc::new(AppState::new(test_config(), gateway)))
}

fn app(model: Arc<dyn GenerativeModelService>) -> Router {
    app_with(model, ApiKey::new("test-key"))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn upload(app: &Router, file_name: &str, contents: &str) -> (StatusCode, Value) {
    let boundary = "study-buddy-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{contents}\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/summarizer/upload")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn wait_for_calls(model: &GatedModel, expected: usize) {
    for _ in 0..400 {
        if model.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("model saw {} calls, expected {}", model.calls(), expected);
}

async fn wait_until_settled(app: &Router, uri: &str) -> Value {
    for _ in 0..400 {
        let (_, state) = send(app, Method::GET, uri, None).await;
        if state["status"]["state"] == "settled" {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("{} never settled", uri);
}

/// Starts a request, waits until it reaches the model, then drops it the way
/// a disconnecting client would.
async fn abandon_request(app: &Router, model: &GatedModel, method: Method, uri: &'static str, body: Option<Value>) {
    let pending = tokio::spawn({
        let app = app.clone();
        async move { send(&app, method, uri, body).await }
    });
    wait_for_calls(model, 1).await;
    pending.abort();
    let _ = pending.await;
}

// ============================================================================
// Summarizer
// ============================================================================

#[tokio::test]
async fn uploaded_notes_are_summarized_once_and_rendered_unmodified() {
    let model = MockModel::replying(SUMMARY_JSON);
    let app = app(model.clone());

    let (status, state) = upload(&app, "notes.txt", "Photosynthesis converts light to energy.").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["notes"], "Photosynthesis converts light to energy.");
    assert_eq!(model.calls(), 0);

    let (status, state) = send(&app, Method::POST, "/summarizer/summarize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(model.calls(), 1);
    assert!(model.prompts()[0].ends_with("Notes: Photosynthesis converts light to energy."));

    let expected: Value = serde_json::from_str(SUMMARY_JSON).unwrap();
    assert_eq!(state["summary"], expected);
    assert_eq!(state["failure"], Value::Null);
    assert_eq!(state["status"], json!({"state": "settled", "succeeded": true}));
}

#[tokio::test]
async fn unparseable_summary_surfaces_failure_message() {
    let model = MockModel::replying("{}");
    let app = app(model.clone());
    send(&app, Method::PUT, "/summarizer/notes", Some(json!({"notes": "Cells divide."}))).await;

    let (status, state) = send(&app, Method::POST, "/summarizer/summarize", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(state["failure"], SUMMARIZE_FAILURE_MESSAGE);
    assert_eq!(state["summary"], Value::Null);
}

#[tokio::test]
async fn blank_notes_are_rejected_without_a_call() {
    let model = MockModel::replying(SUMMARY_JSON);
    let app = app(model.clone());

    let (status, _) = send(&app, Method::POST, "/summarizer/summarize", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn non_text_upload_is_rejected() {
    let app = app(MockModel::replying(SUMMARY_JSON));
    let (status, _) = upload(&app, "diagram.png", "not really a png").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn summarizer_settles_after_client_goes_away() {
    let model = GatedModel::replying(SUMMARY_JSON);
    let app = app(model.clone());
    send(&app, Method::PUT, "/summarizer/notes", Some(json!({"notes": "Photosynthesis."}))).await;

    abandon_request(&app, &model, Method::POST, "/summarizer/summarize", None).await;
    model.release();

    let state = wait_until_settled(&app, "/summarizer").await;
    assert_eq!(state["summary"]["title"], "Photosynthesis");

    let (status, _) = send(&app, Method::POST, "/summarizer/summarize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(model.calls(), 2);
}

// ============================================================================
// Missing credential
// ============================================================================

#[tokio::test]
async fn missing_credential_is_contained_by_every_view() {
    let model = MockModel::replying(SUMMARY_JSON);
    let app = app_with(model.clone(), None);

    let (status, chat) = send(&app, Method::POST, "/chat/messages", Some(json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["messages"][1]["content"], CHAT_FALLBACK_REPLY);

    let (status, dashboard) = send(&app, Method::POST, "/dashboard/plan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["plan"], FALLBACK_PLAN);

    send(&app, Method::PUT, "/summarizer/notes", Some(json!({"notes": "Cells divide."}))).await;
    let (status, summarizer) = send(&app, Method::POST, "/summarizer/summarize", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(summarizer["failure"], SUMMARIZE_FAILURE_MESSAGE);

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["credentialConfigured"], false);

    assert_eq!(model.calls(), 0);
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn chat_round_trip_appends_reply_and_passes_history() {
    let model = MockModel::replying("Think of it as a slope.");
    let app = app(model.clone());

    send(&app, Method::PUT, "/chat/simple-mode", Some(json!({"enabled": true}))).await;
    let (status, chat) = send(
        &app,
        Method::POST,
        "/chat/messages",
        Some(json!({"message": "What is a derivative?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["simpleMode"], true);
    assert_eq!(chat["messages"][0]["role"], "user");
    assert_eq!(chat["messages"][1]["role"], "assistant");
    assert_eq!(chat["messages"][1]["content"], "Think of it as a slope.");

    send(&app, Method::POST, "/chat/messages", Some(json!({"message": "Example?"}))).await;
    let second = model.requests.lock().unwrap()[1].clone();
    assert_eq!(second.history.len(), 2);
    assert_eq!(second.prompt, "Example?");
}

#[tokio::test]
async fn transport_failure_becomes_apology() {
    let model = MockModel::failing();
    let app = app(model.clone());

    let (status, chat) = send(&app, Method::POST, "/chat/messages", Some(json!({"message": "hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["messages"][1]["content"], CHAT_FALLBACK_REPLY);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn second_message_while_reply_pending_is_rejected() {
    let model = GatedModel::replying("Light reactions happen in the thylakoid.");
    let app = app(model.clone());

    let first = tokio::spawn({
        let app = app.clone();
        async move {
            send(&app, Method::POST, "/chat/messages", Some(json!({"message": "Where?"}))).await
        }
    });
    wait_for_calls(&model, 1).await;

    let (status, _) = send(&app, Method::POST, "/chat/messages", Some(json!({"message": "Hello?"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    model.release();
    let (status, chat) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn chat_settles_after_client_goes_away() {
    let model = GatedModel::replying("Mitochondria make ATP.");
    let app = app(model.clone());

    abandon_request(
        &app,
        &model,
        Method::POST,
        "/chat/messages",
        Some(json!({"message": "What do mitochondria do?"})),
    )
    .await;
    model.release();

    let chat = wait_until_settled(&app, "/chat").await;
    assert_eq!(chat["messages"][1]["content"], "Mitochondria make ATP.");

    let (status, chat) = send(&app, Method::POST, "/chat/messages", Some(json!({"message": "And ribosomes?"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn blank_chat_message_is_rejected() {
    let model = MockModel::replying("unused");
    let app = app(model.clone());
    let (status, _) = send(&app, Method::POST, "/chat/messages", Some(json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
}

// ============================================================================
// Dashboard, revision and navigation
// ============================================================================

#[tokio::test]
async fn regenerated_plan_uses_default_topics() {
    let model = MockModel::replying("1. Review the chain rule.");
    let app = app(model.clone());

    let (status, dashboard) = send(&app, Method::POST, "/dashboard/plan", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["plan"], "1. Review the chain rule.");
    assert!(model.prompts()[0]
        .contains("Calculus, Organic Chemistry, Literature Summary"));
}

#[tokio::test]
async fn first_dashboard_visit_generates_plan_in_background() {
    let model = MockModel::replying("1. Derivatives\n2. Alkenes");
    let app = app(model.clone());

    let (status, first) = send(&app, Method::GET, "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"]["state"], "inFlight");
    assert_eq!(first["topics"].as_array().unwrap().len(), 3);

    let dashboard = wait_until_settled(&app, "/dashboard").await;
    assert_eq!(dashboard["plan"], "1. Derivatives\n2. Alkenes");
    assert_eq!(dashboard["status"], json!({"state": "settled", "succeeded": true}));

    send(&app, Method::GET, "/dashboard", None).await;
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn plan_settles_after_client_goes_away() {
    let model = GatedModel::replying("Review integrals.");
    let app = app(model.clone());

    abandon_request(&app, &model, Method::POST, "/dashboard/plan", None).await;
    model.release();

    let dashboard = wait_until_settled(&app, "/dashboard").await;
    assert_eq!(dashboard["plan"], "Review integrals.");

    let (status, _) = send(&app, Method::POST, "/dashboard/plan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn health_reports_the_gateway_model() {
    let gateway = StudyGateway::new(
        MockModel::replying("unused"),
        ApiKey::new("test-key"),
        "gemini-2.5-pro",
    );
    let app = router(Arc::new(AppState::new(test_config(), gateway)));

    let (_, health) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(health["model"], "gemini-2.5-pro");
    assert_eq!(health["credentialConfigured"], true);
}

#[tokio::test]
async fn reminders_add_toggle_and_report_progress() {
    let app = app(MockModel::replying("unused"));

    let (_, initial) = send(&app, Method::GET, "/reminders", None).await;
    assert_eq!(initial["reminders"].as_array().unwrap().len(), 3);
    assert_eq!(initial["completionPercent"], 33);

    let (_, unchanged) = send(&app, Method::POST, "/reminders", Some(json!({"topic": "   "}))).await;
    assert_eq!(unchanged["reminders"].as_array().unwrap().len(), 3);

    let (_, added) = send(&app, Method::POST, "/reminders", Some(json!({"topic": "Thermodynamics"}))).await;
    assert_eq!(added["reminders"][0]["topic"], "Thermodynamics");
    assert_eq!(added["reminders"][0]["priority"], "medium");
    assert_eq!(added["completionPercent"], 25);

    let id = added["reminders"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/reminders/{id}/toggle");
    let (_, toggled) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(toggled["reminders"][0]["completed"], true);
    assert_eq!(toggled["completionPercent"], 50);

    let (_, restored) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(restored["reminders"][0]["completed"], false);
    assert_eq!(restored["completionPercent"], 25);
}

#[tokio::test]
async fn toggling_unknown_reminder_is_not_found() {
    let app = app(MockModel::replying("unused"));
    let uri = format!("/reminders/{}/toggle", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn navigation_switches_active_view() {
    let app = app(MockModel::replying("unused"));

    let (_, view) = send(&app, Method::GET, "/view", None).await;
    assert_eq!(view["view"], "dashboard");

    let (status, view) = send(&app, Method::PUT, "/view", Some(json!({"view": "summarizer"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["view"], "summarizer");
}

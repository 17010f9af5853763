//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. Every handler acts on exactly one
//! view's state.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::{
    domain::{Reminder, View},
    views::{
        ChatDispatch, ChatView, DashboardView, PlanDispatch, RevisionView, SummarizeDispatch,
        SummarizerView, ViewError,
    },
};
use tokio::task::JoinError;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

type HandlerError = (StatusCode, String);

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        get_view_handler,
        set_view_handler,
        get_dashboard_handler,
        regenerate_plan_handler,
        get_chat_handler,
        send_message_handler,
        set_simple_mode_handler,
        get_summarizer_handler,
        set_notes_handler,
        upload_notes_handler,
        summarize_handler,
        list_reminders_handler,
        add_reminder_handler,
        toggle_reminder_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ActiveViewPayload,
            SendMessageRequest,
            SimpleModeRequest,
            NotesRequest,
            AddReminderRequest,
            RevisionResponse,
            DashboardState,
            ChatState,
            SummarizerState,
        )
    ),
    tags(
        (name = "Study Buddy API", description = "View actions for the study assistant.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    model: String,
    credential_configured: bool,
}

/// The currently selected view: `dashboard`, `chat`, `summarizer` or `reminders`.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ActiveViewPayload {
    #[schema(value_type = String, example = "dashboard")]
    pub view: View,
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SimpleModeRequest {
    pub enabled: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddReminderRequest {
    pub topic: String,
}

/// The reminder list together with the progress figures shown beside it.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevisionResponse {
    #[schema(value_type = Vec<Object>)]
    pub reminders: Vec<Reminder>,
    pub active_count: usize,
    pub completed_count: usize,
    pub completion_percent: u32,
}

/// Snapshot of the dashboard view.
#[derive(Serialize, ToSchema)]
#[schema(value_type = Object)]
pub struct DashboardState(DashboardView);

/// Snapshot of the chat view.
#[derive(Serialize, ToSchema)]
#[schema(value_type = Object)]
pub struct ChatState(ChatView);

/// Snapshot of the summarizer view.
#[derive(Serialize, ToSchema)]
#[schema(value_type = Object)]
pub struct SummarizerState(SummarizerView);

fn reject(e: ViewError) -> HandlerError {
    let status = match e {
        ViewError::Busy => StatusCode::CONFLICT,
        ViewError::EmptyInput => StatusCode::BAD_REQUEST,
        ViewError::UnsupportedFile(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ViewError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    (status, e.to_string())
}

//=========================================================================================
// Health & Navigation
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.gateway.model().to_string(),
        credential_configured: state.gateway.has_credential(),
    })
}

#[utoipa::path(
    get,
    path = "/view",
    responses((status = 200, description = "The active view", body = ActiveViewPayload))
)]
pub async fn get_view_handler(State(state): State<Arc<AppState>>) -> Json<ActiveViewPayload> {
    let shell = state.shell.lock().await;
    Json(ActiveViewPayload {
        view: shell.active_view(),
    })
}

#[utoipa::path(
    put,
    path = "/view",
    request_body = ActiveViewPayload,
    responses((status = 200, description = "View switched", body = ActiveViewPayload))
)]
pub async fn set_view_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActiveViewPayload>,
) -> Json<ActiveViewPayload> {
    let mut shell = state.shell.lock().await;
    shell.navigate(payload.view);
    info!(view = ?payload.view, "Switched view");
    Json(ActiveViewPayload {
        view: shell.active_view(),
    })
}

// Gateway calls and their settle run in a spawned task: a client that hangs
// up must not leave the view in flight.
fn task_failed(e: JoinError) -> HandlerError {
    error!("Model task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "The model request was aborted".to_string(),
    )
}

//=========================================================================================
// Dashboard
//=========================================================================================

async fn run_daily_plan(state: Arc<AppState>, dispatch: PlanDispatch) -> DashboardView {
    let result = state.gateway.daily_plan(&dispatch.topics).await;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.settle(dispatch.ticket, result);
    dashboard.clone()
}

/// Show the dashboard. The first call starts plan generation in the background;
/// poll until `status` is settled.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard state", body = DashboardState))
)]
pub async fn get_dashboard_handler(State(state): State<Arc<AppState>>) -> Json<DashboardState> {
    let mut dashboard = state.dashboard.lock().await;
    if let Some(dispatch) = dashboard.mount() {
        info!("Dashboard mounted, requesting daily plan");
        tokio::spawn(run_daily_plan(state.clone(), dispatch));
    }
    Json(DashboardState(dashboard.clone()))
}

#[utoipa::path(
    post,
    path = "/dashboard/plan",
    responses(
        (status = 200, description = "Plan regenerated (or replaced by the fallback)", body = DashboardState),
        (status = 409, description = "A plan request is already in flight")
    )
)]
pub async fn regenerate_plan_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardState>, HandlerError> {
    let dispatch = state.dashboard.lock().await.regenerate().map_err(reject)?;
    let dashboard = tokio::spawn(run_daily_plan(state.clone(), dispatch))
        .await
        .map_err(task_failed)?;
    Ok(Json(DashboardState(dashboard)))
}

//=========================================================================================
// Chat
//=========================================================================================

async fn run_chat(state: Arc<AppState>, dispatch: ChatDispatch) -> ChatView {
    let result = state
        .gateway
        .chat(&dispatch.message, &dispatch.history, dispatch.simple_mode)
        .await;
    let mut chat = state.chat.lock().await;
    chat.settle(dispatch.ticket, result);
    chat.clone()
}

#[utoipa::path(
    get,
    path = "/chat",
    responses((status = 200, description = "Chat state", body = ChatState))
)]
pub async fn get_chat_handler(State(state): State<Arc<AppState>>) -> Json<ChatState> {
    Json(ChatState(state.chat.lock().await.clone()))
}

/// Send a message. A failed call still answers 200; the reply is the apology message.
#[utoipa::path(
    post,
    path = "/chat/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Conversation including the reply", body = ChatState),
        (status = 400, description = "Empty message"),
        (status = 409, description = "A reply is still pending")
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ChatState>, HandlerError> {
    let dispatch = state
        .chat
        .lock()
        .await
        .begin_send(&payload.message)
        .map_err(reject)?;

    let chat = tokio::spawn(run_chat(state.clone(), dispatch))
        .await
        .map_err(task_failed)?;
    Ok(Json(ChatState(chat)))
}

#[utoipa::path(
    put,
    path = "/chat/simple-mode",
    request_body = SimpleModeRequest,
    responses((status = 200, description = "Chat state", body = ChatState))
)]
pub async fn set_simple_mode_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SimpleModeRequest>,
) -> Json<ChatState> {
    let mut chat = state.chat.lock().await;
    chat.set_simple_mode(payload.enabled);
    Json(ChatState(chat.clone()))
}

//=========================================================================================
// Summarizer
//=========================================================================================

async fn run_summarize(state: Arc<AppState>, dispatch: SummarizeDispatch) -> (bool, SummarizerView) {
    let result = state.gateway.summarize(&dispatch.notes).await;
    let succeeded = result.is_ok();
    let mut summarizer = state.summarizer.lock().await;
    summarizer.settle(dispatch.ticket, result);
    (succeeded, summarizer.clone())
}

#[utoipa::path(
    get,
    path = "/summarizer",
    responses((status = 200, description = "Summarizer state", body = SummarizerState))
)]
pub async fn get_summarizer_handler(State(state): State<Arc<AppState>>) -> Json<SummarizerState> {
    Json(SummarizerState(state.summarizer.lock().await.clone()))
}

#[utoipa::path(
    put,
    path = "/summarizer/notes",
    request_body = NotesRequest,
    responses((status = 200, description = "Summarizer state", body = SummarizerState))
)]
pub async fn set_notes_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NotesRequest>,
) -> Json<SummarizerState> {
    let mut summarizer = state.summarizer.lock().await;
    summarizer.set_notes(payload.notes);
    Json(SummarizerState(summarizer.clone()))
}

/// Load a `.txt` or `.md` file into the notes field.
///
/// Accepts a multipart/form-data request with a single file part.
#[utoipa::path(
    post,
    path = "/summarizer/upload",
    request_body(content_type = "multipart/form-data", description = "The notes file to load."),
    responses(
        (status = 200, description = "Notes loaded", body = SummarizerState),
        (status = 400, description = "No file in the request"),
        (status = 415, description = "Not a .txt/.md file or not UTF-8 text")
    )
)]
pub async fn upload_notes_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SummarizerState>, HandlerError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include a file".to_string(),
            )
        })?;

    let file_name = field.file_name().unwrap_or("untitled.txt").to_string();
    let data = field.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read file bytes: {}", e),
        )
    })?;

    let mut summarizer = state.summarizer.lock().await;
    summarizer.load_file(&file_name, &data).map_err(reject)?;
    info!(file = %file_name, bytes = data.len(), "Loaded notes from file");
    Ok(Json(SummarizerState(summarizer.clone())))
}

/// Summarize the current notes. A failed summary answers 502 with the
/// user-facing `failure` message set in the returned state.
#[utoipa::path(
    post,
    path = "/summarizer/summarize",
    responses(
        (status = 200, description = "Summary produced", body = SummarizerState),
        (status = 400, description = "Notes are empty"),
        (status = 409, description = "A summary is already being produced"),
        (status = 502, description = "The model call or its response failed", body = SummarizerState)
    )
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SummarizerState>), HandlerError> {
    let dispatch = state
        .summarizer
        .lock()
        .await
        .begin_summarize()
        .map_err(reject)?;

    let (succeeded, summarizer) = tokio::spawn(run_summarize(state.clone(), dispatch))
        .await
        .map_err(task_failed)?;
    let status = if succeeded {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(SummarizerState(summarizer))))
}

//=========================================================================================
// Revision
//=========================================================================================

fn revision_snapshot(revision: &RevisionView) -> RevisionResponse {
    RevisionResponse {
        reminders: revision.reminders().to_vec(),
        active_count: revision.active().count(),
        completed_count: revision.completed_count(),
        completion_percent: revision.completion_percent(),
    }
}

#[utoipa::path(
    get,
    path = "/reminders",
    responses((status = 200, description = "Reminders and progress", body = RevisionResponse))
)]
pub async fn list_reminders_handler(State(state): State<Arc<AppState>>) -> Json<RevisionResponse> {
    Json(revision_snapshot(&*state.revision.lock().await))
}

/// Add a reminder. A blank topic changes nothing.
#[utoipa::path(
    post,
    path = "/reminders",
    request_body = AddReminderRequest,
    responses((status = 200, description = "Reminders and progress", body = RevisionResponse))
)]
pub async fn add_reminder_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddReminderRequest>,
) -> Json<RevisionResponse> {
    let mut revision = state.revision.lock().await;
    if revision.add(&payload.topic).is_none() {
        info!("Ignoring reminder with a blank topic");
    }
    Json(revision_snapshot(&revision))
}

#[utoipa::path(
    post,
    path = "/reminders/{id}/toggle",
    params(("id" = Uuid, Path, description = "The reminder to toggle.")),
    responses(
        (status = 200, description = "Reminders and progress", body = RevisionResponse),
        (status = 404, description = "No such reminder")
    )
)]
pub async fn toggle_reminder_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RevisionResponse>, HandlerError> {
    let mut revision = state.revision.lock().await;
    revision.toggle(id).map_err(|e| {
        error!("Failed to toggle reminder: {}", e);
        reject(e)
    })?;
    Ok(Json(revision_snapshot(&revision)))
}

pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the API router over the shared state. CORS and the Swagger UI are
/// layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(rest::health_handler))
        .route("/view", get(rest::get_view_handler).put(rest::set_view_handler))
        .route("/dashboard", get(rest::get_dashboard_handler))
        .route("/dashboard/plan", post(rest::regenerate_plan_handler))
        .route("/chat", get(rest::get_chat_handler))
        .route("/chat/messages", post(rest::send_message_handler))
        .route("/chat/simple-mode", put(rest::set_simple_mode_handler))
        .route("/summarizer", get(rest::get_summarizer_handler))
        .route("/summarizer/notes", put(rest::set_notes_handler))
        .route("/summarizer/upload", post(rest::upload_notes_handler))
        .route("/summarizer/summarize", post(rest::summarize_handler))
        .route(
            "/reminders",
            get(rest::list_reminders_handler).post(rest::add_reminder_handler),
        )
        .route("/reminders/{id}/toggle", post(rest::toggle_reminder_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}

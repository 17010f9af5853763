//! services/api/src/web/state.rs
//!
//! Defines the application's shared state: the gateway plus one state
//! container per view. Each view has its own lock; no lock is held while a
//! gateway call is outstanding.

use crate::config::Config;
use std::sync::Arc;
use study_buddy_core::{
    views::{ChatView, DashboardView, RevisionView, Shell, SummarizerView},
    StudyGateway,
};
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: StudyGateway,
    pub shell: Mutex<Shell>,
    pub dashboard: Mutex<DashboardView>,
    pub chat: Mutex<ChatView>,
    pub summarizer: Mutex<SummarizerView>,
    pub revision: Mutex<RevisionView>,
}

impl AppState {
    /// Fresh state as on first launch: dashboard selected, sample reminders loaded.
    pub fn new(config: Arc<Config>, gateway: StudyGateway) -> Self {
        Self {
            config,
            gateway,
            shell: Mutex::new(Shell::default()),
            dashboard: Mutex::new(DashboardView::new()),
            chat: Mutex::new(ChatView::new()),
            summarizer: Mutex::new(SummarizerView::new()),
            revision: Mutex::new(RevisionView::with_sample_reminders()),
        }
    }
}

//! crates/study_buddy_core/src/views/mod.rs
//!
//! Per-view state containers. Each view owns its state privately; nothing is
//! shared between views and nothing is persisted.
//!
//! Views that call the gateway work in two phases so a caller never has to
//! hold a lock across the network call: `begin_*` validates input and hands
//! out a dispatch carrying a ticket, `settle` applies the outcome only if that
//! ticket is still the one in flight.

pub mod chat;
pub mod dashboard;
pub mod operation;
pub mod revision;
pub mod shell;
pub mod summarizer;

use uuid::Uuid;

pub use chat::{ChatDispatch, ChatView, CHAT_FALLBACK_REPLY};
pub use dashboard::{DashboardView, PlanDispatch, DEFAULT_PLAN_TOPICS, FALLBACK_PLAN};
pub use operation::{Operation, Status, Ticket};
pub use revision::RevisionView;
pub use shell::Shell;
pub use summarizer::{SummarizeDispatch, SummarizerView, SUMMARIZE_FAILURE_MESSAGE};

/// Reasons a user action is rejected before anything is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("A request is already in flight")]
    Busy,
    #[error("Input is empty")]
    EmptyInput,
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
    #[error("Reminder not found: {0}")]
    NotFound(Uuid),
}

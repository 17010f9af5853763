//! Chat view: an append-only conversation plus the simple-mode toggle.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};

use super::{Operation, Ticket, ViewError};
use crate::domain::{ChatHistoryEntry, ChatMessage, Role};
use crate::ports::PortResult;

pub const CHAT_FALLBACK_REPLY: &str = "Sorry, I encountered an error.";

/// Everything needed to perform one `chat` call outside the view's lock.
#[derive(Debug, Clone)]
pub struct ChatDispatch {
    pub ticket: Ticket,
    pub message: String,
    pub history: Vec<ChatHistoryEntry>,
    pub simple_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    messages: Vec<ChatMessage>,
    simple_mode: bool,
    #[serde(rename = "status")]
    operation: Operation,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn simple_mode(&self) -> bool {
        self.simple_mode
    }

    pub fn set_simple_mode(&mut self, enabled: bool) {
        self.simple_mode = enabled;
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Appends the user's message and returns the call to make. The history in
    /// the dispatch holds every turn before this message.
    pub fn begin_send(&mut self, input: &str) -> Result<ChatDispatch, ViewError> {
        if input.trim().is_empty() {
            return Err(ViewError::EmptyInput);
        }
        let ticket = self.operation.begin()?;
        let history = self
            .messages
            .iter()
            .map(ChatMessage::to_history_entry)
            .collect();
        self.messages
            .push(ChatMessage::new(Role::User, input, Utc::now()));

        Ok(ChatDispatch {
            ticket,
            message: input.to_string(),
            history,
            simple_mode: self.simple_mode,
        })
    }

    /// Appends the assistant's reply, or the fallback apology when the call
    /// failed or came back empty. Stale tickets are dropped.
    pub fn settle(&mut self, ticket: Ticket, result: PortResult<String>) -> bool {
        let (content, succeeded) = match result {
            Ok(text) if !text.trim().is_empty() => (text, true),
            Ok(_) => {
                warn!("Chat reply was empty");
                (CHAT_FALLBACK_REPLY.to_string(), false)
            }
            Err(e) => {
                error!("Chat request failed: {}", e);
                (CHAT_FALLBACK_REPLY.to_string(), false)
            }
        };

        if !self.operation.settle(ticket, succeeded) {
            warn!(ticket, "Discarding stale chat reply");
            return false;
        }
        self.messages
            .push(ChatMessage::new(Role::Assistant, content, Utc::now()));
        true
    }
}

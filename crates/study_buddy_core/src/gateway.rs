//! crates/study_buddy_core/src/gateway.rs
//!
//! The sole boundary between the application and the external model. Turns
//! domain requests into prompts and schemas, and model text back into domain
//! types. One outbound call per operation; nothing is cached or retried.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::{ChatHistoryEntry, Summary};
use crate::ports::{ApiKey, GenerationRequest, GenerativeModelService, PortError, PortResult};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

pub const ELI5_DIRECTIVE: &str = "EXPLAIN EVERYTHING IN VERY SIMPLE LANGUAGE (ELI5 mode).";
pub const ACADEMIC_DIRECTIVE: &str = "Provide clear, structured academic explanations.";

const SUMMARY_INSTRUCTION: &str = "Please summarize these study notes. Provide a clear title, 5-7 main points, a simplified one-paragraph explanation, and 3-5 flashcard style questions/answers.";

/// Builds the chat system instruction. Exactly one of the two mode directives is included.
pub fn chat_system_instruction(simple_mode: bool) -> String {
    let mode = if simple_mode {
        ELI5_DIRECTIVE
    } else {
        ACADEMIC_DIRECTIVE
    };
    format!(
        "You are a friendly AI Study Buddy.\n\
         Your goal is to help students learn productively.\n\
         {mode}\n\
         If the user asks a doubt, break it down step-by-step.\n\
         Encourage critical thinking."
    )
}

pub fn summary_prompt(notes: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}\n\nNotes: {notes}")
}

pub fn daily_plan_prompt(topics: &[String]) -> String {
    format!(
        "Based on these pending tasks: {}, create a high-productivity 5-step daily plan for a student today. Keep it short and motivating.",
        topics.join(", ")
    )
}

/// The output schema for `summarize`, with every key required.
pub fn summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "mainPoints": {
                "type": "array",
                "items": { "type": "string" }
            },
            "simplifiedExplanation": { "type": "string" },
            "flashcards": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string" },
                        "answer": { "type": "string" }
                    },
                    "required": ["question", "answer"]
                }
            }
        },
        "required": ["title", "mainPoints", "simplifiedExplanation", "flashcards"]
    })
}

/// Parses model text as a `Summary`. Empty text, missing keys and non-JSON are all errors.
pub fn parse_summary(text: &str) -> PortResult<Summary> {
    serde_json::from_str::<Summary>(text.trim())
        .map_err(|e| PortError::Parse(format!("summary response did not match schema: {e}")))
}

//=========================================================================================
// The Gateway
//=========================================================================================

#[derive(Clone)]
pub struct StudyGateway {
    model_service: Arc<dyn GenerativeModelService>,
    api_key: Option<ApiKey>,
    model: String,
}

impl StudyGateway {
    /// Creates a gateway. A missing credential is accepted here and reported by every
    /// operation, so the rest of the application stays usable.
    pub fn new(
        model_service: Arc<dyn GenerativeModelService>,
        api_key: Option<ApiKey>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            model_service,
            api_key,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn credential(&self) -> PortResult<&ApiKey> {
        self.api_key
            .as_ref()
            .ok_or_else(|| PortError::Configuration("API key not found".to_string()))
    }

    /// Sends one chat turn. `history` must hold every prior turn; nothing is kept between calls.
    #[instrument(skip_all, fields(simple_mode = simple_mode, history_len = history.len()))]
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatHistoryEntry],
        simple_mode: bool,
    ) -> PortResult<String> {
        let api_key = self.credential()?;
        let request = GenerationRequest {
            model: self.model.clone(),
            system_instruction: Some(chat_system_instruction(simple_mode)),
            history: history.to_vec(),
            prompt: message.to_string(),
            response_schema: None,
        };
        self.model_service.generate(api_key, request).await
    }

    #[instrument(skip_all, fields(notes_len = notes.len()))]
    pub async fn summarize(&self, notes: &str) -> PortResult<Summary> {
        let api_key = self.credential()?;
        let request = GenerationRequest {
            model: self.model.clone(),
            system_instruction: None,
            history: Vec::new(),
            prompt: summary_prompt(notes),
            response_schema: Some(summary_schema()),
        };
        let text = self.model_service.generate(api_key, request).await?;
        debug!(response_len = text.len(), "Received summary response");
        parse_summary(&text)
    }

    #[instrument(skip_all, fields(topics = topics.len()))]
    pub async fn daily_plan(&self, topics: &[String]) -> PortResult<String> {
        let api_key = self.credential()?;
        let request = GenerationRequest {
            model: self.model.clone(),
            system_instruction: None,
            history: Vec::new(),
            prompt: daily_plan_prompt(topics),
            response_schema: None,
        };
        self.model_service.generate(api_key, request).await
    }
}

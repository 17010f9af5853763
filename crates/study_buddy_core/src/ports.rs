//! crates/study_buddy_core/src/ports.rs
//!
//! Defines the service contract between the core and the external
//! generative-language model. The trait forms the boundary of the hexagonal
//! architecture: the gateway builds requests, an adapter performs exactly one
//! network round trip per request.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::domain::ChatHistoryEntry;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// No credential was configured. Raised before any network attempt.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Network failure, timeout or a non-success response from the model.
    #[error("Service error: {0}")]
    Transport(String),
    /// The model's text did not satisfy the declared output schema.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Credential
//=========================================================================================

/// The credential for the external model. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty or whitespace-only value.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

//=========================================================================================
// Request Shape
//=========================================================================================

/// A single request to the model. `response_schema` is a JSON-Schema object
/// using lowercase type names; adapters translate it to their provider's form.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub history: Vec<ChatHistoryEntry>,
    pub prompt: String,
    pub response_schema: Option<Value>,
}

//=========================================================================================
// Service Port (Trait)
//=========================================================================================

#[async_trait]
pub trait GenerativeModelService: Send + Sync {
    /// Performs one round trip and returns the model's raw text, which may be empty.
    async fn generate(&self, api_key: &ApiKey, request: GenerationRequest) -> PortResult<String>;
}

//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter for Google's generative-language API.
//! It implements the `GenerativeModelService` port from the `core` crate using
//! the native `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use study_buddy_core::{
    domain::Role,
    ports::{ApiKey, GenerationRequest, GenerativeModelService, PortError, PortResult},
};
use tracing::debug;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

impl GeminiRequest {
    pub(crate) fn from_generation(request: GenerationRequest) -> Self {
        let mut contents: Vec<GeminiContent> = request
            .history
            .into_iter()
            .map(|entry| GeminiContent {
                role: match entry.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                },
                parts: vec![GeminiTextPart {
                    text: entry.content,
                }],
            })
            .collect();
        contents.push(GeminiContent {
            role: "user",
            parts: vec![GeminiTextPart {
                text: request.prompt,
            }],
        });

        Self {
            contents,
            system_instruction: request.system_instruction.map(|text| GeminiSystemInstruction {
                parts: vec![GeminiTextPart { text }],
            }),
            generation_config: request.response_schema.map(|schema| GeminiGenerationConfig {
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(schema),
            }),
        }
    }
}

impl GeminiResponse {
    /// Concatenates the text parts of the first candidate; empty when there are none.
    pub(crate) fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini's `responseSchema` spells type names as upper-case enum values.
pub(crate) fn to_gemini_schema(schema: Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(name) if key == "type" => Value::String(name.to_uppercase()),
                        other => to_gemini_schema(other),
                    };
                    (key, value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_gemini_schema).collect()),
        other => other,
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeModelService` against the Gemini REST API.
#[derive(Clone)]
pub struct GeminiModelAdapter {
    client: Client,
    api_base: String,
}

impl GeminiModelAdapter {
    /// Creates a new `GeminiModelAdapter`. Requests are bounded by `timeout`.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }
}

//=========================================================================================
// `GenerativeModelService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeModelService for GeminiModelAdapter {
    async fn generate(&self, api_key: &ApiKey, request: GenerationRequest) -> PortResult<String> {
        let url = self.endpoint(&request.model);
        let body = GeminiRequest::from_generation(request);
        debug!(%url, turns = body.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Transport(format!(
                "Gemini API error: {} - {}",
                status, body
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("Invalid Gemini response body: {}", e)))?;
        Ok(parsed.into_text())
    }
}

//! services/api/src/adapters/openai.rs
//!
//! This module contains the adapter for OpenAI-compatible chat-completion APIs.
//! It implements the `GenerativeModelService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use std::time::Duration;
use study_buddy_core::{
    domain::Role,
    ports::{ApiKey, GenerationRequest, GenerativeModelService, PortError, PortResult},
};
use tracing::debug;

const SCHEMA_NAME: &str = "study_summary";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerativeModelService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiModelAdapter {
    http_client: reqwest::Client,
    api_base: String,
}

impl OpenAiModelAdapter {
    /// Creates a new `OpenAiModelAdapter`. The credential is supplied per request.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_base: api_base.into(),
        })
    }

    /// One attempt per call: the client's retry on 429/5xx is switched off so
    /// upstream failures reach the caller.
    fn client(&self, api_key: &ApiKey) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(&self.api_base)
            .with_api_key(api_key.expose());
        Client::with_config(config)
            .with_http_client(self.http_client.clone())
            .with_backoff(single_attempt())
    }
}

fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

/// Translates a port request into a chat-completion request.
pub(crate) fn build_request(request: GenerationRequest) -> PortResult<CreateChatCompletionRequest> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

    if let Some(system) = request.system_instruction {
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Transport(format!("Invalid request: {}", e)))?
                .into(),
        );
    }

    for entry in request.history {
        let message: ChatCompletionRequestMessage = match entry.role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(entry.content)
                .build()
                .map_err(|e| PortError::Transport(format!("Invalid request: {}", e)))?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(entry.content)
                .build()
                .map_err(|e| PortError::Transport(format!("Invalid request: {}", e)))?
                .into(),
        };
        messages.push(message);
    }

    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt)
            .build()
            .map_err(|e| PortError::Transport(format!("Invalid request: {}", e)))?
            .into(),
    );

    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(request.model).messages(messages).n(1);
    if let Some(schema) = request.response_schema {
        args.response_format(ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: SCHEMA_NAME.to_string(),
                description: None,
                schema: Some(schema),
                strict: Some(false),
            },
        });
    }
    args.build().map_err(|e| PortError::Transport(format!("Invalid request: {}", e)))
}

//=========================================================================================
// `GenerativeModelService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerativeModelService for OpenAiModelAdapter {
    async fn generate(&self, api_key: &ApiKey, request: GenerationRequest) -> PortResult<String> {
        let request = build_request(request)?;
        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion");

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client(api_key)
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Transport(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

pub mod gemini;
pub mod openai;

pub use gemini::GeminiModelAdapter;
pub use openai::OpenAiModelAdapter;

use crate::config::{Config, ModelProvider};
use std::sync::Arc;
use study_buddy_core::{GenerativeModelService, StudyGateway};
use tracing::{info, warn};

/// Builds the gateway over the adapter selected by the configuration.
pub fn gateway_from_config(config: &Config) -> Result<StudyGateway, reqwest::Error> {
    let model_service: Arc<dyn GenerativeModelService> = match config.provider {
        ModelProvider::Gemini => Arc::new(GeminiModelAdapter::new(
            config.gemini_api_base.clone(),
            config.request_timeout,
        )?),
        ModelProvider::OpenAi => Arc::new(OpenAiModelAdapter::new(
            config.openai_api_base.clone(),
            config.request_timeout,
        )?),
    };

    let api_key = config.api_key();
    if api_key.is_none() {
        warn!(provider = ?config.provider, "No API key configured; every model call will fail");
    }
    info!(provider = ?config.provider, model = %config.model, "Model gateway ready");
    Ok(StudyGateway::new(model_service, api_key, config.model.clone()))
}

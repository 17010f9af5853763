//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. A missing model credential is not an
//! error here: the gateway reports it on every call instead.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use study_buddy_core::{ApiKey, DEFAULT_MODEL};
use tracing::Level;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which transport adapter backs the gateway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelProvider {
    #[default]
    Gemini,
    OpenAi,
}

impl FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("'{}' is not a known provider (gemini, openai)", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub provider: ModelProvider,
    pub model: String,
    pub gemini_api_key: Option<ApiKey>,
    pub gemini_api_base: String,
    pub openai_api_key: Option<ApiKey>,
    pub openai_api_base: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        // --- Model Settings ---
        let provider = match lookup("MODEL_PROVIDER") {
            Some(raw) => raw
                .parse::<ModelProvider>()
                .map_err(|e| ConfigError::InvalidValue("MODEL_PROVIDER".to_string(), e))?,
            None => ModelProvider::default(),
        };
        let model = lookup("STUDY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => 60,
        };

        // --- API Keys (optional) ---
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .and_then(ApiKey::new);
        let openai_api_key = lookup("OPENAI_API_KEY").and_then(ApiKey::new);

        let gemini_api_base =
            lookup("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
        let openai_api_base =
            lookup("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            provider,
            model,
            gemini_api_key,
            gemini_api_base,
            openai_api_key,
            openai_api_base,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// The credential for the selected provider, if one is configured.
    pub fn api_key(&self) -> Option<ApiKey> {
        match self.provider {
            ModelProvider::Gemini => self.gemini_api_key.clone(),
            ModelProvider::OpenAi => self.openai_api_key.clone(),
        }
    }
}

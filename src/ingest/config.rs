// src/ingest/config.rs
use crate::error::PipelineError;

pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const ENV_NEWSAPI_URL: &str = "NEWSAPI_URL";
pub const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";

/// Connection settings for the NewsAPI `everything` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
}

impl NewsApiConfig {
    /// Reads `NEWSAPI_KEY` (required) and `NEWSAPI_URL` (optional override).
    pub fn from_env() -> Result<Self, PipelineError> {
        let key = std::env::var(ENV_NEWSAPI_KEY).unwrap_or_default();
        Self::from_parts(&key, std::env::var(ENV_NEWSAPI_URL).ok())
    }

    pub fn from_parts(api_key: &str, base_url: Option<String>) -> Result<Self, PipelineError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(PipelineError::MissingConfiguration(ENV_NEWSAPI_KEY));
        }
        let base_url = base_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_NEWSAPI_URL.to_string());
        Ok(Self {
            api_key: api_key.to_string(),
            base_url,
            language: "en".to_string(),
        })
    }
}

// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::warn;

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_AI_MODEL: &str = "AI_MODEL";

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_provider() -> String {
    "openai".to_string()
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// Only "openai" is wired up (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        // Normalize provider
        cfg.provider = cfg.provider.trim().to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "openai" => env::var(ENV_OPENAI_API_KEY)
                    .map_err(|_| anyhow::anyhow!("Missing OPENAI_API_KEY env var"))?,
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
        }
        if cfg.model.trim().is_empty() {
            cfg.model = default_model();
        }

        Ok(cfg)
    }

    /// Enabled iff `OPENAI_API_KEY` is set and non-blank.
    pub fn from_env() -> Self {
        let api_key = env::var(ENV_OPENAI_API_KEY).unwrap_or_default();
        let model = env::var(ENV_AI_MODEL)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(default_model);
        Self {
            enabled: !api_key.trim().is_empty(),
            api_key,
            model,
            ..Self::default()
        }
    }

    /// `config/ai.json` when present and valid, else the environment.
    pub fn load_default() -> Self {
        let path = Path::new(DEFAULT_AI_CONFIG_PATH);
        if path.exists() {
            match Self::load_from_file(path) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(target: "ai", error = ?e, "ignoring config/ai.json"),
            }
        }
        Self::from_env()
    }
}

use secrecy::SecretString;

use crate::config::helpers::{first_non_empty_env, optional_env, parse_optional_env};
use crate::error::ConfigError;
use crate::settings::Settings;

/// OpenAI-compatible completion endpoint used by the intent parser.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL up to and including the API version (e.g. `https://openrouter.ai/api/v1`).
    pub base_url: String,
    pub model: String,
    /// `None` leaves the remote call unauthenticated; the provider will reject it
    /// and the parser falls back to the keyword heuristic.
    pub api_key: Option<SecretString>,
    pub app_title: String,
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = optional_env("LLM_BASE_URL")?
            .unwrap_or_else(|| settings.llm.base_url.clone())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidValue {
            key: "LLM_BASE_URL".to_string(),
            message: format!("must be an absolute URL: {e}"),
        })?;

        let timeout_secs = parse_optional_env::<u64>("LLM_TIMEOUT_SECS", "a positive integer")?
            .or(settings.llm.timeout_secs);
        if timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "LLM_TIMEOUT_SECS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            base_url,
            model: optional_env("LLM_MODEL")?.unwrap_or_else(|| settings.llm.model.clone()),
            api_key: first_non_empty_env(&["LLM_API_KEY", "OPENAI_API_KEY"])?
                .map(SecretString::from),
            app_title: optional_env("LLM_APP_TITLE")?
                .unwrap_or_else(|| settings.llm.app_title.clone()),
            timeout_secs,
        })
    }
}

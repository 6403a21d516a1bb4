//! Application configuration
//!
//! Layered the usual way: optional `config/default` and `config/local`
//! files, overridden by `PORTAL_RAG`-prefixed environment variables
//! (`PORTAL_RAG__PROVIDERS__OPENAI_API_KEY=...`). A `.env` file is
//! honored via dotenvy.

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM and embedding provider settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI API key; expansion and semantic chunking degrade to
    /// no-ops without it, embedding does not work at all
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("PORTAL_RAG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl ProviderConfig {
    /// API key from config, falling back to the conventional
    /// `OPENAI_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.providers.chat_model, "gpt-4o-mini");
        assert_eq!(config.providers.embedding_model, "text-embedding-3-small");
        assert_eq!(config.logging.level, "info");
        assert!(config.providers.openai_api_key.is_none());
    }

    #[test]
    fn test_partial_deserialization() {
        let config: AppConfig =
            serde_json::from_str(r#"{"providers": {"chat_model": "gpt-4o"}}"#).unwrap();

        assert_eq!(config.providers.chat_model, "gpt-4o");
        assert_eq!(config.providers.embedding_model, "text-embedding-3-small");
    }
}

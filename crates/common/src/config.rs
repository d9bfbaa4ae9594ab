use std::env;
use std::path::Path;

pub const DEFAULT_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.voyageai.com/v1/embeddings";
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";

/// Connection settings for the three external services.
///
/// Built once at startup and passed by reference into each client
/// constructor. A missing credential or connection string is a valid
/// state: the client that depends on it degrades to an empty result
/// instead of failing.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Bearer credential for the chat completion endpoint.
    pub llm_key: Option<String>,
    /// Chat completion endpoint URL.
    pub chat_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Embedding endpoint URL.
    pub emb_url: String,
    /// Bearer credential for the embedding endpoint.
    pub voyage_key: Option<String>,
    /// Postgres connection string for the chunk store.
    pub db_url: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            llm_key: None,
            chat_url: DEFAULT_CHAT_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            emb_url: DEFAULT_EMBEDDING_URL.to_string(),
            voyage_key: None,
            db_url: None,
        }
    }
}

impl RagConfig {
    /// Read configuration from the process environment, loading a local
    /// `.env` file first if one exists. Missing variables leave the
    /// corresponding field unset; this never fails.
    pub fn from_env() -> Self {
        if Path::new(".env").exists() {
            dotenv::dotenv().ok();
        }

        Self {
            llm_key: env::var("OPENROUTER_API_KEY").ok(),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            voyage_key: env::var("VOYAGE_API_KEY").ok(),
            db_url: env::var("DATABASE_URL").ok(),
            ..Self::default()
        }
    }

    pub fn with_llm_key(mut self, key: impl Into<String>) -> Self {
        self.llm_key = Some(key.into());
        self
    }

    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_emb_url(mut self, url: impl Into<String>) -> Self {
        self.emb_url = url.into();
        self
    }

    pub fn with_voyage_key(mut self, key: impl Into<String>) -> Self {
        self.voyage_key = Some(key.into());
        self
    }

    pub fn with_db_url(mut self, url: impl Into<String>) -> Self {
        self.db_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_credentials() {
        let config = RagConfig::default();

        assert!(config.llm_key.is_none());
        assert!(config.voyage_key.is_none());
        assert!(config.db_url.is_none());
        assert_eq!(config.chat_url, DEFAULT_CHAT_URL);
        assert_eq!(config.emb_url, DEFAULT_EMBEDDING_URL);
        assert_eq!(config.model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RagConfig::default()
            .with_llm_key("llm-key")
            .with_voyage_key("voyage-key")
            .with_db_url("postgres://localhost/test")
            .with_model("some/other-model")
            .with_chat_url("http://localhost:9000/chat")
            .with_emb_url("http://localhost:9001/embed");

        assert_eq!(config.llm_key.as_deref(), Some("llm-key"));
        assert_eq!(config.voyage_key.as_deref(), Some("voyage-key"));
        assert_eq!(config.db_url.as_deref(), Some("postgres://localhost/test"));
        assert_eq!(config.model, "some/other-model");
        assert_eq!(config.chat_url, "http://localhost:9000/chat");
        assert_eq!(config.emb_url, "http://localhost:9001/embed");
    }
}

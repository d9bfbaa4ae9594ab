use std::time::Duration;

use common::{PipelineError, PipelineResult, RagConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Hard cap on generated tokens per completion.
pub const MAX_COMPLETION_TOKENS: u32 = 8192;

const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

// Static identification headers the endpoint uses for attribution.
const REFERER: &str = "https://github.com/ragplan/ragplan";
const TITLE: &str = "ragplan";

/// One role-tagged message in a conversation.
///
/// Roles are forwarded verbatim; no validation or mutation happens on
/// this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling controls for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    /// Sampling temperature; the default is near-deterministic.
    pub temperature: f32,
    /// Ask the endpoint to constrain output to a JSON object.
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            json_mode: false,
        }
    }
}

impl CompletionOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Client for a remote chat completion service.
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_key: Option<String>,
    endpoint: String,
    model: String,
    client: Client,
}

impl ChatClient {
    pub fn new(config: &RagConfig) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .map_err(PipelineError::transport)?;

        Ok(Self {
            api_key: config.llm_key.clone(),
            endpoint: config.chat_url.clone(),
            model: config.model.clone(),
            client,
        })
    }

    /// Request a completion, surfacing the failure class to the caller.
    ///
    /// Without a configured credential this returns
    /// [`PipelineError::NotConfigured`] before any network I/O.
    pub async fn try_complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> PipelineResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PipelineError::NotConfigured("chat credential"))?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: MAX_COMPLETION_TOKENS,
            response_format: options.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&request)
            .send()
            .await
            .map_err(PipelineError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(PipelineError::transport)?;
        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(PipelineError::malformed)?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::MalformedResponse("empty choices array".to_string()))?;

        debug!(model = %self.model, "completion received");
        Ok(choice.message.content)
    }

    /// Request a completion, collapsing every failure to `None`.
    ///
    /// Each failure emits exactly one diagnostic record before returning.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Option<String> {
        match self.try_complete(messages, options).await {
            Ok(content) => Some(content),
            Err(err) => {
                error!("chat completion failed: {err}");
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    fn client_for(server: &Server, key: Option<&str>) -> ChatClient {
        let mut config = RagConfig::default()
            .with_chat_url(server.url())
            .with_model("meta-llama/llama-3.1-8b-instruct");
        if let Some(key) = key {
            config = config.with_llm_key(key);
        }
        ChatClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_skips_network() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", "/").expect(0).create_async().await;

        let client = client_for(&server, None);
        let messages = [ChatMessage::user("hi")];

        let result = client.complete(&messages, CompletionOptions::default()).await;
        assert!(result.is_none());

        let err = client
            .try_complete(&messages, CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_configured());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer llm-key")
            .match_header("x-title", TITLE)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "meta-llama/llama-3.1-8b-instruct",
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.1,
                "max_tokens": 8192
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"content": "hello"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("llm-key"));
        let messages = [ChatMessage::user("hi")];

        let result = client.complete(&messages, CompletionOptions::default()).await;
        assert_eq!(result.as_deref(), Some("hello"));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_json_mode_sets_response_format() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "{}"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("llm-key"));
        let messages = [ChatMessage::user("hi")];
        let options = CompletionOptions::default().with_json_mode();

        let result = client.complete(&messages, options).await;
        assert_eq!(result.as_deref(), Some("{}"));

        mock.assert_async().await;
    }

    #[test]
    fn test_default_request_has_no_response_format_key() {
        let messages = [ChatMessage::user("hi")];
        let request = CompletionRequest {
            model: "meta-llama/llama-3.1-8b-instruct",
            messages: &messages,
            temperature: 0.1,
            max_tokens: MAX_COMPLETION_TOKENS,
            response_format: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["max_tokens"], 8192);
    }

    #[tokio::test]
    async fn test_server_error_collapses_to_none() {
        let mut server = Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(500).create_async().await;

        let client = client_for(&server, Some("llm-key"));
        let messages = [ChatMessage::user("hi")];

        let result = client.complete(&messages, CompletionOptions::default()).await;
        assert!(result.is_none());

        match client
            .try_complete(&messages, CompletionOptions::default())
            .await
        {
            Err(PipelineError::Status { code: 500 }) => {}
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_collapses_to_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("llm-key"));
        let messages = [ChatMessage::user("hi")];

        match client
            .try_complete(&messages, CompletionOptions::default())
            .await
        {
            Err(PipelineError::MalformedResponse(_)) => {}
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
        assert_eq!(ChatMessage::user("hi").content, "hi");
    }
}

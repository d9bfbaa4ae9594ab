use std::time::Duration;

use common::{PipelineError, PipelineResult, RagConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const EMBEDDING_MODEL: &str = "voyage-3";
const EMBEDDING_INPUT_TYPE: &str = "query";
const EMBEDDING_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a remote embedding service.
///
/// Stateless: every call is a single bounded request, and repeated calls
/// with the same input against a deterministic backend yield identical
/// vectors.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    api_key: Option<String>,
    endpoint: String,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(config: &RagConfig) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(EMBEDDING_TIMEOUT)
            .build()
            .map_err(PipelineError::transport)?;

        Ok(Self {
            api_key: config.voyage_key.clone(),
            endpoint: config.emb_url.clone(),
            client,
        })
    }

    /// Embed `text`, surfacing the failure class to the caller.
    ///
    /// Without a configured credential this returns
    /// [`PipelineError::NotConfigured`] before any network I/O.
    pub async fn try_embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PipelineError::NotConfigured("embedding credential"))?;

        let request = EmbeddingRequest {
            model: EMBEDDING_MODEL,
            input: text,
            input_type: EMBEDDING_INPUT_TYPE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
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
        let parsed: EmbeddingResponse =
            serde_json::from_str(&body).map_err(PipelineError::malformed)?;

        let entry = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::MalformedResponse("empty data array".to_string()))?;

        debug!(dimension = entry.embedding.len(), "embedding received");
        Ok(entry.embedding)
    }

    /// Embed `text`, collapsing every failure to an empty vector.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        match self.try_embed(text).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!("embedding request failed: {err}");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    input_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

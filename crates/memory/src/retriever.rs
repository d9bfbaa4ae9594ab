use std::sync::Arc;

use ai::EmbeddingClient;
use common::{PipelineError, PipelineResult};
use tracing::{debug, warn};

use crate::store::ChunkStore;

/// Number of nearest chunks fetched per query.
pub const TOP_K: i64 = 8;

/// Separator between chunk contents in the assembled context blob.
pub const CHUNK_SEPARATOR: &str = "\n---\n";

/// Embeds a query and assembles a context blob from the nearest chunks.
///
/// Embedding always completes (or short-circuits) before any store
/// access is attempted. Prompt assembly and the chat call stay with the
/// caller.
#[derive(Clone)]
pub struct ContextRetriever {
    embedder: EmbeddingClient,
    store: Option<Arc<dyn ChunkStore>>,
}

impl ContextRetriever {
    pub fn new(embedder: EmbeddingClient, store: Option<Arc<dyn ChunkStore>>) -> Self {
        Self { embedder, store }
    }

    /// Retriever with no backing store; every query resolves to an
    /// empty context.
    pub fn without_store(embedder: EmbeddingClient) -> Self {
        Self::new(embedder, None)
    }

    /// Fetch context for `query`, surfacing the failure class.
    ///
    /// An empty embedding is not an error: it short-circuits to an empty
    /// context without touching the store.
    pub async fn try_retrieve(&self, query: &str) -> PipelineResult<String> {
        let vector = self.embedder.embed(query).await;
        if vector.is_empty() {
            debug!("empty query embedding, skipping retrieval");
            return Ok(String::new());
        }

        let store = self
            .store
            .as_ref()
            .ok_or(PipelineError::NotConfigured("database connection string"))?;

        let chunks = store.nearest(&vector, TOP_K).await?;
        Ok(chunks.join(CHUNK_SEPARATOR))
    }

    /// Fetch context for `query`, collapsing every failure to `""`.
    pub async fn retrieve(&self, query: &str) -> String {
        match self.try_retrieve(query).await {
            Ok(context) => context,
            Err(err) => {
                warn!("context retrieval failed: {err}");
                String::new()
            }
        }
    }
}

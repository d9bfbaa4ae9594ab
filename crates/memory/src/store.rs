use async_trait::async_trait;
use common::{PipelineError, PipelineResult, RagConfig};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

const NEAREST_CHUNKS_SQL: &str =
    "SELECT content FROM knowledge_chunks ORDER BY embedding <=> CAST($1 AS vector) LIMIT $2";

const MAX_POOL_CONNECTIONS: u32 = 5;

/// Source of stored text chunks ordered by vector distance.
///
/// The store defines the distance metric; callers only rely on
/// "ascending distance, at most `limit` rows".
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Contents of the `limit` chunks nearest to `vector`.
    async fn nearest(&self, vector: &[f32], limit: i64) -> PipelineResult<Vec<String>>;
}

/// Postgres + pgvector implementation of [`ChunkStore`].
///
/// The pool is owned by the composition root and injected; each query
/// checks a connection out of the pool and returns it on every exit
/// path, including errors.
#[derive(Debug, Clone)]
pub struct PgChunkStore {
    pool: PgPool,
}

impl PgChunkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a store from the configured connection string.
    pub async fn connect(config: &RagConfig) -> PipelineResult<Self> {
        let url = config
            .db_url
            .as_deref()
            .ok_or(PipelineError::NotConfigured("database connection string"))?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .connect(url)
            .await
            .map_err(PipelineError::transport)?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ChunkStore for PgChunkStore {
    async fn nearest(&self, vector: &[f32], limit: i64) -> PipelineResult<Vec<String>> {
        let mut conn = self.pool.acquire().await.map_err(PipelineError::transport)?;

        let rows: Vec<String> = sqlx::query_scalar(NEAREST_CHUNKS_SQL)
            .bind(vector_literal(vector))
            .bind(limit)
            .fetch_all(&mut *conn)
            .await
            .map_err(PipelineError::transport)?;

        debug!(rows = rows.len(), "nearest chunks fetched");
        Ok(rows)
    }
}

/// Render a vector in pgvector's text form, `[x1,x2,...]`, for the
/// `CAST(.. AS vector)` parameter.
fn vector_literal(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(","))
}

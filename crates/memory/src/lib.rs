//! Vector retrieval over a pgvector-backed chunk store.
//!
//! [`ContextRetriever`] embeds a query, asks a [`ChunkStore`] for the
//! nearest stored chunks and joins their contents into a single context
//! blob for prompt assembly. Any failure along the way collapses to an
//! empty string.

pub mod retriever;
pub mod store;

pub use retriever::{ContextRetriever, CHUNK_SEPARATOR, TOP_K};
pub use store::{ChunkStore, PgChunkStore};

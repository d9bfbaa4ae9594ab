//! Remote embedding client.
//!
//! Turns free text into a numeric vector by calling a Voyage-style
//! embedding endpoint. Failures never escape the soft API: a missing
//! credential, a timeout, a bad status or a malformed body all collapse
//! to an empty vector.

pub mod embedding;

pub use embedding::EmbeddingClient;

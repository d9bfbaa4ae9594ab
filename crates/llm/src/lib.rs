//! Chat completion client.
//!
//! Forwards an ordered message list to an OpenRouter-style endpoint and
//! returns the generated text. The soft API never errors: a missing
//! credential, transport fault, bad status or malformed body all collapse
//! to `None`, with one diagnostic record on the failure path.

pub mod chat;

pub use chat::{ChatClient, ChatMessage, CompletionOptions};

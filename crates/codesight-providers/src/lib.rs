//! Pluggable embedding and LLM backends. Search is always local (vector +
//! BM25); only `ask()` ever reaches one of these network-backed LLM calls.

pub mod embedding;
pub mod error;
pub mod llm;

pub use embedding::{get_embedder, EmbeddingProvider, LocalEmbedder, RemoteApiEmbedder};
pub use error::ProviderError;
pub use llm::{get_backend, LlmProvider, SYSTEM_PROMPT};

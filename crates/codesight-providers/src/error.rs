/// Errors from embedding/LLM backend construction and use.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("missing configuration: {0}")]
    ConfigFailure(String),

    #[error("unknown backend: '{name}' (valid: {valid})")]
    UnknownBackend { name: String, valid: &'static str },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ProviderError {
    /// Network/5xx-shaped failures are worth a retry by the caller;
    /// misconfiguration and dimension mismatches never will be.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestFailed(_))
    }
}

/// Indexer errors. Per-file chunking/extraction failures never reach this
/// type — `codesight-parser`'s router already turned those into empty
/// chunk lists with a logged warning; only batch-level failures propagate.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("storage error: {0}")]
    Store(#[from] codesight_store::StoreError),

    #[error("embedding provider error: {0}")]
    Provider(#[from] codesight_providers::ProviderError),

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Errors from embedding a query or hydrating fused candidates.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Store(#[from] codesight_store::StoreError),

    #[error(transparent)]
    Provider(#[from] codesight_providers::ProviderError),
}

impl RetrievalError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Provider(e) => e.is_retryable(),
        }
    }
}

/// Top-level error the CLI maps to a process exit code. Each library crate
/// gets its own variant rather than being flattened, so a caller embedding
/// `Engine` in another program can match on the originating subsystem.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("not a directory: {path}")]
    BadPath { path: String },

    #[error(transparent)]
    Indexer(#[from] codesight_indexer::IndexerError),

    #[error(transparent)]
    Retrieval(#[from] codesight_retrieval::RetrievalError),

    #[error(transparent)]
    Store(#[from] codesight_store::StoreError),

    #[error(transparent)]
    Provider(#[from] codesight_providers::ProviderError),
}

impl CliError {
    /// Process exit code: 0 is reserved for success, so every variant maps
    /// to a nonzero code distinguishing bad input (2) from a backend/provider
    /// failure (1) — the same two-tier split the original source's CLI used.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BadPath { .. } => 2,
            _ => 1,
        }
    }
}

/// Key/value metadata persisted alongside a folder's indexes.
///
/// `DualStore` persists these as rows in a generic `repo_meta` table; this
/// struct is just the typed view the rest of the system works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoMeta {
    /// Identifier of the embedding model that produced the current vectors.
    pub embedding_model: Option<String>,
    /// ISO-8601 UTC timestamp of the last successful index run.
    pub last_indexed_at: Option<String>,
    /// HEAD commit hash, if the folder is under version control. Advisory only.
    pub last_commit: Option<String>,
    /// Absolute resolved path at index creation time.
    pub repo_canonical_path: Option<String>,
}

/// Well-known keys in the `repo_meta` table, shared by every store backend.
pub mod meta_keys {
    pub const EMBEDDING_MODEL: &str = "embedding_model";
    pub const LAST_INDEXED_AT: &str = "last_indexed_at";
    pub const LAST_COMMIT: &str = "last_commit";
    pub const REPO_CANONICAL_PATH: &str = "repo_canonical_path";
}

use std::path::PathBuf;

/// Errors from walking, routing, extracting, or chunking a single file.
///
/// Every variant here is recovered locally by its caller (logged, file
/// skipped) per the spec's per-file failure policy — none of these
/// propagate past `codesight-indexer`.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("unreadable file {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("extractor failed for {path}: {reason}")]
    ExtractorFailure { path: PathBuf, reason: String },

    #[error("unsupported document format: {ext}")]
    UnsupportedFormat { ext: String },
}

impl ParserError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}

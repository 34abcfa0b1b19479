use std::path::Path;

use codesight_core::{Chunk, Language};

use crate::chunker::{chunk_code, chunk_document, ChunkConfig};
use crate::error::ParserError;
use crate::extractors;

/// Chunk one file, routing by its extension.
///
/// `file_path` is the path stamped onto each `Chunk` and used in
/// `chunk_id` — callers pass the path relative to the repo root so chunk
/// ids stay stable across clone locations.
pub fn chunk_file(abs_path: &Path, file_path: &str, cfg: &ChunkConfig) -> Result<Vec<Chunk>, ParserError> {
    let ext = abs_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let language = Language::from_extension(&ext);

    if language.is_document() {
        let pages = extractors::extract_text(abs_path)?;
        return Ok(chunk_document(&pages, file_path, language, cfg));
    }

    let bytes = std::fs::read(abs_path).map_err(|e| ParserError::UnreadableFile {
        path: abs_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let content = String::from_utf8_lossy(&bytes);

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(chunk_code(&content, file_path, language, cfg))
}

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use codesight_core::{Chunk, IndexStats, ServerConfig};
use codesight_parser::{chunk_file, walk_repo_files, ChunkConfig};
use codesight_providers::{get_embedder, EmbeddingProvider};
use codesight_store::DualStore;

use crate::error::IndexerError;
use crate::git;

const BATCH_SIZE: usize = 64;

/// Full or incremental index of a folder.
///
/// Walks every indexable file, chunks it, and diffs the new chunk set
/// against what's already stored:
/// - if the file's chunk_id set changed at all, every old chunk for that
///   file is deleted first (no stale chunk ever lingers past a rename or a
///   shifted line range);
/// - each new chunk is then (re-)embedded unless a chunk with the same
///   content_hash already exists and `force_rebuild` is false.
///
/// Chunks needing embedding are collected up front (grouped in batches of
/// 64, regardless of file boundaries) and embedded with `rayon`, since
/// embedding a batch is a pure, store-independent call — only the final
/// upsert into `DualStore` is sequential.
pub fn index_repo(repo_path: &Path, config: &ServerConfig, force_rebuild: bool) -> Result<IndexStats, IndexerError> {
    let start = Instant::now();

    let canonical = std::fs::canonicalize(repo_path)?;
    if !canonical.is_dir() {
        return Err(IndexerError::NotADirectory {
            path: canonical.to_string_lossy().to_string(),
        });
    }

    let embedder = get_embedder(&config.embedding_model, config.embedding_dim, &config.embedding_backend)?;
    let mut store = DualStore::open(&config.data_dir, &canonical, config.embedding_dim)?;
    store.set_repo_canonical_path(&canonical.to_string_lossy())?;

    let model_changed = store
        .embedding_model()?
        .is_some_and(|stored| stored != config.embedding_model);
    let force_rebuild = force_rebuild || model_changed;
    if model_changed {
        tracing::info!(repo = %canonical.display(), "embedding model changed, forcing full rebuild");
    }

    let chunk_cfg = ChunkConfig {
        max_lines: config.chunk_max_lines,
        overlap_lines: config.chunk_overlap_lines,
        max_chars: config.doc_chunk_max_chars,
        overlap_chars: config.doc_chunk_overlap_chars,
    };

    let files = walk_repo_files(&canonical);
    tracing::info!(count = files.len(), repo = %canonical.display(), "found indexable files");

    let mut files_indexed = 0usize;
    let mut chunks_skipped = 0usize;
    let mut chunks_deleted = 0usize;
    let mut pending: Vec<Chunk> = Vec::new();

    for abs_path in &files {
        let rel_path = abs_path
            .strip_prefix(&canonical)
            .unwrap_or(abs_path)
            .to_string_lossy()
            .replace('\\', "/");

        let chunks = match chunk_file(abs_path, &rel_path, &chunk_cfg) {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(file = %rel_path, error = %e, "could not chunk file");
                continue;
            }
        };
        if chunks.is_empty() {
            continue;
        }

        let existing = store.chunk_hashes_for_file(&rel_path)?;
        let existing_hashes: HashSet<&str> = existing.iter().map(|(_, h)| h.as_str()).collect();
        let existing_ids: HashSet<&str> = existing.iter().map(|(id, _)| id.as_str()).collect();
        let new_ids: HashSet<String> = chunks.iter().map(|c| c.chunk_id()).collect();
        let new_id_refs: HashSet<&str> = new_ids.iter().map(String::as_str).collect();

        files_indexed += 1;

        if new_id_refs != existing_ids {
            chunks_deleted += store.delete_file_chunks(&rel_path)?;
        }

        for chunk in chunks {
            if !force_rebuild && existing_hashes.contains(chunk.content_hash.as_str()) {
                chunks_skipped += 1;
                continue;
            }
            pending.push(chunk);
        }
    }

    let chunks_created = pending.len();
    let batches: Vec<Vec<Chunk>> = pending.chunks(BATCH_SIZE).map(|b| b.to_vec()).collect();
    let embedded: Vec<(Vec<Chunk>, Vec<Vec<f32>>)> = batches
        .into_par_iter()
        .map(|batch| embed_batch(batch, embedder.as_ref()))
        .collect::<Result<_, _>>()?;

    for (chunks, vectors) in embedded {
        store.upsert_chunks(&chunks, &vectors)?;
    }

    if let Some(commit) = git::current_commit(&canonical) {
        store.set_last_commit(&commit)?;
    }
    store.set_last_indexed_at(&now_iso8601())?;
    store.set_embedding_model(&config.embedding_model)?;
    store.flush()?;

    let total_chunks = store.chunk_count()?;
    let elapsed = start.elapsed().as_secs_f64();

    tracing::info!(
        repo = %canonical.display(),
        files_indexed,
        chunks_created,
        chunks_skipped,
        chunks_deleted,
        elapsed_seconds = elapsed,
        "indexing complete"
    );

    Ok(IndexStats {
        repo_path: canonical.to_string_lossy().to_string(),
        files_indexed,
        chunks_created,
        chunks_skipped_unchanged: chunks_skipped,
        chunks_deleted,
        total_chunks,
        elapsed_seconds: (elapsed * 100.0).round() / 100.0,
    })
}

fn embed_batch(chunks: Vec<Chunk>, embedder: &dyn EmbeddingProvider) -> Result<(Vec<Chunk>, Vec<Vec<f32>>), IndexerError> {
    let texts: Vec<String> = chunks.iter().map(|c| c.embedding_text()).collect();
    let vectors = embedder.embed(&texts)?;
    Ok((chunks, vectors))
}

fn now_iso8601() -> String {
    let format = time::format_description::well_known::Rfc3339;
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

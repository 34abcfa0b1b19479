use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codesight_core::{glob_match, meta_keys, repo_data_dir, Chunk};

use crate::error::StoreError;
use crate::fulltext::{ChunkRow, FullTextStore};
use crate::vector::{VectorHit, VectorStore};

/// How many extra raw candidates `vector_search` pulls from the ANN index
/// before post-filtering by `file_glob`, since usearch has no native
/// metadata filter — mirrors spec.md §4.5's "oversample, hydrate ids, keep
/// those matching a glob".
const VECTOR_GLOB_OVERSAMPLE_FACTOR: usize = 4;

/// Unified facade over the vector index and the FTS5 sidecar for one folder.
///
/// Owns `<data_dir>/<hash12>/` and coordinates both backends so callers never
/// touch `VectorStore`/`FullTextStore` directly — every write here lands in
/// both indexes or neither.
pub struct DualStore {
    vector: VectorStore,
    fulltext: FullTextStore,
    root: PathBuf,
}

impl DualStore {
    /// Open (or create) the store for `canonical_repo_path` under `data_dir`.
    ///
    /// `embedding_dim` must match the dimension of every vector later passed
    /// to `upsert_chunks`; a mismatch surfaces as `StoreError::DimensionMismatch`.
    pub fn open(data_dir: &Path, canonical_repo_path: &Path, embedding_dim: usize) -> Result<Self, StoreError> {
        let root = repo_data_dir(data_dir, canonical_repo_path);
        std::fs::create_dir_all(&root)?;

        let vector_path = root.join("lance").join("vectors.usearch");
        let vector = VectorStore::open(&vector_path, embedding_dim)?;
        let fulltext = FullTextStore::open(&root.join("metadata.db"))?;

        Ok(Self { vector, fulltext, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert or replace a batch of chunks with their embeddings in both indexes.
    pub fn upsert_chunks(&mut self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<(), StoreError> {
        debug_assert_eq!(chunks.len(), vectors.len());
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let chunk_id = chunk.chunk_id();
            self.vector.add_vector(&chunk_id, vector)?;
            self.fulltext.upsert_chunk(
                &chunk_id,
                &chunk.file_path,
                chunk.start_line,
                chunk.end_line,
                &chunk.scope,
                chunk.language,
                &chunk.content_hash,
                &chunk.content,
            )?;
        }
        Ok(())
    }

    /// Remove every chunk belonging to `file_path` from both indexes.
    /// Returns the number of chunks removed.
    pub fn delete_file_chunks(&mut self, file_path: &str) -> Result<usize, StoreError> {
        let hashes = self.fulltext.get_chunk_hashes(file_path)?;
        for (chunk_id, _hash) in &hashes {
            self.vector.remove_vector(chunk_id)?;
        }
        self.fulltext.delete_chunks_for_file(file_path)
    }

    /// `{chunk_id: content_hash}` for every currently-stored chunk of `file_path`.
    pub fn chunk_hashes_for_file(&self, file_path: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.fulltext.get_chunk_hashes(file_path)
    }

    /// k-NN vector search, optionally restricted to files matching `file_glob`.
    ///
    /// Without a glob this is a direct ANN query. With one, it oversamples
    /// the raw candidate pool, hydrates each candidate's `file_path`, and
    /// keeps only the glob matches — post-filtering, same as spec.md §4.5.
    pub fn vector_search(&self, query_vector: &[f32], top_k: usize, file_glob: Option<&str>) -> Result<Vec<VectorHit>, StoreError> {
        let Some(glob) = file_glob else {
            return self.vector.search_knn(query_vector, top_k);
        };

        let oversampled = top_k.saturating_mul(VECTOR_GLOB_OVERSAMPLE_FACTOR).max(top_k);
        let hits = self.vector.search_knn(query_vector, oversampled)?;
        if hits.is_empty() {
            return Ok(hits);
        }

        let ids: Vec<String> = hits.iter().map(|h| h.chunk_id.clone()).collect();
        let rows = self.fulltext.get_chunks_by_ids(&ids)?;
        let path_by_id: HashMap<&str, &str> =
            rows.iter().map(|r| (r.chunk_id.as_str(), r.file_path.as_str())).collect();

        Ok(hits
            .into_iter()
            .filter(|hit| {
                path_by_id
                    .get(hit.chunk_id.as_str())
                    .is_some_and(|path| glob_match(glob, path))
            })
            .take(top_k)
            .collect())
    }

    pub fn bm25_search(&self, query: &str, top_k: usize, file_glob: Option<&str>) -> Result<Vec<String>, StoreError> {
        self.fulltext.bm25_search(query, top_k, file_glob)
    }

    pub fn get_chunk_metadata(&self, chunk_ids: &[String]) -> Result<Vec<ChunkRow>, StoreError> {
        self.fulltext.get_chunks_by_ids(chunk_ids)
    }

    pub fn chunk_count(&self) -> Result<usize, StoreError> {
        self.fulltext.chunk_count()
    }

    pub fn file_count(&self) -> Result<usize, StoreError> {
        self.fulltext.file_count()
    }

    pub fn is_indexed(&self) -> Result<bool, StoreError> {
        Ok(self.chunk_count()? > 0)
    }

    pub fn embedding_model(&self) -> Result<Option<String>, StoreError> {
        self.fulltext.get_meta(meta_keys::EMBEDDING_MODEL)
    }

    pub fn set_embedding_model(&self, value: &str) -> Result<(), StoreError> {
        self.fulltext.set_meta(meta_keys::EMBEDDING_MODEL, value)
    }

    pub fn last_commit(&self) -> Result<Option<String>, StoreError> {
        self.fulltext.get_meta(meta_keys::LAST_COMMIT)
    }

    pub fn set_last_commit(&self, value: &str) -> Result<(), StoreError> {
        self.fulltext.set_meta(meta_keys::LAST_COMMIT, value)
    }

    pub fn last_indexed_at(&self) -> Result<Option<String>, StoreError> {
        self.fulltext.get_meta(meta_keys::LAST_INDEXED_AT)
    }

    pub fn set_last_indexed_at(&self, value: &str) -> Result<(), StoreError> {
        self.fulltext.set_meta(meta_keys::LAST_INDEXED_AT, value)
    }

    pub fn repo_canonical_path(&self) -> Result<Option<String>, StoreError> {
        self.fulltext.get_meta(meta_keys::REPO_CANONICAL_PATH)
    }

    pub fn set_repo_canonical_path(&self, value: &str) -> Result<(), StoreError> {
        self.fulltext.set_meta(meta_keys::REPO_CANONICAL_PATH, value)
    }

    /// Persist the vector index to disk. The FTS sidecar commits on every
    /// write already (no separate flush needed for it).
    pub fn flush(&self) -> Result<(), StoreError> {
        let vector_path = self.root.join("lance").join("vectors.usearch");
        self.vector.save(&vector_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesight_core::Language;

    fn chunk(file: &str, start: u32, end: u32, content: &str) -> Chunk {
        Chunk::new(file, start, end, "module-level", Language::Python, content)
    }

    #[test]
    fn upsert_then_search_both_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");

        let mut store = DualStore::open(&data_dir, &repo, 4).unwrap();
        let c = chunk("a.py", 1, 2, "def foo(): return needle_value");
        store.upsert_chunks(&[c.clone()], &[vec![1.0, 0.0, 0.0, 0.0]]).unwrap();

        let bm25 = store.bm25_search("needle_value", 10, None).unwrap();
        assert_eq!(bm25, vec![c.chunk_id()]);

        let vec_hits = store.vector_search(&[1.0, 0.0, 0.0, 0.0], 10, None).unwrap();
        assert_eq!(vec_hits[0].chunk_id, c.chunk_id());

        assert_eq!(store.chunk_count().unwrap(), 1);
        assert_eq!(store.file_count().unwrap(), 1);
        assert!(store.is_indexed().unwrap());
    }

    #[test]
    fn delete_file_chunks_empties_both_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");

        let mut store = DualStore::open(&data_dir, &repo, 4).unwrap();
        let c = chunk("a.py", 1, 2, "def foo(): pass");
        store.upsert_chunks(&[c], &[vec![1.0, 0.0, 0.0, 0.0]]).unwrap();

        let deleted = store.delete_file_chunks("a.py").unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.chunk_count().unwrap(), 0);
        assert!(store.vector_search(&[1.0, 0.0, 0.0, 0.0], 10, None).unwrap().is_empty());
    }

    #[test]
    fn repo_meta_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");

        let store = DualStore::open(&data_dir, &repo, 4).unwrap();
        assert_eq!(store.embedding_model().unwrap(), None);
        store.set_embedding_model("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(
            store.embedding_model().unwrap(),
            Some("sentence-transformers/all-MiniLM-L6-v2".to_string())
        );
    }

    #[test]
    fn flush_and_reopen_preserves_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");

        let c = chunk("a.py", 1, 2, "def foo(): pass");
        {
            let mut store = DualStore::open(&data_dir, &repo, 4).unwrap();
            store.upsert_chunks(&[c.clone()], &[vec![0.0, 1.0, 0.0, 0.0]]).unwrap();
            store.flush().unwrap();
        }
        let reopened = DualStore::open(&data_dir, &repo, 4).unwrap();
        let hits = reopened.vector_search(&[0.0, 1.0, 0.0, 0.0], 10, None).unwrap();
        assert_eq!(hits[0].chunk_id, c.chunk_id());
    }

    #[test]
    fn vector_search_file_glob_post_filters_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");

        let mut store = DualStore::open(&data_dir, &repo, 4).unwrap();
        let src = chunk("src/a.py", 1, 2, "def foo(): pass");
        let docs = chunk("docs/a.py", 1, 2, "def foo(): pass");
        store
            .upsert_chunks(
                &[src.clone(), docs.clone()],
                &[vec![1.0, 0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]],
            )
            .unwrap();

        let all = store.vector_search(&[1.0, 0.0, 0.0, 0.0], 10, None).unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store.vector_search(&[1.0, 0.0, 0.0, 0.0], 10, Some("src/*")).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].chunk_id, src.chunk_id());
    }
}

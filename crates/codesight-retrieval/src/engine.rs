use codesight_core::{SearchResult, BM25_CANDIDATE_MULTIPLIER};
use codesight_providers::EmbeddingProvider;
use codesight_store::DualStore;

use crate::error::RetrievalError;
use crate::rrf::rrf_merge;

const SNIPPET_MAX_CHARS: usize = 1500;
const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Combines vector k-NN and BM25 full-text retrieval over one folder's
/// `DualStore`, fusing both ranked lists with RRF before hydrating results.
pub struct HybridRetriever<'a> {
    store: &'a DualStore,
    embedder: &'a dyn EmbeddingProvider,
}

impl<'a> HybridRetriever<'a> {
    pub fn new(store: &'a DualStore, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self { store, embedder }
    }

    /// Run a hybrid search for `query`, returning up to `top_k` hydrated
    /// results ordered by fused RRF score, highest first. `file_glob`, when
    /// present, restricts both retrievers to matching `file_path`s.
    #[tracing::instrument(skip(self, query), fields(top_k))]
    pub fn search(&self, query: &str, top_k: usize, file_glob: Option<&str>) -> Result<Vec<SearchResult>, RetrievalError> {
        let candidate_count = top_k * BM25_CANDIDATE_MULTIPLIER;

        let query_vector = self.embedder.embed_query(query)?;
        let vector_hits = self.store.vector_search(&query_vector, candidate_count, file_glob)?;
        let bm25_hits = self.store.bm25_search(query, candidate_count, file_glob)?;

        if vector_hits.is_empty() && bm25_hits.is_empty() {
            tracing::debug!("no candidates from either retriever");
            return Ok(Vec::new());
        }

        let vector_ids: Vec<String> = vector_hits.into_iter().map(|hit| hit.chunk_id).collect();
        let top: Vec<(String, f64)> = rrf_merge(&[vector_ids, bm25_hits]).into_iter().take(top_k).collect();

        let ids: Vec<String> = top.iter().map(|(id, _)| id.clone()).collect();
        let rows = self.store.get_chunk_metadata(&ids)?;
        let mut by_id: std::collections::HashMap<String, codesight_store::ChunkRow> =
            rows.into_iter().map(|row| (row.chunk_id.clone(), row)).collect();

        let mut results = Vec::with_capacity(top.len());
        for (chunk_id, score) in top {
            let Some(row) = by_id.remove(&chunk_id) else {
                continue;
            };
            results.push(SearchResult {
                file_path: row.file_path,
                start_line: row.start_line,
                end_line: row.end_line,
                snippet: truncate_snippet(&row.content),
                score: round6(score),
                scope: row.scope,
                chunk_id: row.chunk_id,
            });
        }
        Ok(results)
    }
}

fn truncate_snippet(content: &str) -> String {
    let char_count = content.chars().count();
    if char_count <= SNIPPET_MAX_CHARS {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(SNIPPET_MAX_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

fn round6(score: f64) -> f64 {
    (score * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_snippet_is_unchanged() {
        assert_eq!(truncate_snippet("hello"), "hello");
    }

    #[test]
    fn long_snippet_truncates_with_marker() {
        let content = "x".repeat(1600);
        let snippet = truncate_snippet(&content);
        assert!(snippet.ends_with(TRUNCATION_MARKER));
        assert_eq!(snippet.len() - TRUNCATION_MARKER.len(), SNIPPET_MAX_CHARS);
    }

    #[test]
    fn round6_matches_six_decimal_places() {
        assert_eq!(round6(0.123_456_789), 0.123_457);
    }

    struct FixedEmbedder(Vec<f32>);

    impl EmbeddingProvider for FixedEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, codesight_providers::ProviderError> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
        fn dimension(&self) -> usize {
            self.0.len()
        }
        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    fn chunk(file: &str, start: u32, end: u32, content: &str) -> codesight_core::Chunk {
        codesight_core::Chunk::new(file, start, end, "module-level", codesight_core::Language::Python, content)
    }

    #[test]
    fn hybrid_search_merges_vector_and_bm25_hits() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");

        let mut store = DualStore::open(&data_dir, &repo, 4).unwrap();
        let vector_only = chunk("a.py", 1, 2, "def alpha(): return 1");
        let bm25_only = chunk("b.py", 1, 2, "def unrelated(): return needle_term");
        let both = chunk("c.py", 1, 2, "def needle_term_beta(): return 2");

        store
            .upsert_chunks(
                &[vector_only.clone(), bm25_only.clone(), both.clone()],
                &[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0, 0.0]],
            )
            .unwrap();

        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0, 0.0]);
        let retriever = HybridRetriever::new(&store, &embedder);
        let results = retriever.search("needle_term", 10, None).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
        assert!(ids.contains(&both.chunk_id().as_str()));
        assert_eq!(results[0].chunk_id, both.chunk_id());
    }

    #[test]
    fn empty_store_returns_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        let data_dir = dir.path().join("data");
        let store = DualStore::open(&data_dir, &repo, 4).unwrap();
        let embedder = FixedEmbedder(vec![1.0, 0.0, 0.0, 0.0]);
        let retriever = HybridRetriever::new(&store, &embedder);
        assert!(retriever.search("anything", 5, None).unwrap().is_empty());
    }
}

use std::collections::HashMap;

/// RRF smoothing constant (k in `1/(k + rank + 1)`).
pub const RRF_K: f64 = 60.0;

/// Fuse any number of independently-ranked chunk_id lists into one score per
/// chunk_id via reciprocal rank fusion, summing `1.0 / (RRF_K + rank + 1)`
/// (rank is 0-indexed) across every list the chunk_id appears in.
///
/// Ties are broken by ascending `chunk_id` so the merge is fully
/// deterministic regardless of HashMap iteration order.
pub fn rrf_merge(ranked_lists: &[Vec<String>]) -> Vec<(String, f64)> {
    let mut scores: HashMap<String, f64> = HashMap::new();
    for list in ranked_lists {
        for (rank, chunk_id) in list.iter().enumerate() {
            *scores.entry(chunk_id.clone()).or_insert(0.0) += 1.0 / (RRF_K + rank as f64 + 1.0);
        }
    }
    let mut merged: Vec<(String, f64)> = scores.into_iter().collect();
    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_yield_empty_merge() {
        assert!(rrf_merge(&[]).is_empty());
        assert!(rrf_merge(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn single_list_preserves_rank_order() {
        let merged = rrf_merge(&[vec!["a".to_string(), "b".to_string(), "c".to_string()]]);
        let ids: Vec<&str> = merged.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn chunk_present_in_both_lists_outranks_single_list_hit() {
        let vector = vec!["a".to_string(), "b".to_string()];
        let bm25 = vec!["b".to_string(), "c".to_string()];
        let merged = rrf_merge(&[vector, bm25]);
        let ids: Vec<&str> = merged.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids[0], "b");
    }

    #[test]
    fn equal_scores_tiebreak_lexicographically() {
        let merged = rrf_merge(&[vec!["zeta".to_string()], vec!["alpha".to_string()]]);
        let ids: Vec<&str> = merged.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    #[test]
    fn score_formula_matches_reciprocal_rank_fusion() {
        let merged = rrf_merge(&[vec!["a".to_string()]]);
        let expected = 1.0 / (RRF_K + 0.0 + 1.0);
        assert!((merged[0].1 - expected).abs() < 1e-12);
    }
}

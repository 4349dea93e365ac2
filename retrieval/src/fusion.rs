use crate::result::{SearchResult, SearchSource, assign_ranks};
use indexmap::IndexMap;
use log::debug;

/// Weighted fusion of vector and keyword candidate lists
#[derive(Debug, Clone, Copy)]
pub struct FusionEngine {
    vector_weight: f32,
}

impl FusionEngine {
    /// `vector_weight` applies to vector scores, the remainder to keyword scores
    pub fn new(vector_weight: f32) -> Self {
        Self { vector_weight }
    }

    /// Normalize each list by its own maximum, then sum weighted scores per path.
    ///
    /// Output is sorted by fused score descending, ties by path ascending,
    /// and is not truncated.
    pub fn fuse(
        &self,
        vector_results: Vec<SearchResult>,
        keyword_results: Vec<SearchResult>,
    ) -> Vec<SearchResult> {
        debug!(
            "Weighted fusion: {} vector + {} keyword",
            vector_results.len(),
            keyword_results.len()
        );

        let mut fused: IndexMap<String, SearchResult> = IndexMap::new();
        let lists = [
            (vector_results, self.vector_weight),
            (keyword_results, 1.0 - self.vector_weight),
        ];

        for (results, weight) in lists {
            let max = max_score(&results);
            for result in results {
                let normalized = if max > 0.0 { result.score / max } else { 0.0 };
                let contribution = weight * normalized;
                fused
                    .entry(result.document.path.clone())
                    .and_modify(|existing| existing.score += contribution)
                    .or_insert_with(|| {
                        SearchResult::new(result.document, contribution, SearchSource::Hybrid)
                    });
            }
        }

        let mut final_results: Vec<SearchResult> = fused.into_values().collect();
        sort_by_score_then_path(&mut final_results);
        assign_ranks(&mut final_results);
        final_results
    }
}

fn max_score(results: &[SearchResult]) -> f32 {
    results.iter().map(|r| r.score).fold(0.0, f32::max)
}

/// Descending score, ascending path on ties
pub fn sort_by_score_then_path(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.path().cmp(b.path()))
    });
}

/// Concatenate lists keeping the first occurrence of each path, then sort by
/// score descending. The sort is stable, so equal scores keep list order.
pub fn union_dedupe(lists: impl IntoIterator<Item = Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut merged: IndexMap<String, SearchResult> = IndexMap::new();
    for result in lists.into_iter().flatten() {
        merged.entry(result.document.path.clone()).or_insert(result);
    }

    let mut results: Vec<SearchResult> = merged.into_values().collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    assign_ranks(&mut results);
    results
}

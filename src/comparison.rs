//! Comparison candidate selection and scoring
//!
//! Picks previously rated titles from the same percentile tier as a new
//! item and ranks them by similarity, so the pairwise rating protocol
//! compares against the most relevant history.

use crate::types::{PendingItem, RatedItem};

/// Weights for the similarity score components. Relative weighting
/// matters more than the exact constants.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityWeights {
    /// Multiplier on the genre-overlap fraction.
    pub genre_weight: f64,
    /// Year-gap window; gaps beyond this contribute nothing.
    pub year_window: f64,
    /// Multiplier on the remaining year window.
    pub year_scale: f64,
    /// Base of the rating-proximity component.
    pub rating_base: f64,
    /// Penalty per point of rating difference.
    pub rating_scale: f64,
    /// Assumed release year for undated items.
    pub default_year: i32,
    /// Assumed rating when the new item carries no suggestion.
    pub default_suggested_rating: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            genre_weight: 40.0,
            year_window: 20.0,
            year_scale: 0.5,
            rating_base: 10.0,
            rating_scale: 2.0,
            default_year: 2000,
            default_suggested_rating: 7.0,
        }
    }
}

/// Selects and ranks comparison candidates. Pure functions of the input
/// collections; no I/O.
#[derive(Debug, Clone, Default)]
pub struct ComparisonEngine {
    weights: SimilarityWeights,
}

impl ComparisonEngine {
    pub fn new(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    /// Rated items inside a percentile tier, ordered by rating
    /// descending. The excluded id (a re-rated title) never appears.
    pub fn select_candidates(
        items: &[RatedItem],
        percentile_range: (u8, u8),
        exclude_id: u64,
    ) -> Vec<RatedItem> {
        let mut sorted: Vec<RatedItem> = items
            .iter()
            .filter(|i| i.id != exclude_id && i.user_rating.is_finite())
            .cloned()
            .collect();
        sorted.sort_by(|a, b| {
            b.user_rating
                .partial_cmp(&a.user_rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total = sorted.len();
        let start = ((percentile_range.0 as f64 / 100.0) * total as f64).floor() as usize;
        let end = ((percentile_range.1 as f64 / 100.0) * total as f64).ceil() as usize;
        sorted
            .get(start.min(total)..end.min(total))
            .map(|slice| slice.to_vec())
            .unwrap_or_default()
    }

    /// Weighted similarity between a rated title and the incoming item:
    /// genre overlap, release-year proximity, and rating proximity.
    pub fn similarity_score(&self, existing: &RatedItem, pending: &PendingItem) -> f64 {
        let w = &self.weights;

        let pending_genres: std::collections::HashSet<u16> =
            pending.genre_ids.iter().copied().collect();
        let overlap = existing
            .genre_ids
            .iter()
            .filter(|g| pending_genres.contains(g))
            .count();
        let genre_component =
            (overlap as f64 / pending_genres.len().max(1) as f64) * w.genre_weight;

        let pending_year = pending.release_year().unwrap_or(w.default_year);
        let existing_year = existing.release_year().unwrap_or(w.default_year);
        let year_gap = (pending_year - existing_year).abs() as f64;
        let year_component = (w.year_window - year_gap).max(0.0) * w.year_scale;

        let suggested = pending.suggested_rating.unwrap_or(w.default_suggested_rating);
        let rating_gap = (suggested - existing.user_rating).abs();
        let rating_component = (w.rating_base - rating_gap * w.rating_scale).max(0.0);

        genre_component + year_component + rating_component
    }

    /// Top N candidates by similarity to the incoming item. Stable sort:
    /// ties keep their original relative order.
    pub fn rank_best_matches(
        &self,
        candidates: &[RatedItem],
        pending: &PendingItem,
        top_n: usize,
    ) -> Vec<RatedItem> {
        let mut scored: Vec<(f64, &RatedItem)> = candidates
            .iter()
            .map(|c| (self.similarity_score(c, pending), c))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(top_n)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

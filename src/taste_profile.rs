//! Taste profile analysis
//!
//! Derives a statistical profile from a user's rating history: genre
//! and decade affinities, rating tendencies, consensus alignment, and a
//! natural-language persona. `build_profile` is a pure function of its
//! input; the analyzer wraps it with a content-keyed cache so repeated
//! calls with an unchanged collection are free.

use crate::genre_mapping::genre_name;
use crate::types::{MediaKind, RatedItem, RatingTendencies, ScoreAlignment, TasteProfile};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::debug;

/// Tier weight applied per item: loved +3, liked +1, disliked -2.
fn tier_weight(rating: f64) -> i64 {
    if rating >= 8.0 {
        3
    } else if rating >= 6.0 {
        1
    } else {
        -2
    }
}

/// Profile analyzer with a content-keyed cache.
///
/// The cache key encodes the exact (id, rating) pairs, so any change to
/// the rated collection produces a different key; stale entries are
/// never served and need no manual eviction.
#[derive(Default)]
pub struct TasteProfileAnalyzer {
    cache: DashMap<String, TasteProfile>,
}

impl TasteProfileAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a rating history, serving a cached profile when the
    /// collection is unchanged.
    ///
    /// Callers must enforce a minimum history size before invoking;
    /// an empty collection yields NaN aggregates.
    pub fn analyze(&self, items: &[RatedItem], kind: MediaKind) -> TasteProfile {
        let key = Self::cache_key(items, kind);
        if let Some(cached) = self.cache.get(&key) {
            debug!(kind = %kind, "profile cache hit");
            return cached.clone();
        }

        let profile = build_profile(items);
        self.cache.insert(key, profile.clone());
        profile
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    fn cache_key(items: &[RatedItem], kind: MediaKind) -> String {
        let mut pairs: Vec<(u64, f64)> = items.iter().map(|i| (i.id, i.user_rating)).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let encoded: Vec<String> = pairs
            .iter()
            .map(|(id, rating)| format!("{id}:{rating:.1}"))
            .collect();
        format!("profile:{}:{}", kind.as_str(), encoded.join(","))
    }
}

/// Build a taste profile from a rating history. Deterministic pure
/// function; item order is irrelevant to the output.
pub fn build_profile(items: &[RatedItem]) -> TasteProfile {
    debug_assert!(!items.is_empty(), "callers must guard against empty history");
    let total = items.len() as f64;

    let genre_affinity = genre_affinities(items);
    let decade_affinity = decade_affinities(items);
    let rating_tendencies = rating_tendencies(items, total);
    let score_alignment = score_alignment(items);

    let persona_text = persona_text(&genre_affinity, &rating_tendencies, &score_alignment);

    let average_rating = items.iter().map(|i| i.user_rating).sum::<f64>() / total;
    let max = items.iter().map(|i| i.user_rating).fold(f64::MIN, f64::max);
    let min = items.iter().map(|i| i.user_rating).fold(f64::MAX, f64::min);

    TasteProfile {
        genre_affinity,
        rating_tendencies,
        decade_affinity,
        score_alignment,
        persona_text,
        total_rated: items.len(),
        average_rating,
        rating_spread: max - min,
    }
}

fn genre_affinities(items: &[RatedItem]) -> Vec<(String, i64)> {
    let mut scores: HashMap<&'static str, i64> = HashMap::new();
    for item in items {
        let weight = tier_weight(item.user_rating);
        for genre_id in &item.genre_ids {
            *scores.entry(genre_name(*genre_id)).or_insert(0) += weight;
        }
    }
    sorted_affinities(scores)
}

fn decade_affinities(items: &[RatedItem]) -> Vec<(String, i64)> {
    let mut scores: HashMap<String, i64> = HashMap::new();
    // Items lacking any release date are excluded from this computation only.
    for item in items {
        if let Some(year) = item.release_year() {
            let decade = (year / 10) * 10;
            *scores.entry(format!("{decade}s")).or_insert(0) += tier_weight(item.user_rating);
        }
    }
    let mut sorted: Vec<(String, i64)> = scores.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

fn sorted_affinities(scores: HashMap<&'static str, i64>) -> Vec<(String, i64)> {
    let mut sorted: Vec<(String, i64)> = scores
        .into_iter()
        .map(|(name, score)| (name.to_string(), score))
        .collect();
    // Descending by score; ties break alphabetically for determinism.
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

fn rating_tendencies(items: &[RatedItem], total: f64) -> RatingTendencies {
    let count = |predicate: &dyn Fn(&RatedItem) -> bool| {
        items.iter().filter(|i| predicate(i)).count() as f64
    };

    RatingTendencies {
        is_generous_rater: count(&|i| i.user_rating >= 8.0) / total > 0.4,
        is_critical: count(&|i| i.user_rating <= 5.0) / total > 0.3,
        prefers_high_consensus: count(&|i| {
            i.external_score.is_some_and(|s| s >= 7.5) && i.user_rating >= 7.0
        }) / total
            > 0.5,
        is_contrarian: count(&|i| {
            i.external_score
                .is_some_and(|s| (s - i.user_rating).abs() > 3.0)
        }) / total
            > 0.3,
    }
}

fn score_alignment(items: &[RatedItem]) -> ScoreAlignment {
    // Items without a consensus score cannot contribute a difference to
    // the mean, but they still count against the aligned fraction: an
    // unscored item is never aligned.
    let diffs: Vec<f64> = items
        .iter()
        .filter_map(|i| i.external_score.map(|s| (s - i.user_rating).abs()))
        .collect();

    let average_abs_difference = if diffs.is_empty() {
        0.0
    } else {
        diffs.iter().sum::<f64>() / diffs.len() as f64
    };
    let aligned = diffs.iter().filter(|d| **d < 1.0).count() as f64;
    let fraction_aligned = aligned / items.len() as f64;

    let above = items
        .iter()
        .filter(|i| i.external_score.is_some_and(|s| i.user_rating > s))
        .count();

    ScoreAlignment {
        average_abs_difference,
        fraction_aligned,
        rates_above_consensus: above * 2 > items.len(),
    }
}

fn persona_text(
    genre_affinity: &[(String, i64)],
    tendencies: &RatingTendencies,
    alignment: &ScoreAlignment,
) -> String {
    let top_genres: Vec<&str> = genre_affinity
        .iter()
        .take(3)
        .map(|(name, _)| name.as_str())
        .collect();
    let disliked_genres: Vec<&str> = genre_affinity
        .iter()
        .filter(|(_, score)| *score < 0)
        .take(2)
        .map(|(name, _)| name.as_str())
        .collect();

    let mut persona = format!("Viewer who loves {}", top_genres.join(", "));

    if !disliked_genres.is_empty() {
        persona.push_str(&format!(" but dislikes {}", disliked_genres.join(", ")));
    }

    if tendencies.is_generous_rater {
        persona.push_str(". Tends to rate titles generously");
    } else if tendencies.is_critical {
        persona.push_str(". Has very high standards and rates critically");
    } else {
        persona.push_str(". Keeps a balanced rating style");
    }

    if tendencies.prefers_high_consensus {
        persona.push_str(". Appreciates critically acclaimed content");
    } else if tendencies.is_contrarian {
        persona.push_str(". Has unique taste that often differs from mainstream opinion");
    } else if alignment.fraction_aligned > 0.6 {
        persona.push_str(". Usually agrees with critical consensus");
    }

    persona
}

//! Core types for the taste engine
//!
//! Data model shared across profile analysis, comparative rating,
//! and recommendation generation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Media kind for catalog lookups and per-kind storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Plural display form used in prompt text.
    pub fn plural_noun(&self) -> &'static str {
        match self {
            Self::Movie => "movies",
            Self::Tv => "TV shows",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a stored rating came from.
///
/// Older persisted data carries an Elo-style score on a 0-1000 scale
/// instead of a direct 1-10 rating. The ambiguity is resolved once at
/// ingestion; everything downstream sees a normalized `user_rating`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum RatingSource {
    Direct(f64),
    LegacyElo(f64),
}

impl RatingSource {
    /// Normalize to the 1-10 rating scale.
    pub fn normalized(&self) -> f64 {
        match self {
            Self::Direct(value) => *value,
            Self::LegacyElo(value) => value / 100.0,
        }
    }
}

/// Sentiment tier assigned when a title is rated.
///
/// Tiers carry fixed percentile ranges over the user's historical rating
/// distribution; the numeric boundaries per tier are data-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingCategory {
    Loved,
    Liked,
    Average,
    Disliked,
}

impl RatingCategory {
    /// All tiers, in descending order.
    pub fn all() -> [RatingCategory; 4] {
        [Self::Loved, Self::Liked, Self::Average, Self::Disliked]
    }

    /// Percentile range `[low, high]` over the historical rating distribution.
    pub fn percentile_range(&self) -> (u8, u8) {
        match self {
            Self::Loved => (75, 100),
            Self::Liked => (50, 74),
            Self::Average => (25, 49),
            Self::Disliked => (0, 24),
        }
    }

    /// Fallback numeric rating for users with no history.
    pub fn default_rating(&self) -> f64 {
        match self {
            Self::Loved => 8.5,
            Self::Liked => 7.0,
            Self::Average => 5.5,
            Self::Disliked => 3.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Loved => "Loved it!",
            Self::Liked => "Liked it",
            Self::Average => "It was okay",
            Self::Disliked => "Disliked it",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Loved => "This was amazing!",
            Self::Liked => "Pretty good!",
            Self::Average => "Nothing special",
            Self::Disliked => "Not for me",
        }
    }
}

/// A title the user has scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedItem {
    /// Catalog identifier, unique per title + media kind.
    pub id: u64,
    pub title: String,
    pub media_kind: MediaKind,
    /// Always present and normalized to the 1-10 scale.
    pub user_rating: f64,
    /// Critical-consensus average, when the catalog has one.
    pub external_score: Option<f64>,
    pub external_vote_count: Option<u64>,
    pub genre_ids: Vec<u16>,
    /// Year-only dates are ingested as January 1st of that year.
    pub release_date: Option<NaiveDate>,
    /// Sentiment tier captured at rating time; absent for direct numeric entry.
    pub rating_category: Option<RatingCategory>,
}

impl RatedItem {
    /// Build a rated item, resolving the rating source once at ingestion.
    pub fn new(id: u64, title: impl Into<String>, media_kind: MediaKind, rating: RatingSource) -> Self {
        Self {
            id,
            title: title.into(),
            media_kind,
            user_rating: rating.normalized(),
            external_score: None,
            external_vote_count: None,
            genre_ids: Vec::new(),
            release_date: None,
            rating_category: None,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// A title mid-way through the rating flow: sentiment chosen, final
/// numeric rating not yet determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingItem {
    pub id: u64,
    pub title: String,
    pub media_kind: MediaKind,
    pub genre_ids: Vec<u16>,
    pub release_date: Option<NaiveDate>,
    /// Category midpoint suggested before comparisons refine it.
    pub suggested_rating: Option<f64>,
}

impl PendingItem {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// Thresholded rating-behavior flags derived from history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTendencies {
    pub is_generous_rater: bool,
    pub is_critical: bool,
    pub prefers_high_consensus: bool,
    pub is_contrarian: bool,
}

/// How the user's ratings track critical consensus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreAlignment {
    pub average_abs_difference: f64,
    pub fraction_aligned: f64,
    pub rates_above_consensus: bool,
}

/// Statistical taste profile derived from a user's rating history.
///
/// Wholly derived and never persisted; recomputed whenever the rated
/// collection changes (the profile cache is keyed by content).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    /// Genre name -> signed weighted score, descending by score.
    pub genre_affinity: Vec<(String, i64)>,
    pub rating_tendencies: RatingTendencies,
    /// Decade label (e.g. "1990s") -> signed weighted score, descending.
    pub decade_affinity: Vec<(String, i64)>,
    pub score_alignment: ScoreAlignment,
    /// One-paragraph natural-language summary.
    pub persona_text: String,
    pub total_rated: usize,
    pub average_rating: f64,
    pub rating_spread: f64,
}

/// Display and numeric metadata for one sentiment tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDescriptor {
    pub category: RatingCategory,
    pub percentile_range: (u8, u8),
    pub label: &'static str,
    pub description: &'static str,
    /// Numeric midpoint of the tier over the user's history.
    pub midpoint: f64,
    /// Numeric `[low, high]` boundary values of the tier.
    pub value_range: (f64, f64),
    /// Fixed fallback for users with no history.
    pub default_rating: f64,
}

/// Brief catalog record returned by metadata search and similar-title
/// lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSummary {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub external_score: Option<f64>,
    pub external_vote_count: Option<u64>,
    pub genre_ids: Vec<u16>,
    pub release_date: Option<NaiveDate>,
}

impl TitleSummary {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// Extended catalog record returned by the details lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleDetails {
    pub id: u64,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub external_score: Option<f64>,
    pub external_vote_count: Option<u64>,
    pub genre_ids: Vec<u16>,
    pub release_date: Option<NaiveDate>,
}

impl TitleDetails {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// Streaming provider entry from the watch-providers lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchProvider {
    pub id: u64,
    pub name: String,
}

/// A recommendation candidate ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTitle {
    pub id: u64,
    pub title: String,
    pub media_kind: MediaKind,
    pub poster_path: Option<String>,
    pub external_score: Option<f64>,
    pub external_vote_count: Option<u64>,
    pub genre_ids: Vec<u16>,
    pub release_date: Option<NaiveDate>,
    /// Title-match confidence in [0, 1]; 0 on the fallback path.
    pub ai_confidence: f64,
    /// Quality multiplier in [0.1, 1.5+]; 1.0 on the fallback path.
    pub enhanced_score: f64,
    pub is_ai_recommendation: bool,
    pub is_fallback: bool,
}

/// One entry in the bounded negative-feedback log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeFeedbackEntry {
    pub id: u64,
    pub title: String,
    pub genre_ids: Vec<u16>,
    pub external_score: Option<f64>,
    pub timestamp_ms: i64,
    pub media_kind: MediaKind,
}

/// Remaining daily quota as reported by the external tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingCalls {
    pub movie: u32,
    pub tv: u32,
    pub total: u32,
}

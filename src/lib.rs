//! Taste-profile recommendation and comparative rating engine.
//!
//! Builds taste profiles from a user's rating history, turns them into
//! language-model recommendation requests, resolves the returned titles
//! against a metadata catalog, and rates new titles through percentile
//! placement plus a three-round comparison session. All external
//! collaborators (catalog, completion, persistence, quota) sit behind
//! traits so the engine stays transport-agnostic.

pub mod cache;
pub mod comparison;
pub mod error;
pub mod feedback;
pub mod genre_mapping;
pub mod percentile;
pub mod prompt;
pub mod providers;
pub mod rate_limit;
pub mod recommendation;
pub mod session;
pub mod taste_profile;
pub mod types;

pub use comparison::{ComparisonEngine, SimilarityWeights};
pub use error::EngineError;
pub use feedback::{NegativeFeedbackStore, NotInterestedStore};
pub use percentile::{category_for_rating, dynamic_categories, midpoint_for_range};
pub use providers::{CompletionProvider, KeyValueStore, MetadataProvider, QuotaTracker};
pub use recommendation::{title_confidence, EnhancedScoreWeights, RecommendationService};
pub use session::{ChoiceOutcome, ComparisonOutcome, ComparisonSession, RoundWinner, SessionState};
pub use taste_profile::TasteProfileAnalyzer;
pub use types::*;

use std::time::Duration as StdDuration;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum rated items before any recommendation work happens
    pub min_history_for_recommendations: usize,
    /// Spacing between consecutive completion requests
    pub min_request_spacing: StdDuration,
    /// Lifetime of a cached recommendation list
    pub recommendation_ttl: chrono::Duration,
    /// Below this confidence a cleaned-title retry is attempted
    pub confidence_retry_threshold: f64,
    /// Candidates need strictly more votes than this to survive
    pub min_vote_count: u64,
    /// Final recommendation list length
    pub max_recommendations: usize,
    /// Upper bound on titles taken from one completion response
    pub max_parsed_titles: usize,
    /// Top-rated seeds used by the similar-title fallback
    pub fallback_seed_count: usize,
    /// Similar titles taken per fallback seed
    pub fallback_per_seed: usize,
    /// Final fallback list length
    pub max_fallback_results: usize,
    /// Comparison-candidate similarity weights
    pub similarity: SimilarityWeights,
    /// Candidate quality-score weights
    pub enhanced: EnhancedScoreWeights,
}

impl EngineConfig {
    /// Comparison engine carrying this configuration's similarity
    /// weights.
    pub fn comparison_engine(&self) -> ComparisonEngine {
        ComparisonEngine::new(self.similarity.clone())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_history_for_recommendations: 5,
            min_request_spacing: StdDuration::from_millis(1000),
            recommendation_ttl: chrono::Duration::hours(2),
            confidence_retry_threshold: 0.6,
            min_vote_count: 50,
            max_recommendations: 20,
            max_parsed_titles: 25,
            fallback_seed_count: 3,
            fallback_per_seed: 5,
            max_fallback_results: 10,
            similarity: SimilarityWeights::default(),
            enhanced: EnhancedScoreWeights::default(),
        }
    }
}

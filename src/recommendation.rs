//! Recommendation service
//!
//! Orchestrates the full recommendation flow: taste profiling, prompt
//! composition, the rate-limited completion call, fuzzy resolution of
//! returned titles against the metadata catalog, scoring and filtering,
//! and the similarity-based algorithmic fallback. Every external
//! failure degrades to a narrower result; the caller never sees an
//! error.

use crate::cache::{content_key, ExpiringCache};
use crate::error::EngineError;
use crate::feedback::NegativeFeedbackStore;
use crate::prompt::{build_prompt, parse_titles, SYSTEM_INSTRUCTION};
use crate::providers::{CompletionProvider, KeyValueStore, MetadataProvider, QuotaTracker};
use crate::rate_limit::RequestPacer;
use crate::taste_profile::TasteProfileAnalyzer;
use crate::types::{MediaKind, RatedItem, RecommendedTitle, TitleDetails, TitleSummary};
use crate::EngineConfig;
use anyhow::{bail, Context, Result};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Bonuses and penalties composing a candidate's quality multiplier.
/// Relative weighting matters more than the exact constants.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedScoreWeights {
    pub acclaimed_score: f64,
    pub acclaimed_votes: u64,
    pub acclaimed_bonus: f64,
    pub standout_score: f64,
    pub standout_votes: u64,
    pub standout_bonus: f64,
    pub recent_year: i32,
    pub very_recent_year: i32,
    pub recency_bonus: f64,
    pub dated_year: i32,
    pub dated_score: f64,
    pub dated_penalty: f64,
    pub floor: f64,
}

impl Default for EnhancedScoreWeights {
    fn default() -> Self {
        Self {
            acclaimed_score: 7.0,
            acclaimed_votes: 500,
            acclaimed_bonus: 0.3,
            standout_score: 8.0,
            standout_votes: 1000,
            standout_bonus: 0.2,
            recent_year: 2020,
            very_recent_year: 2022,
            recency_bonus: 0.1,
            dated_year: 2000,
            dated_score: 6.5,
            dated_penalty: 0.2,
            floor: 0.1,
        }
    }
}

/// Personalized recommendation orchestrator.
///
/// Owns its caches and pacing state explicitly; construct one instance
/// and share it rather than relying on ambient globals.
pub struct RecommendationService {
    config: EngineConfig,
    metadata: Arc<dyn MetadataProvider>,
    completion: Arc<dyn CompletionProvider>,
    quota: Arc<dyn QuotaTracker>,
    feedback: NegativeFeedbackStore,
    profiles: TasteProfileAnalyzer,
    cache: ExpiringCache<Vec<RecommendedTitle>>,
    pacer: RequestPacer,
}

impl RecommendationService {
    pub fn new(
        config: EngineConfig,
        metadata: Arc<dyn MetadataProvider>,
        completion: Arc<dyn CompletionProvider>,
        quota: Arc<dyn QuotaTracker>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let pacer = RequestPacer::new(config.min_request_spacing);
        Self {
            config,
            metadata,
            completion,
            quota,
            feedback: NegativeFeedbackStore::new(store),
            profiles: TasteProfileAnalyzer::new(),
            cache: ExpiringCache::new(),
            pacer,
        }
    }

    /// Personalized recommendations for a rating history.
    ///
    /// Fewer than the minimum rated items returns empty without any
    /// external call. Completion-path failures fall back to the
    /// similar-title recommender; fallback failures yield an empty
    /// list. Candidates in any of the exclusion sets are removed from
    /// both paths.
    pub async fn get_recommendations(
        &self,
        rated: &[RatedItem],
        kind: MediaKind,
        seen_ids: &HashSet<u64>,
        watchlist_ids: &HashSet<u64>,
        excluded_ids: &HashSet<u64>,
    ) -> Vec<RecommendedTitle> {
        if rated.len() < self.config.min_history_for_recommendations {
            info!(
                rated = rated.len(),
                needed = self.config.min_history_for_recommendations,
                "insufficient history for recommendations"
            );
            return Vec::new();
        }

        let results = match self.completion_recommendations(rated, kind).await {
            Ok(results) => results,
            Err(err) => {
                warn!(kind = %kind, error = %err, "completion path failed, using similar-title fallback");
                match self.fallback_recommendations(rated, kind).await {
                    Ok(results) => results,
                    Err(err) => {
                        error!(kind = %kind, error = %err, "fallback recommendations failed");
                        Vec::new()
                    }
                }
            }
        };

        results
            .into_iter()
            .filter(|r| {
                !seen_ids.contains(&r.id)
                    && !watchlist_ids.contains(&r.id)
                    && !excluded_ids.contains(&r.id)
            })
            .collect()
    }

    /// Drop cached profiles and recommendation lists. Exposed for test
    /// isolation and explicit refresh.
    pub fn clear_cache(&self) {
        self.profiles.clear();
        self.cache.clear();
    }

    async fn completion_recommendations(
        &self,
        rated: &[RatedItem],
        kind: MediaKind,
    ) -> Result<Vec<RecommendedTitle>> {
        if !self.quota.can_call(kind).await? {
            if let Ok(remaining) = self.quota.remaining_calls().await {
                info!(
                    kind = %kind,
                    movie = remaining.movie,
                    tv = remaining.tv,
                    total = remaining.total,
                    "daily completion quota exhausted"
                );
            }
            bail!(EngineError::QuotaExceeded { kind });
        }

        self.pacer.pace().await;

        let profile = self.profiles.analyze(rated, kind);
        let cache_key = recommendation_cache_key(kind, &profile)?;
        if let Some(cached) = self.cache.get(&cache_key) {
            info!(kind = %kind, "serving cached recommendations");
            return Ok(cached);
        }

        let negative = self.feedback.load(kind).await;
        let prompt = build_prompt(&profile, rated, &negative, kind);
        debug!(kind = %kind, prompt_len = prompt.len(), "requesting completion");

        let response = self
            .completion
            .complete(SYSTEM_INSTRUCTION, &prompt)
            .await
            .context("completion request failed")?;

        let titles = parse_titles(&response, self.config.max_parsed_titles);
        if titles.is_empty() {
            bail!(EngineError::EmptyCompletion);
        }
        debug!(kind = %kind, candidates = titles.len(), "parsed candidate titles");

        let results = self.resolve_titles(&titles, kind).await;

        self.quota
            .increment_call_count(kind)
            .await
            .context("failed to record quota usage")?;

        // Cached pre-exclusion so different exclusion sets share the entry.
        self.cache
            .insert(cache_key, results.clone(), self.config.recommendation_ttl);

        Ok(results)
    }

    /// Resolve candidate title strings against the catalog concurrently,
    /// then filter, score, and rank. Per-candidate failures drop that
    /// candidate only.
    async fn resolve_titles(&self, titles: &[String], kind: MediaKind) -> Vec<RecommendedTitle> {
        let lookups = titles.iter().map(|title| self.resolve_title(title, kind));
        let resolved = join_all(lookups).await;

        let mut results: Vec<RecommendedTitle> = resolved
            .into_iter()
            .flatten()
            .filter(|r| r.external_vote_count.unwrap_or(0) > self.config.min_vote_count)
            .collect();

        results.sort_by(|a, b| {
            let rank_a = a.ai_confidence * a.enhanced_score;
            let rank_b = b.ai_confidence * b.enhanced_score;
            rank_b
                .partial_cmp(&rank_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.config.max_recommendations);
        results
    }

    async fn resolve_title(&self, title: &str, kind: MediaKind) -> Option<RecommendedTitle> {
        match self.try_resolve_title(title, kind).await {
            Ok(result) => result,
            Err(err) => {
                debug!(title, error = %err, "dropping unresolvable candidate");
                None
            }
        }
    }

    async fn try_resolve_title(
        &self,
        title: &str,
        kind: MediaKind,
    ) -> Result<Option<RecommendedTitle>> {
        let mut best = self.metadata.search(title, kind).await?.into_iter().next();
        let mut confidence = best
            .as_ref()
            .map(|m| title_confidence(title, &m.title))
            .unwrap_or(0.0);

        // One retry with punctuation stripped, keeping whichever match
        // scores higher.
        if confidence < self.config.confidence_retry_threshold {
            let cleaned = strip_punctuation(title);
            if !cleaned.is_empty() && cleaned != title {
                if let Some(alt) = self
                    .metadata
                    .search(&cleaned, kind)
                    .await?
                    .into_iter()
                    .next()
                {
                    let alt_confidence = title_confidence(title, &alt.title);
                    if alt_confidence > confidence {
                        best = Some(alt);
                        confidence = alt_confidence;
                    }
                }
            }
        }

        let Some(summary) = best else {
            return Ok(None);
        };
        if summary.poster_path.is_none() {
            debug!(title, "dropping candidate without poster");
            return Ok(None);
        }

        let details = self.metadata.details(summary.id, kind).await?;
        Ok(Some(self.build_candidate(summary, details, kind, confidence)))
    }

    fn build_candidate(
        &self,
        summary: TitleSummary,
        details: TitleDetails,
        kind: MediaKind,
        confidence: f64,
    ) -> RecommendedTitle {
        let external_score = details.external_score.or(summary.external_score);
        let vote_count = details.external_vote_count.or(summary.external_vote_count);
        let release_date = details.release_date.or(summary.release_date);
        let genre_ids = if details.genre_ids.is_empty() {
            summary.genre_ids
        } else {
            details.genre_ids
        };
        let year = release_date.map(|d| chrono::Datelike::year(&d));
        let enhanced = enhanced_score(&self.config.enhanced, external_score, vote_count, year);

        RecommendedTitle {
            id: summary.id,
            title: details.title,
            media_kind: kind,
            poster_path: details.poster_path.or(summary.poster_path),
            external_score,
            external_vote_count: vote_count,
            genre_ids,
            release_date,
            ai_confidence: confidence,
            enhanced_score: enhanced,
            is_ai_recommendation: true,
            is_fallback: false,
        }
    }

    /// Algorithmic fallback: similar titles to the user's top-rated
    /// seeds, merged and de-duplicated in seed order.
    async fn fallback_recommendations(
        &self,
        rated: &[RatedItem],
        kind: MediaKind,
    ) -> Result<Vec<RecommendedTitle>> {
        let mut seeds: Vec<&RatedItem> = rated.iter().filter(|i| i.user_rating >= 7.0).collect();
        seeds.sort_by(|a, b| {
            b.user_rating
                .partial_cmp(&a.user_rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        seeds.truncate(self.config.fallback_seed_count);

        let lookups = seeds.iter().map(|seed| async {
            match self.metadata.similar(seed.id, kind).await {
                Ok(similar) => similar
                    .into_iter()
                    .take(self.config.fallback_per_seed)
                    .collect(),
                Err(err) => {
                    debug!(seed_id = seed.id, error = %err, "similar-title lookup failed");
                    Vec::new()
                }
            }
        });
        let batches: Vec<Vec<TitleSummary>> = join_all(lookups).await;

        let mut unique_ids = HashSet::new();
        let mut results: Vec<RecommendedTitle> = batches
            .into_iter()
            .flatten()
            .filter(|summary| unique_ids.insert(summary.id))
            .map(|summary| RecommendedTitle {
                id: summary.id,
                title: summary.title,
                media_kind: kind,
                poster_path: summary.poster_path,
                external_score: summary.external_score,
                external_vote_count: summary.external_vote_count,
                genre_ids: summary.genre_ids,
                release_date: summary.release_date,
                ai_confidence: 0.0,
                enhanced_score: 1.0,
                is_ai_recommendation: false,
                is_fallback: true,
            })
            .collect();

        results.truncate(self.config.max_fallback_results);
        info!(kind = %kind, count = results.len(), "serving fallback recommendations");
        Ok(results)
    }
}

fn recommendation_cache_key(
    kind: MediaKind,
    profile: &crate::types::TasteProfile,
) -> Result<String> {
    let serialized = serde_json::to_string(profile).context("failed to serialize taste profile")?;
    // A truncated serialization is enough to distinguish profiles while
    // keeping the hashed payload small.
    let truncated: String = serialized.chars().take(100).collect();
    content_key("recs", &(kind.as_str(), truncated))
}

/// Match confidence between a requested title and a catalog result.
///
/// Exact case-insensitive match scores 1.0, substring containment 0.9,
/// otherwise token overlap (tokens longer than 2 chars, exact or
/// substring matches) over the larger token count, capped at 0.8.
pub fn title_confidence(original: &str, found: &str) -> f64 {
    if original.is_empty() || found.is_empty() {
        return 0.0;
    }

    let original = original.to_lowercase();
    let found = found.to_lowercase();
    let original = original.trim();
    let found = found.trim();

    if original == found {
        return 1.0;
    }
    if found.contains(original) || original.contains(found) {
        return 0.9;
    }

    let original_tokens: Vec<&str> = original.split_whitespace().filter(|w| w.len() > 2).collect();
    let found_tokens: Vec<&str> = found.split_whitespace().filter(|w| w.len() > 2).collect();

    let mut common = 0usize;
    for original_token in &original_tokens {
        for found_token in &found_tokens {
            if original_token == found_token
                || original_token.contains(found_token)
                || found_token.contains(original_token)
            {
                common += 1;
            }
        }
    }

    let max_tokens = original_tokens.len().max(found_tokens.len());
    if max_tokens == 0 {
        return 0.0;
    }
    (common as f64 / max_tokens as f64).min(0.8)
}

/// Quality multiplier from consensus score, vote count, and recency.
fn enhanced_score(
    w: &EnhancedScoreWeights,
    external_score: Option<f64>,
    vote_count: Option<u64>,
    release_year: Option<i32>,
) -> f64 {
    let score = external_score.unwrap_or(0.0);
    let votes = vote_count.unwrap_or(0);
    let year = release_year.unwrap_or(w.dated_year);

    let mut result = 1.0;
    if score >= w.acclaimed_score && votes >= w.acclaimed_votes {
        result += w.acclaimed_bonus;
    }
    if score >= w.standout_score && votes >= w.standout_votes {
        result += w.standout_bonus;
    }
    if year >= w.recent_year {
        result += w.recency_bonus;
    }
    if year >= w.very_recent_year {
        result += w.recency_bonus;
    }
    if year < w.dated_year && score < w.dated_score {
        result -= w.dated_penalty;
    }
    result.max(w.floor)
}

fn strip_punctuation(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

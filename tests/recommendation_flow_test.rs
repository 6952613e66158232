//! End-to-end recommendation flow against in-memory collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use cinetaste_engine::{
    CompletionProvider, EngineConfig, KeyValueStore, MediaKind, MetadataProvider, QuotaTracker,
    RatedItem, RatingSource, RecommendationService, RemainingCalls, TitleDetails, TitleSummary,
    WatchProvider,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Catalog stub keyed by lowercased title. Counts lookups so tests can
/// assert which paths made external calls.
#[derive(Default)]
struct StubCatalog {
    by_title: HashMap<String, TitleSummary>,
    details: HashMap<u64, TitleDetails>,
    similar: HashMap<u64, Vec<TitleSummary>>,
    search_calls: AtomicUsize,
    similar_calls: AtomicUsize,
}

impl StubCatalog {
    fn insert(&mut self, summary: TitleSummary) {
        let details = TitleDetails {
            id: summary.id,
            title: summary.title.clone(),
            overview: None,
            poster_path: summary.poster_path.clone(),
            external_score: summary.external_score,
            external_vote_count: summary.external_vote_count,
            genre_ids: summary.genre_ids.clone(),
            release_date: summary.release_date,
        };
        self.details.insert(summary.id, details);
        self.by_title.insert(summary.title.to_lowercase(), summary);
    }
}

#[async_trait]
impl MetadataProvider for StubCatalog {
    async fn search(&self, title: &str, _kind: MediaKind) -> anyhow::Result<Vec<TitleSummary>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .by_title
            .get(&title.to_lowercase())
            .cloned()
            .into_iter()
            .collect())
    }

    async fn details(&self, id: u64, _kind: MediaKind) -> anyhow::Result<TitleDetails> {
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown title {id}"))
    }

    async fn similar(&self, id: u64, _kind: MediaKind) -> anyhow::Result<Vec<TitleSummary>> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.similar.get(&id).cloned().unwrap_or_default())
    }

    async fn watch_providers(
        &self,
        _id: u64,
        _kind: MediaKind,
    ) -> anyhow::Result<Vec<WatchProvider>> {
        Ok(Vec::new())
    }
}

struct StubCompletion {
    response: Option<String>,
    calls: AtomicUsize,
}

impl StubCompletion {
    fn returning(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for StubCompletion {
    async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| anyhow::anyhow!("completion backend unavailable"))
    }
}

struct StubQuota {
    allowed: bool,
    increments: AtomicUsize,
}

impl StubQuota {
    fn allowing(allowed: bool) -> Self {
        Self {
            allowed,
            increments: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuotaTracker for StubQuota {
    async fn can_call(&self, _kind: MediaKind) -> anyhow::Result<bool> {
        Ok(self.allowed)
    }

    async fn increment_call_count(&self, _kind: MediaKind) -> anyhow::Result<()> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remaining_calls(&self) -> anyhow::Result<RemainingCalls> {
        Ok(RemainingCalls {
            movie: if self.allowed { 5 } else { 0 },
            tv: if self.allowed { 5 } else { 0 },
            total: if self.allowed { 10 } else { 0 },
        })
    }
}

fn rated(id: u64, title: &str, rating: f64) -> RatedItem {
    RatedItem::new(id, title, MediaKind::Movie, RatingSource::Direct(rating))
}

fn catalog_title(id: u64, title: &str, score: f64, votes: u64, year: i32) -> TitleSummary {
    TitleSummary {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/poster-{id}.jpg")),
        external_score: Some(score),
        external_vote_count: Some(votes),
        genre_ids: vec![18],
        release_date: NaiveDate::from_ymd_opt(year, 1, 1),
    }
}

fn history() -> Vec<RatedItem> {
    vec![
        rated(1, "Heat", 9.0),
        rated(2, "Collateral", 8.0),
        rated(3, "Thief", 7.5),
        rated(4, "Blackhat", 5.0),
        rated(5, "Miami Vice", 6.0),
    ]
}

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.min_request_spacing = std::time::Duration::from_millis(0);
    config
}

fn service(
    catalog: Arc<StubCatalog>,
    completion: Arc<StubCompletion>,
    quota: Arc<StubQuota>,
) -> RecommendationService {
    RecommendationService::new(
        fast_config(),
        catalog,
        completion,
        quota,
        Arc::new(MemoryStore::default()),
    )
}

#[tokio::test]
async fn short_history_returns_empty_without_external_calls() {
    let catalog = Arc::new(StubCatalog::default());
    let completion = Arc::new(StubCompletion::returning("Ronin"));
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog.clone(), completion.clone(), quota);

    let results = svc
        .get_recommendations(
            &history()[..3],
            MediaKind::Movie,
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        )
        .await;

    assert!(results.is_empty());
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    assert_eq!(catalog.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn completion_titles_are_resolved_filtered_and_ranked() {
    let mut catalog = StubCatalog::default();
    catalog.insert(catalog_title(101, "Ronin", 7.2, 900, 1998));
    catalog.insert(catalog_title(102, "Drive", 8.1, 2000, 2021));
    // Too few votes to survive filtering.
    catalog.insert(catalog_title(103, "Obscure Gem", 8.0, 30, 2022));
    let catalog = Arc::new(catalog);

    let completion = Arc::new(StubCompletion::returning(
        "1. Ronin\n2. Drive\n3. Obscure Gem\n4. Unknown Title",
    ));
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog.clone(), completion, quota.clone());

    let results = svc
        .get_recommendations(
            &history(),
            MediaKind::Movie,
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        )
        .await;

    let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
    // Drive carries acclaim and recency bonuses so it outranks Ronin.
    assert_eq!(ids, vec![102, 101]);
    assert!(results.iter().all(|r| r.is_ai_recommendation));
    assert!(results.iter().all(|r| r.ai_confidence == 1.0));
    assert_eq!(quota.increments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_request_is_served_from_cache() {
    let mut catalog = StubCatalog::default();
    catalog.insert(catalog_title(101, "Ronin", 7.2, 900, 1998));
    let catalog = Arc::new(catalog);

    let completion = Arc::new(StubCompletion::returning("Ronin"));
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog.clone(), completion.clone(), quota);

    for _ in 0..2 {
        let results = svc
            .get_recommendations(
                &history(),
                MediaKind::Movie,
                &HashSet::new(),
                &HashSet::new(),
                &HashSet::new(),
            )
            .await;
        assert_eq!(results.len(), 1);
    }

    assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clear_cache_forces_a_fresh_completion() {
    let mut catalog = StubCatalog::default();
    catalog.insert(catalog_title(101, "Ronin", 7.2, 900, 1998));
    let catalog = Arc::new(catalog);

    let completion = Arc::new(StubCompletion::returning("Ronin"));
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog.clone(), completion.clone(), quota);

    let exclusions = HashSet::new();
    svc.get_recommendations(&history(), MediaKind::Movie, &exclusions, &exclusions, &exclusions)
        .await;
    svc.clear_cache();
    svc.get_recommendations(&history(), MediaKind::Movie, &exclusions, &exclusions, &exclusions)
        .await;

    assert_eq!(completion.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn quota_exhaustion_falls_back_to_similar_titles() {
    let mut catalog = StubCatalog::default();
    catalog.similar.insert(
        1,
        vec![
            catalog_title(201, "Ronin", 7.2, 900, 1998),
            catalog_title(202, "The Driver", 7.0, 400, 1978),
        ],
    );
    catalog
        .similar
        .insert(2, vec![catalog_title(201, "Ronin", 7.2, 900, 1998)]);
    let catalog = Arc::new(catalog);

    let completion = Arc::new(StubCompletion::returning("Ronin"));
    let quota = Arc::new(StubQuota::allowing(false));
    let svc = service(catalog.clone(), completion.clone(), quota);

    let results = svc
        .get_recommendations(
            &history(),
            MediaKind::Movie,
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        )
        .await;

    // De-duplicated across seeds, flagged as fallback, no completion call.
    let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![201, 202]);
    assert!(results.iter().all(|r| r.is_fallback));
    assert!(results.iter().all(|r| !r.is_ai_recommendation));
    assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    // One similar-title lookup per top-rated seed.
    assert_eq!(catalog.similar_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn completion_failure_falls_back_to_similar_titles() {
    let mut catalog = StubCatalog::default();
    catalog
        .similar
        .insert(1, vec![catalog_title(201, "Ronin", 7.2, 900, 1998)]);
    let catalog = Arc::new(catalog);

    let completion = Arc::new(StubCompletion::failing());
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog.clone(), completion, quota);

    let results = svc
        .get_recommendations(
            &history(),
            MediaKind::Movie,
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        )
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_fallback);
}

#[tokio::test]
async fn fallback_with_no_seed_data_yields_empty() {
    let catalog = Arc::new(StubCatalog::default());
    let completion = Arc::new(StubCompletion::failing());
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog, completion, quota);

    let results = svc
        .get_recommendations(
            &history(),
            MediaKind::Movie,
            &HashSet::new(),
            &HashSet::new(),
            &HashSet::new(),
        )
        .await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn exclusion_sets_filter_both_paths() {
    let mut catalog = StubCatalog::default();
    catalog.insert(catalog_title(101, "Ronin", 7.2, 900, 1998));
    catalog.insert(catalog_title(102, "Drive", 8.1, 2000, 2021));
    let catalog = Arc::new(catalog);

    let completion = Arc::new(StubCompletion::returning("Ronin\nDrive"));
    let quota = Arc::new(StubQuota::allowing(true));
    let svc = service(catalog, completion, quota);

    let seen: HashSet<u64> = [101].into_iter().collect();
    let excluded: HashSet<u64> = [102].into_iter().collect();
    let results = svc
        .get_recommendations(&history(), MediaKind::Movie, &seen, &HashSet::new(), &excluded)
        .await;

    assert!(results.is_empty());
}

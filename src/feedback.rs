//! Negative-feedback and not-interested persistence
//!
//! Two small stores over the external key-value interface: a bounded
//! append log of rejected recommendations consumed by prompt building,
//! and a permanent per-kind set of ids the user never wants to see.
//! Malformed persisted data is treated as empty, never surfaced as an
//! error.

use crate::providers::KeyValueStore;
use crate::types::{MediaKind, NegativeFeedbackEntry};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const NEGATIVE_FEEDBACK_PREFIX: &str = "ai_negative_feedback_";
const NOT_INTERESTED_PREFIX: &str = "not_interested_";

/// Maximum retained negative-feedback entries per media kind; oldest
/// entries are evicted first.
pub const NEGATIVE_FEEDBACK_CAP: usize = 100;

/// Bounded FIFO log of items the user rejected.
#[derive(Clone)]
pub struct NegativeFeedbackStore {
    store: Arc<dyn KeyValueStore>,
}

impl NegativeFeedbackStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(kind: MediaKind) -> String {
        format!("{NEGATIVE_FEEDBACK_PREFIX}{kind}")
    }

    /// Append an entry, evicting the oldest past the cap. Storage
    /// failures are logged and swallowed; feedback is advisory data.
    pub async fn record(&self, entry: NegativeFeedbackEntry) {
        let kind = entry.media_kind;
        let mut entries = self.load(kind).await;
        entries.push(entry);
        if entries.len() > NEGATIVE_FEEDBACK_CAP {
            let excess = entries.len() - NEGATIVE_FEEDBACK_CAP;
            entries.drain(..excess);
        }

        match serde_json::to_string(&entries) {
            Ok(json) => {
                if let Err(err) = self.store.set(&Self::key(kind), &json).await {
                    warn!(kind = %kind, error = %err, "failed to persist negative feedback");
                }
            }
            Err(err) => warn!(kind = %kind, error = %err, "failed to serialize negative feedback"),
        }
    }

    /// Load the log for a media kind; absent or corrupt data is empty.
    pub async fn load(&self, kind: MediaKind) -> Vec<NegativeFeedbackEntry> {
        let raw = match self.store.get(&Self::key(kind)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(kind = %kind, error = %err, "failed to read negative feedback");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(kind = %kind, error = %err, "corrupt negative feedback data, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Permanent per-kind set of item ids to hide from all surfaces.
#[derive(Clone)]
pub struct NotInterestedStore {
    store: Arc<dyn KeyValueStore>,
}

impl NotInterestedStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(kind: MediaKind) -> String {
        format!("{NOT_INTERESTED_PREFIX}{kind}")
    }

    /// Add an id to the set. Idempotent: recording an already-present
    /// id persists nothing.
    pub async fn record(&self, item_id: u64, kind: MediaKind) {
        let mut ids = self.load_ordered(kind).await;
        if ids.contains(&item_id) {
            debug!(item_id, kind = %kind, "already marked not interested");
            return;
        }
        ids.push(item_id);

        match serde_json::to_string(&ids) {
            Ok(json) => {
                if let Err(err) = self.store.set(&Self::key(kind), &json).await {
                    warn!(kind = %kind, error = %err, "failed to persist not-interested list");
                }
            }
            Err(err) => warn!(kind = %kind, error = %err, "failed to serialize not-interested list"),
        }
    }

    /// The persisted id set; absent or corrupt data is empty.
    pub async fn load(&self, kind: MediaKind) -> HashSet<u64> {
        self.load_ordered(kind).await.into_iter().collect()
    }

    async fn load_ordered(&self, kind: MediaKind) -> Vec<u64> {
        let raw = match self.store.get(&Self::key(kind)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(kind = %kind, error = %err, "failed to read not-interested list");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(kind = %kind, error = %err, "corrupt not-interested data, treating as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.data.lock().await.insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }
    }

    fn entry(id: u64) -> NegativeFeedbackEntry {
        NegativeFeedbackEntry {
            id,
            title: format!("Reject {id}"),
            genre_ids: vec![28],
            external_score: Some(6.0),
            timestamp_ms: id as i64,
            media_kind: MediaKind::Movie,
        }
    }

    #[tokio::test]
    async fn negative_feedback_evicts_oldest_past_cap() {
        let store = NegativeFeedbackStore::new(Arc::new(MemoryStore::default()));
        for id in 0..110 {
            store.record(entry(id)).await;
        }

        let entries = store.load(MediaKind::Movie).await;
        assert_eq!(entries.len(), NEGATIVE_FEEDBACK_CAP);
        // Oldest entries evicted first: 0..10 are gone.
        assert_eq!(entries.first().map(|e| e.id), Some(10));
        assert_eq!(entries.last().map(|e| e.id), Some(109));
    }

    #[tokio::test]
    async fn negative_feedback_is_partitioned_by_media_kind() {
        let store = NegativeFeedbackStore::new(Arc::new(MemoryStore::default()));
        store.record(entry(1)).await;

        assert_eq!(store.load(MediaKind::Movie).await.len(), 1);
        assert!(store.load(MediaKind::Tv).await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_data_is_treated_as_empty() {
        let backing = Arc::new(MemoryStore::default());
        backing
            .set("ai_negative_feedback_movie", "not json {")
            .await
            .unwrap();
        backing.set("not_interested_movie", "[1, \"x\"]").await.unwrap();

        let feedback = NegativeFeedbackStore::new(backing.clone());
        assert!(feedback.load(MediaKind::Movie).await.is_empty());

        let not_interested = NotInterestedStore::new(backing);
        assert!(not_interested.load(MediaKind::Movie).await.is_empty());
    }

    #[tokio::test]
    async fn not_interested_roundtrip_is_idempotent() {
        let store = NotInterestedStore::new(Arc::new(MemoryStore::default()));
        store.record(42, MediaKind::Tv).await;
        store.record(42, MediaKind::Tv).await;
        store.record(7, MediaKind::Tv).await;

        let ids = store.load(MediaKind::Tv).await;
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&42));
        assert!(ids.contains(&7));

        // Other media kind is untouched.
        assert!(store.load(MediaKind::Movie).await.is_empty());
    }
}

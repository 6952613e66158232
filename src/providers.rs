//! External collaborator interfaces
//!
//! The engine consumes metadata lookup, text completion, key-value
//! persistence, and daily-quota tracking as trait objects. Implementations
//! live outside the core; tests supply in-memory versions.

use crate::types::{MediaKind, RemainingCalls, TitleDetails, TitleSummary, WatchProvider};
use anyhow::Result;
use async_trait::async_trait;

/// Media-catalog query interface (search, details, similar titles,
/// streaming availability).
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Title search, best matches first.
    async fn search(&self, title: &str, kind: MediaKind) -> Result<Vec<TitleSummary>>;

    /// Extended record for a known catalog id.
    async fn details(&self, id: u64, kind: MediaKind) -> Result<TitleDetails>;

    /// Titles the catalog considers similar to a known id.
    async fn similar(&self, id: u64, kind: MediaKind) -> Result<Vec<TitleSummary>>;

    /// Streaming providers carrying a known id.
    async fn watch_providers(&self, id: u64, kind: MediaKind) -> Result<Vec<WatchProvider>>;
}

/// Single-turn text completion interface. No conversation state.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_prompt: &str) -> Result<String>;
}

/// String key-value persistence used for feedback logs and
/// not-interested sets.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// External daily-limit enforcement for completion calls. Not owned by
/// the engine; the engine only consults and increments it.
#[async_trait]
pub trait QuotaTracker: Send + Sync {
    async fn can_call(&self, kind: MediaKind) -> Result<bool>;
    async fn increment_call_count(&self, kind: MediaKind) -> Result<()>;
    async fn remaining_calls(&self) -> Result<RemainingCalls>;
}

//! Engine error types
//!
//! External-collaborator failures never propagate to callers as hard
//! errors; these variants exist so internal paths can route to the
//! fallback with a typed reason.

use crate::types::MediaKind;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("daily completion quota exhausted for {kind}")]
    QuotaExceeded { kind: MediaKind },

    #[error("completion response contained no usable titles")]
    EmptyCompletion,

    #[error("comparison session requires exactly {expected} candidates, got {got}")]
    InsufficientCandidates { expected: usize, got: usize },

    #[error("storage operation failed: {0}")]
    Storage(String),
}

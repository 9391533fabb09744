//! Error taxonomy for the interview engine.
//!
//! Five domain categories with distinct propagation policies:
//!
//! - [`VivaError::NotFound`]: fatal to the operation, raised before any
//!   state transition is attempted
//! - [`VivaError::InvalidTransition`]: state machine misuse; names the
//!   current state and the allowed set, never corrupts orchestrator state
//! - [`VivaError::RetrievalDegraded`]: exemplar embedding/search failure;
//!   recovered locally (fail-open to zero exemplars)
//! - [`VivaError::PersistenceDegraded`]: embedding-storage-only failure;
//!   recovered locally (logged, progression continues)
//! - [`VivaError::GenerationFailure`]: question/evaluation generation
//!   failure; surfaced to the client as an `error` event, orchestrator
//!   stays in its pre-failure state

use thiserror::Error;

/// Top-level error type for the interview engine.
#[derive(Debug, Error)]
pub enum VivaError {
    /// An entity required by the operation does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"interview"` or `"question"`.
        entity: &'static str,
        /// The missing entity's ID.
        id: String,
    },

    /// The session state machine rejected an operation.
    #[error("operation `{operation}` invalid in state `{current}` (allowed: {allowed})")]
    InvalidTransition {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the session was in.
        current: String,
        /// Comma-separated states in which the operation is valid.
        allowed: String,
    },

    /// Exemplar embedding or similarity search failed. Non-fatal; callers
    /// recover by proceeding with zero exemplars.
    #[error("exemplar retrieval degraded: {0}")]
    RetrievalDegraded(String),

    /// Best-effort embedding storage failed. Non-fatal; the primary
    /// Answer/Evaluation writes already succeeded.
    #[error("embedding persistence degraded: {0}")]
    PersistenceDegraded(String),

    /// The generation service failed or timed out. Fatal to the current
    /// step; the session remains in its pre-failure state.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// A primary persistence operation failed.
    #[error("storage error: {0}")]
    Store(String),

    /// Invariant violation or unexpected internal condition.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VivaError {
    /// Convenience constructor for [`VivaError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Machine-readable code used in `error` events and logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RetrievalDegraded(_) => "retrieval_degraded",
            Self::PersistenceDegraded(_) => "persistence_degraded",
            Self::GenerationFailure(_) => "generation_failure",
            Self::Store(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the error halts the current operation. Degraded variants
    /// are recovered locally and never abort progression.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::RetrievalDegraded(_) | Self::PersistenceDegraded(_)
        )
    }
}

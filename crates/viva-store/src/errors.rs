//! Error types for the persistence layer.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Requested interview was not found.
    #[error("interview not found: {0}")]
    InterviewNotFound(String),

    /// Requested question was not found.
    #[error("question not found: {0}")]
    QuestionNotFound(String),

    /// Requested answer was not found.
    #[error("answer not found: {0}")]
    AnswerNotFound(String),

    /// Requested evaluation was not found.
    #[error("evaluation not found: {0}")]
    EvaluationNotFound(String),

    /// A stored value failed to parse into its domain type.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Convenience alias for storage results.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for viva_core::VivaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InterviewNotFound(id) => Self::not_found("interview", id),
            StoreError::QuestionNotFound(id) => Self::not_found("question", id),
            StoreError::AnswerNotFound(id) => Self::not_found("answer", id),
            StoreError::EvaluationNotFound(id) => Self::not_found("evaluation", id),
            other => Self::Store(other.to_string()),
        }
    }
}

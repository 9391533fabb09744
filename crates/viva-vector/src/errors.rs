//! Vector error types.
//!
//! All vector errors are non-fatal — retrieval degrades gracefully when
//! embeddings or the index are unavailable.

use thiserror::Error;

/// Errors from embedding and vector index operations.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Embedding generation failed.
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// `SQLite` error (preserves source chain).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Vector dimensions did not match the index.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    Dimensions {
        /// Dimensions the index was created with.
        expected: usize,
        /// Dimensions of the offending vector.
        got: usize,
    },

    /// Vector storage operation failed (non-SQLite).
    #[error("Storage failed: {0}")]
    Storage(String),
}

/// Result alias for vector operations.
pub type Result<T> = std::result::Result<T, VectorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn error_display_variants() {
        let cases = vec![
            (
                VectorError::Embedding("empty input".into()),
                "Embedding failed: empty input",
            ),
            (
                VectorError::Dimensions {
                    expected: 256,
                    got: 4,
                },
                "Dimension mismatch: expected 256, got 4",
            ),
            (
                VectorError::Storage("disk full".into()),
                "Storage failed: disk full",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn error_from_rusqlite_preserves_source() {
        let err: VectorError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, VectorError::Sqlite(_)));
        let source = err.source().expect("should have source");
        assert!(source.to_string().contains("Query returned no rows"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VectorError>();
    }
}

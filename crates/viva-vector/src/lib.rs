//! # viva-vector
//!
//! Embedding generation and vector similarity search backing exemplar
//! retrieval:
//! - Pluggable [`Embedder`] trait with a deterministic feature-hashing
//!   implementation for local and test use
//! - `SQLite` BLOB storage with brute-force cosine KNN over question vectors
//! - L2 normalization and similarity primitives
//!
//! Everything in this crate is best-effort: callers treat failures as a
//! degraded-retrieval signal, never as a session-fatal error.

#![deny(unsafe_code)]

pub mod embedder;
pub mod errors;
pub mod index;
pub mod normalize;
pub mod similarity;

pub use embedder::{Embedder, HashingEmbedder};
pub use errors::{Result, VectorError};
pub use index::{QuestionMatch, QuestionVectorIndex, SearchFilter};
pub use similarity::answer_similarity;

//! # viva-core
//!
//! Foundation types for the Viva adaptive interview engine.
//!
//! This crate provides the shared vocabulary that all other Viva crates
//! depend on:
//!
//! - **Branded IDs**: `InterviewId`, `QuestionId`, `EvaluationId`, etc. as
//!   newtypes for type safety
//! - **Domain model**: `Interview`, `Question`, `Answer`, `Evaluation`,
//!   `ConceptGap` aggregates
//! - **Scoring rules**: the attempt penalty table, score clamping, and the
//!   gap-resolution criteria
//! - **Session events**: the ordered event stream emitted toward the
//!   transport layer
//! - **Errors**: the `VivaError` taxonomy via `thiserror`

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;
pub mod model;
pub mod scoring;

pub use errors::VivaError;
pub use events::SessionEvent;
pub use ids::{AnswerId, CandidateId, EvaluationId, FollowUpId, GapId, InterviewId, QuestionId};

//! # viva-runtime
//!
//! The orchestration core of the interview engine:
//!
//! - [`EvaluationEngine`] — scores answers, applies attempt penalties,
//!   creates and resolves concept gaps
//! - [`FollowUpDecisionEngine`] — decides whether a question chain warrants
//!   another probe and persists the generated follow-up
//! - [`ExemplarRetriever`] — fail-open similarity retrieval feeding question
//!   generation
//! - [`QuestionGenerator`] — prompt-construction glue over the LLM port
//! - [`SessionOrchestrator`] — the per-interview state machine actor
//! - [`SessionSupervisor`] — concurrent registry of live session actors
//!
//! One tokio task per interview; no shared mutable state across sessions
//! beyond the supervisor's registry.

#![deny(unsafe_code)]

pub mod evaluation;
pub mod exemplar;
pub mod follow_up;
pub mod question_gen;
pub mod session;
pub mod supervisor;

pub use evaluation::{EvaluationEngine, EvaluationInput};
pub use exemplar::ExemplarRetriever;
pub use follow_up::FollowUpDecisionEngine;
pub use question_gen::QuestionGenerator;
pub use session::{SessionClient, SessionHandle, SessionOrchestrator, SessionState};
pub use supervisor::SessionSupervisor;

/// Result alias over the engine-wide error taxonomy.
pub type Result<T> = std::result::Result<T, viva_core::VivaError>;

//! # viva-llm
//!
//! Generation and evaluation ports for the interview engine:
//! - [`LlmClient`] trait covering the four generation operations the
//!   runtime needs (question, ideal answer, rationale, answer evaluation)
//! - An OpenAI-compatible HTTP adapter (`reqwest`, JSON mode, bounded by a
//!   request timeout)
//! - A deterministic mock adapter for tests and offline runs
//!
//! Adapter selection happens at construction time via trait objects.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod http;
pub mod mock;
pub mod prompts;
pub mod types;

pub use client::LlmClient;
pub use errors::{LlmError, Result};
pub use http::{OpenAiClient, OpenAiConfig};
pub use mock::MockLlmClient;
pub use types::{
    AnswerAssessment, EvaluationRequest, Exemplar, FollowUpContext, GapAssessment,
    GeneratedQuestion, GenerationRequest,
};

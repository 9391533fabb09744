//! The [`LlmClient`] port.

use async_trait::async_trait;

use crate::errors::Result;
use crate::types::{AnswerAssessment, EvaluationRequest, GeneratedQuestion, GenerationRequest};

/// The four generation operations the runtime depends on.
///
/// Implementations: [`crate::OpenAiClient`] for OpenAI-compatible HTTP
/// backends, [`crate::MockLlmClient`] for tests and offline runs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a new interview question (main or follow-up, depending on
    /// whether `request.follow_up` is set).
    async fn generate_question(&self, request: &GenerationRequest) -> Result<GeneratedQuestion>;

    /// Generate the ideal answer for a main question.
    async fn generate_ideal_answer(&self, question_text: &str) -> Result<String>;

    /// Generate the rationale behind an ideal answer.
    async fn generate_rationale(&self, question_text: &str, ideal_answer: &str) -> Result<String>;

    /// Evaluate a candidate answer against a question.
    async fn evaluate_answer(&self, request: &EvaluationRequest) -> Result<AnswerAssessment>;
}

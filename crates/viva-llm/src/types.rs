//! Request and response shapes for the generation ports.

use serde::{Deserialize, Serialize};

use viva_core::ids::{EvaluationId, QuestionId};
use viva_core::model::{Difficulty, Feedback, GapSeverity, QuestionType};
use viva_core::scoring::ExperienceBand;

/// A retrieved exemplar question passed to generation as inspiration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exemplar {
    /// Exemplar question text.
    pub text: String,
    /// Skills the exemplar probes.
    pub skills: Vec<String>,
    /// Exemplar difficulty.
    pub difficulty: Difficulty,
    /// Cosine similarity to the retrieval query (0–1).
    pub similarity: f64,
}

/// Context for generating a follow-up rather than a fresh main question.
#[derive(Clone, Debug)]
pub struct FollowUpContext {
    /// The main question being followed up on.
    pub parent_question_id: QuestionId,
    /// The evaluation that triggered this follow-up.
    pub parent_evaluation_id: EvaluationId,
    /// Attempt number of the evaluation that triggered this follow-up.
    pub attempt_number: u8,
    /// Cumulative unresolved gap labels across the question chain,
    /// de-duplicated, in first-seen order.
    pub unresolved_gaps: Vec<String>,
}

/// Inputs for question generation.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Primary skill the question should probe.
    pub skill: String,
    /// Question category.
    pub question_type: QuestionType,
    /// Target difficulty.
    pub difficulty: Difficulty,
    /// Candidate experience band.
    pub experience_band: ExperienceBand,
    /// Retrieved exemplars, at most three. `None` when retrieval returned
    /// nothing or was skipped.
    pub exemplars: Option<Vec<Exemplar>>,
    /// Present when generating a follow-up question.
    pub follow_up: Option<FollowUpContext>,
}

/// A freshly generated question.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    /// Question text.
    pub text: String,
    /// Skills the question probes.
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Inputs for answer evaluation.
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
    /// The question being answered.
    pub question_text: String,
    /// The candidate's answer.
    pub answer_text: String,
    /// Which attempt of the chain this is (1–3).
    pub attempt_number: u8,
    /// Unresolved gap labels from prior attempts, if any.
    pub prior_unresolved_gaps: Vec<String>,
}

/// One concept gap identified by the evaluator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAssessment {
    /// Concept label.
    pub concept: String,
    /// Severity of the omission.
    pub severity: GapSeverity,
}

/// The evaluator's structured verdict on an answer. Raw model output —
/// penalty and final score are applied downstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAssessment {
    /// Raw score (0–100), before any attempt penalty.
    pub score: f64,
    /// Completeness sub-score (0–1).
    pub completeness: f64,
    /// Relevance sub-score (0–1).
    pub relevance: f64,
    /// Qualitative feedback.
    #[serde(default)]
    pub feedback: Feedback,
    /// Concepts the answer failed to address.
    #[serde(default)]
    pub gaps: Vec<GapAssessment>,
    /// Overall tone read of the answer. Informational only; not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    /// The evaluator's chain of reasoning. Informational only; not persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

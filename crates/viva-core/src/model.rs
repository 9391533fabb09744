//! Domain model for the interview engine.
//!
//! Aggregates mirror the persistence schema one-to-one. `final_score` is
//! intentionally absent from [`Evaluation`] as a stored field — it is always
//! recomputed from `raw_score` and `penalty` (see [`crate::scoring`]), never
//! persisted independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{
    AnswerId, CandidateId, EvaluationId, FollowUpId, GapId, InterviewId, QuestionId,
};
use crate::scoring;

// ─────────────────────────────────────────────────────────────────────────────
// Interview
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle status of an interview.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    /// Planning in progress; questions not yet finalized.
    Preparing,
    /// Planned and ready to start.
    Ready,
    /// Session in flight.
    InProgress,
    /// Terminal — no transitions leave this state.
    Complete,
}

impl InterviewStatus {
    /// String form used in storage and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }

    /// Parse from the storage string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "in_progress" => Some(Self::InProgress),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

/// A planned interview for one candidate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    /// Interview ID.
    pub id: InterviewId,
    /// The candidate being interviewed.
    pub candidate_id: CandidateId,
    /// Candidate's years of professional experience (drives the experience band).
    pub experience_years: f64,
    /// Ordered list of planned main question IDs.
    pub question_ids: Vec<QuestionId>,
    /// Current lifecycle status.
    pub status: InterviewStatus,
    /// Free-form planning metadata.
    #[serde(default)]
    pub planning_metadata: Value,
    /// Follow-up question IDs generated so far, in creation order.
    #[serde(default)]
    pub follow_up_ids: Vec<FollowUpId>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Questions
// ─────────────────────────────────────────────────────────────────────────────

/// Category of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Conceptual / knowledge question.
    Technical,
    /// Architecture and trade-off discussion.
    SystemDesign,
    /// Hands-on coding question.
    Coding,
    /// Soft-skill / situational question.
    Behavioral,
}

impl QuestionType {
    /// String form used in storage, prompts, and vector metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::SystemDesign => "system_design",
            Self::Coding => "coding",
            Self::Behavioral => "behavioral",
        }
    }

    /// Parse from the storage string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "technical" => Some(Self::Technical),
            "system_design" => Some(Self::SystemDesign),
            "coding" => Some(Self::Coding),
            "behavioral" => Some(Self::Behavioral),
            _ => None,
        }
    }
}

/// Target difficulty of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Entry level.
    Easy,
    /// Mid level.
    Medium,
    /// Senior level.
    Hard,
}

impl Difficulty {
    /// String form used in storage, prompts, and vector metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse from the storage string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// A planned main question. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question ID.
    pub id: QuestionId,
    /// Question text shown to the candidate.
    pub text: String,
    /// Question category.
    pub question_type: QuestionType,
    /// Target difficulty.
    pub difficulty: Difficulty,
    /// Skills this question probes.
    pub skills: Vec<String>,
    /// Ideal answer used for semantic comparison. Absent for questions
    /// where no reference answer was generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_answer: Option<String>,
    /// Rationale behind the ideal answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// A generated follow-up question. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpQuestion {
    /// Follow-up ID.
    pub id: FollowUpId,
    /// The main question this follows up on.
    pub parent_question_id: QuestionId,
    /// Position in the chain (1–3).
    pub sequence: u8,
    /// Question text.
    pub text: String,
}

/// Reference to the question an answer addresses — either a planned main
/// question or a generated follow-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum QuestionRef {
    /// A planned main question.
    Main(QuestionId),
    /// A generated follow-up.
    FollowUp(FollowUpId),
}

impl QuestionRef {
    /// The referenced ID as a plain string.
    #[must_use]
    pub fn id_str(&self) -> &str {
        match self {
            Self::Main(id) => id.as_str(),
            Self::FollowUp(id) => id.as_str(),
        }
    }

    /// Whether this references a follow-up question.
    #[must_use]
    pub fn is_follow_up(&self) -> bool {
        matches!(self, Self::FollowUp(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Answers & evaluations
// ─────────────────────────────────────────────────────────────────────────────

/// How the candidate delivered an answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Typed answer.
    #[default]
    Text,
    /// Spoken answer (transcribed upstream).
    Voice,
}

/// One answer to one question. Never mutated after its evaluation is linked.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Answer ID.
    pub id: AnswerId,
    /// Owning interview.
    pub interview_id: InterviewId,
    /// The question (main or follow-up) being answered.
    pub question_ref: QuestionRef,
    /// Raw answer text.
    pub text: String,
    /// Delivery mode.
    pub mode: AnswerMode,
    /// Linked evaluation, set once scoring completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_id: Option<EvaluationId>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

/// Qualitative feedback attached to an evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// What the answer did well.
    pub strengths: Vec<String>,
    /// What the answer missed or got wrong.
    pub weaknesses: Vec<String>,
    /// Concrete suggestions for improvement.
    pub suggestions: Vec<String>,
}

/// A scored answer. `attempt_number` and `penalty` are fixed at creation;
/// only gap resolution flags change afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Evaluation ID.
    pub id: EvaluationId,
    /// The answer this evaluation scores.
    pub answer_id: AnswerId,
    /// The question chain's root main question.
    pub question_id: QuestionId,
    /// Owning interview.
    pub interview_id: InterviewId,
    /// Raw score from the generation service (0–100).
    pub raw_score: f64,
    /// Fixed attempt penalty (0, −5, or −15).
    pub penalty: i8,
    /// Semantic similarity to the ideal answer (0–1), when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Completeness sub-score (0–1).
    pub completeness: f64,
    /// Relevance sub-score (0–1).
    pub relevance: f64,
    /// Qualitative feedback.
    pub feedback: Feedback,
    /// Which attempt in the chain this is (1–3).
    pub attempt_number: u8,
    /// Parent evaluation — non-null exactly when `attempt_number > 1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_evaluation_id: Option<EvaluationId>,
    /// Concept gaps identified by this evaluation.
    pub gaps: Vec<ConceptGap>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
}

impl Evaluation {
    /// Final score: `clamp(raw_score + penalty, 0, 100)`. Always derived,
    /// never stored.
    #[must_use]
    pub fn final_score(&self) -> f64 {
        scoring::final_score(self.raw_score, self.penalty)
    }

    /// Labels of gaps not yet resolved.
    #[must_use]
    pub fn unresolved_gap_labels(&self) -> Vec<String> {
        self.gaps
            .iter()
            .filter(|g| !g.resolved)
            .map(|g| g.concept.clone())
            .collect()
    }

    /// Whether any gap remains unresolved.
    #[must_use]
    pub fn has_unresolved_gaps(&self) -> bool {
        self.gaps.iter().any(|g| !g.resolved)
    }
}

/// Severity of a concept gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    /// Peripheral omission.
    Minor,
    /// Notable misunderstanding.
    Moderate,
    /// Core concept missing.
    Major,
}

impl GapSeverity {
    /// String form used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
        }
    }

    /// Parse from the storage string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "minor" => Some(Self::Minor),
            "moderate" => Some(Self::Moderate),
            "major" => Some(Self::Major),
            _ => None,
        }
    }
}

/// A concept the candidate's answer failed to address. The `resolved` flag
/// flips false→true once and never back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptGap {
    /// Gap ID.
    pub id: GapId,
    /// Owning evaluation.
    pub evaluation_id: EvaluationId,
    /// Concept label, e.g. `"connection pooling"`.
    pub concept: String,
    /// How central the missed concept is.
    pub severity: GapSeverity,
    /// Whether the gap has been addressed by a later attempt.
    pub resolved: bool,
}

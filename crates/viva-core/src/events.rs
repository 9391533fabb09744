//! Session events emitted toward the transport layer.
//!
//! The orchestrator produces an ordered stream of [`SessionEvent`]s per
//! interview. The transport (WebSocket in `viva-server`) serializes them
//! as tagged camelCase JSON; the orchestrator itself is agnostic to the
//! wire format beyond this enum's serde shape.
//!
//! Ordering within one session is guaranteed by construction: every event
//! flows through the session actor's single channel.

use serde::{Deserialize, Serialize};

use crate::ids::{AnswerId, FollowUpId, InterviewId, QuestionId};
use crate::model::{Difficulty, Feedback, QuestionType};

/// Diagnostic snapshot of a session's state (read-only).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Current state machine state name.
    pub state: String,
    /// The question currently awaiting an answer, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_id: Option<String>,
    /// Follow-ups issued for the active question.
    pub follow_up_count: u8,
    /// Zero-based index of the active main question.
    pub question_index: usize,
    /// Total planned main questions.
    pub question_total: usize,
    /// When the session started (RFC 3339), if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Last state change (RFC 3339).
    pub updated_at: String,
}

/// Events produced by a session orchestrator, in emission order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// A main question is presented to the candidate.
    #[serde(rename_all = "camelCase")]
    Question {
        /// Owning interview.
        interview_id: InterviewId,
        /// Question ID.
        id: QuestionId,
        /// Question text.
        text: String,
        /// Question category.
        question_type: QuestionType,
        /// Target difficulty.
        difficulty: Difficulty,
        /// Zero-based position within the plan.
        index: usize,
        /// Total planned main questions.
        total: usize,
    },

    /// An answer has been scored.
    #[serde(rename_all = "camelCase")]
    Evaluation {
        /// Owning interview.
        interview_id: InterviewId,
        /// The answer that was scored.
        answer_id: AnswerId,
        /// Final score after penalty, clamped to 0–100.
        score: f64,
        /// Qualitative feedback.
        feedback: Feedback,
    },

    /// A follow-up question is presented to the candidate.
    #[serde(rename_all = "camelCase")]
    FollowUpQuestion {
        /// Owning interview.
        interview_id: InterviewId,
        /// Follow-up ID.
        id: FollowUpId,
        /// The main question this follows up on.
        parent_question_id: QuestionId,
        /// Position in the chain (1–3).
        sequence: u8,
        /// Question text.
        text: String,
    },

    /// The interview has finished; terminal for the session.
    #[serde(rename_all = "camelCase")]
    InterviewComplete {
        /// Owning interview.
        interview_id: InterviewId,
        /// Mean final score across main-question evaluations.
        overall_score: f64,
        /// Human-readable wrap-up.
        summary: String,
    },

    /// A state snapshot, in reply to a diagnostic request.
    #[serde(rename_all = "camelCase")]
    State {
        /// Owning interview.
        interview_id: InterviewId,
        /// The snapshot.
        snapshot: SessionSnapshot,
    },

    /// An operation failed; the session remains usable.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Owning interview.
        interview_id: InterviewId,
        /// Machine-readable code, e.g. `"generation_failure"`.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

impl SessionEvent {
    /// The owning interview's ID.
    #[must_use]
    pub fn interview_id(&self) -> &InterviewId {
        match self {
            Self::Question { interview_id, .. }
            | Self::Evaluation { interview_id, .. }
            | Self::FollowUpQuestion { interview_id, .. }
            | Self::InterviewComplete { interview_id, .. }
            | Self::State { interview_id, .. }
            | Self::Error { interview_id, .. } => interview_id,
        }
    }

    /// The wire `type` tag for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Question { .. } => "question",
            Self::Evaluation { .. } => "evaluation",
            Self::FollowUpQuestion { .. } => "followUpQuestion",
            Self::InterviewComplete { .. } => "interviewComplete",
            Self::State { .. } => "state",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Feedback;

    #[test]
    fn question_event_wire_shape() {
        let event = SessionEvent::Question {
            interview_id: InterviewId::from("int_1"),
            id: QuestionId::from("q_1"),
            text: "What is a B-tree?".into(),
            question_type: QuestionType::Technical,
            difficulty: Difficulty::Medium,
            index: 0,
            total: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "question");
        assert_eq!(json["interviewId"], "int_1");
        assert_eq!(json["questionType"], "technical");
        assert_eq!(json["total"], 5);
    }

    #[test]
    fn evaluation_event_wire_shape() {
        let event = SessionEvent::Evaluation {
            interview_id: InterviewId::from("int_1"),
            answer_id: AnswerId::from("ans_1"),
            score: 72.5,
            feedback: Feedback::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "evaluation");
        assert_eq!(json["answerId"], "ans_1");
        assert!((json["score"].as_f64().unwrap() - 72.5).abs() < f64::EPSILON);
    }

    #[test]
    fn follow_up_event_wire_shape() {
        let event = SessionEvent::FollowUpQuestion {
            interview_id: InterviewId::from("int_1"),
            id: FollowUpId::from("fq_1"),
            parent_question_id: QuestionId::from("q_1"),
            sequence: 2,
            text: "Expand on node splitting.".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "followUpQuestion");
        assert_eq!(json["parentQuestionId"], "q_1");
        assert_eq!(json["sequence"], 2);
    }

    #[test]
    fn complete_event_wire_shape() {
        let event = SessionEvent::InterviewComplete {
            interview_id: InterviewId::from("int_1"),
            overall_score: 81.2,
            summary: "Strong overall.".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "interviewComplete");
        assert!(json["overallScore"].is_number());
    }

    #[test]
    fn error_event_wire_shape() {
        let event = SessionEvent::Error {
            interview_id: InterviewId::from("int_1"),
            code: "generation_failure".into(),
            message: "upstream timeout".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "generation_failure");
    }

    #[test]
    fn event_type_matches_tag() {
        let event = SessionEvent::Error {
            interview_id: InterviewId::from("int_1"),
            code: "x".into(),
            message: "y".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
    }

    #[test]
    fn interview_id_accessor() {
        let event = SessionEvent::InterviewComplete {
            interview_id: InterviewId::from("int_9"),
            overall_score: 50.0,
            summary: String::new(),
        };
        assert_eq!(event.interview_id().as_str(), "int_9");
    }

    #[test]
    fn serde_roundtrip() {
        let event = SessionEvent::State {
            interview_id: InterviewId::from("int_1"),
            snapshot: SessionSnapshot {
                state: "questioning".into(),
                current_question_id: Some("q_1".into()),
                follow_up_count: 1,
                question_index: 2,
                question_total: 5,
                started_at: None,
                updated_at: "2026-01-01T00:00:00Z".into(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

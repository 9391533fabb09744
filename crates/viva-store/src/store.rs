//! High-level [`InterviewStore`] facade.
//!
//! Composes the repositories into the narrow, interview-centric API the
//! orchestrator consumes. Multi-write methods run inside a single
//! transaction — callers never observe partial state.

use rusqlite::Connection;

use viva_core::ids::{AnswerId, EvaluationId, FollowUpId, InterviewId, QuestionId};
use viva_core::model::{
    Answer, Evaluation, FollowUpQuestion, Interview, InterviewStatus, Question,
};

use crate::connection::{ConnectionPool, PooledConnection};
use crate::errors::{Result, StoreError};
use crate::repositories::{AnswerRepo, EvaluationRepo, FollowUpRepo, InterviewRepo, QuestionRepo};

/// High-level store wrapping a connection pool and all repositories.
pub struct InterviewStore {
    pool: ConnectionPool,
}

impl InterviewStore {
    /// Create a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    fn in_transaction<T>(
        conn: &Connection,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Interviews
    // ─────────────────────────────────────────────────────────────────────

    /// Persist a new interview.
    pub fn create_interview(&self, interview: &Interview) -> Result<()> {
        let conn = self.conn()?;
        InterviewRepo::create(&conn, interview)
    }

    /// Fetch an interview, or `None` if it does not exist.
    pub fn get_interview(&self, id: &InterviewId) -> Result<Option<Interview>> {
        let conn = self.conn()?;
        InterviewRepo::get(&conn, id)
    }

    /// Fetch an interview that must exist.
    pub fn require_interview(&self, id: &InterviewId) -> Result<Interview> {
        self.get_interview(id)?
            .ok_or_else(|| StoreError::InterviewNotFound(id.to_string()))
    }

    /// Update an interview's lifecycle status.
    pub fn set_interview_status(&self, id: &InterviewId, status: InterviewStatus) -> Result<()> {
        let conn = self.conn()?;
        InterviewRepo::set_status(&conn, id, status)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Questions
    // ─────────────────────────────────────────────────────────────────────

    /// Persist a new main question.
    pub fn create_question(&self, question: &Question) -> Result<()> {
        let conn = self.conn()?;
        QuestionRepo::create(&conn, question)
    }

    /// Fetch a question, or `None` if it does not exist.
    pub fn get_question(&self, id: &QuestionId) -> Result<Option<Question>> {
        let conn = self.conn()?;
        QuestionRepo::get(&conn, id)
    }

    /// Fetch a question that must exist.
    pub fn require_question(&self, id: &QuestionId) -> Result<Question> {
        self.get_question(id)?
            .ok_or_else(|| StoreError::QuestionNotFound(id.to_string()))
    }

    /// Persist a follow-up question and record it on the interview.
    /// Atomic: both writes happen in one transaction.
    pub fn create_follow_up(
        &self,
        interview_id: &InterviewId,
        follow_up: &FollowUpQuestion,
    ) -> Result<()> {
        let conn = self.conn()?;
        Self::in_transaction(&conn, |tx| {
            FollowUpRepo::create(tx, follow_up)?;
            InterviewRepo::append_follow_up(tx, interview_id, &follow_up.id)
        })
    }

    /// Fetch a follow-up question, or `None` if it does not exist.
    pub fn get_follow_up(&self, id: &FollowUpId) -> Result<Option<FollowUpQuestion>> {
        let conn = self.conn()?;
        FollowUpRepo::get(&conn, id)
    }

    /// All follow-ups for a main question, ordered by sequence.
    pub fn list_follow_ups(&self, parent: &QuestionId) -> Result<Vec<FollowUpQuestion>> {
        let conn = self.conn()?;
        FollowUpRepo::list_by_parent(&conn, parent)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Answers & evaluations
    // ─────────────────────────────────────────────────────────────────────

    /// Persist a new answer.
    pub fn create_answer(&self, answer: &Answer) -> Result<()> {
        let conn = self.conn()?;
        AnswerRepo::create(&conn, answer)
    }

    /// Fetch an answer, or `None` if it does not exist.
    pub fn get_answer(&self, id: &AnswerId) -> Result<Option<Answer>> {
        let conn = self.conn()?;
        AnswerRepo::get(&conn, id)
    }

    /// Persist an evaluation (with gaps) and link it to its answer.
    /// Atomic: evaluation insert, gap inserts, and the answer link happen
    /// in one transaction.
    pub fn record_evaluation(&self, evaluation: &Evaluation) -> Result<()> {
        let conn = self.conn()?;
        Self::in_transaction(&conn, |tx| {
            EvaluationRepo::create(tx, evaluation)?;
            AnswerRepo::link_evaluation(tx, &evaluation.answer_id, &evaluation.id)
        })
    }

    /// Fetch an evaluation (with gaps), or `None` if it does not exist.
    pub fn get_evaluation(&self, id: &EvaluationId) -> Result<Option<Evaluation>> {
        let conn = self.conn()?;
        EvaluationRepo::get(&conn, id)
    }

    /// Fetch an evaluation that must exist.
    pub fn require_evaluation(&self, id: &EvaluationId) -> Result<Evaluation> {
        self.get_evaluation(id)?
            .ok_or_else(|| StoreError::EvaluationNotFound(id.to_string()))
    }

    /// The evaluation attached to a given answer, if scoring completed.
    pub fn get_evaluation_by_answer(&self, answer_id: &AnswerId) -> Result<Option<Evaluation>> {
        let conn = self.conn()?;
        EvaluationRepo::get_by_answer_id(&conn, answer_id)
    }

    /// Children of a parent evaluation, oldest first.
    pub fn list_child_evaluations(&self, parent: &EvaluationId) -> Result<Vec<Evaluation>> {
        let conn = self.conn()?;
        EvaluationRepo::list_by_parent(&conn, parent)
    }

    /// First-attempt evaluations for an interview, oldest first.
    pub fn list_main_evaluations(&self, interview_id: &InterviewId) -> Result<Vec<Evaluation>> {
        let conn = self.conn()?;
        EvaluationRepo::list_main_by_interview(&conn, interview_id)
    }

    /// Resolve all open gaps on an evaluation; returns how many flipped.
    pub fn resolve_gaps(&self, evaluation_id: &EvaluationId) -> Result<usize> {
        let conn = self.conn()?;
        EvaluationRepo::resolve_gaps(&conn, evaluation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionConfig, new_in_memory};
    use crate::migrations::run_migrations;
    use viva_core::ids::{CandidateId, GapId};
    use viva_core::model::{
        AnswerMode, ConceptGap, Difficulty, Feedback, GapSeverity, QuestionRef, QuestionType,
    };

    fn make_store() -> InterviewStore {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
        }
        InterviewStore::new(pool)
    }

    fn seed(store: &InterviewStore) -> (InterviewId, QuestionId) {
        let question = Question {
            id: QuestionId::new(),
            text: "Explain connection pooling.".into(),
            question_type: QuestionType::Technical,
            difficulty: Difficulty::Medium,
            skills: vec!["databases".into()],
            ideal_answer: Some("A pool reuses connections...".into()),
            rationale: None,
        };
        store.create_question(&question).unwrap();

        let interview = Interview {
            id: InterviewId::new(),
            candidate_id: CandidateId::new(),
            experience_years: 4.0,
            question_ids: vec![question.id.clone()],
            status: InterviewStatus::Ready,
            planning_metadata: serde_json::json!({}),
            follow_up_ids: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.create_interview(&interview).unwrap();
        (interview.id, question.id)
    }

    #[test]
    fn require_interview_missing_errors() {
        let store = make_store();
        let err = store
            .require_interview(&InterviewId::from("int_nope"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InterviewNotFound(_)));
    }

    #[test]
    fn create_follow_up_is_atomic_with_interview_update() {
        let store = make_store();
        let (interview_id, question_id) = seed(&store);

        let follow_up = FollowUpQuestion {
            id: FollowUpId::new(),
            parent_question_id: question_id,
            sequence: 1,
            text: "What about pool exhaustion?".into(),
        };
        store.create_follow_up(&interview_id, &follow_up).unwrap();

        let interview = store.require_interview(&interview_id).unwrap();
        assert_eq!(interview.follow_up_ids, vec![follow_up.id.clone()]);
        assert!(store.get_follow_up(&follow_up.id).unwrap().is_some());
    }

    #[test]
    fn create_follow_up_rolls_back_on_missing_interview() {
        let store = make_store();
        let (_, question_id) = seed(&store);

        let follow_up = FollowUpQuestion {
            id: FollowUpId::new(),
            parent_question_id: question_id,
            sequence: 1,
            text: "orphan".into(),
        };
        let err = store
            .create_follow_up(&InterviewId::from("int_nope"), &follow_up)
            .unwrap_err();
        assert!(matches!(err, StoreError::InterviewNotFound(_)));
        // The follow-up insert rolled back with the failed interview update
        assert!(store.get_follow_up(&follow_up.id).unwrap().is_none());
    }

    #[test]
    fn record_evaluation_links_answer() {
        let store = make_store();
        let (interview_id, question_id) = seed(&store);

        let answer = Answer {
            id: AnswerId::new(),
            interview_id: interview_id.clone(),
            question_ref: QuestionRef::Main(question_id.clone()),
            text: "You reuse sockets.".into(),
            mode: AnswerMode::Text,
            evaluation_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.create_answer(&answer).unwrap();

        let eval_id = EvaluationId::new();
        let evaluation = Evaluation {
            id: eval_id.clone(),
            answer_id: answer.id.clone(),
            question_id,
            interview_id,
            raw_score: 62.0,
            penalty: 0,
            similarity: None,
            completeness: 0.5,
            relevance: 0.8,
            feedback: Feedback::default(),
            attempt_number: 1,
            parent_evaluation_id: None,
            gaps: vec![ConceptGap {
                id: GapId::new(),
                evaluation_id: eval_id.clone(),
                concept: "exhaustion handling".into(),
                severity: GapSeverity::Major,
                resolved: false,
            }],
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.record_evaluation(&evaluation).unwrap();

        let loaded_answer = store.get_answer(&answer.id).unwrap().unwrap();
        assert_eq!(loaded_answer.evaluation_id, Some(eval_id.clone()));

        let by_answer = store.get_evaluation_by_answer(&answer.id).unwrap().unwrap();
        assert_eq!(by_answer.id, eval_id);
        assert_eq!(by_answer.gaps.len(), 1);
    }

    #[test]
    fn resolve_gaps_roundtrip() {
        let store = make_store();
        let (interview_id, question_id) = seed(&store);

        let answer = Answer {
            id: AnswerId::new(),
            interview_id: interview_id.clone(),
            question_ref: QuestionRef::Main(question_id.clone()),
            text: "short".into(),
            mode: AnswerMode::Text,
            evaluation_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.create_answer(&answer).unwrap();

        let eval_id = EvaluationId::new();
        let evaluation = Evaluation {
            id: eval_id.clone(),
            answer_id: answer.id,
            question_id,
            interview_id,
            raw_score: 40.0,
            penalty: 0,
            similarity: None,
            completeness: 0.3,
            relevance: 0.5,
            feedback: Feedback::default(),
            attempt_number: 1,
            parent_evaluation_id: None,
            gaps: vec![ConceptGap {
                id: GapId::new(),
                evaluation_id: eval_id.clone(),
                concept: "durability".into(),
                severity: GapSeverity::Moderate,
                resolved: false,
            }],
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.record_evaluation(&evaluation).unwrap();

        assert_eq!(store.resolve_gaps(&eval_id).unwrap(), 1);
        let loaded = store.require_evaluation(&eval_id).unwrap();
        assert!(loaded.gaps[0].resolved);
    }
}

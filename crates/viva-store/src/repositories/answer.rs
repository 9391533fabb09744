//! Answer repository.
//!
//! The `question_kind` column discriminates the [`QuestionRef`] variant so
//! main and follow-up answers live in one table.

use rusqlite::{Connection, OptionalExtension, params};

use viva_core::ids::{AnswerId, EvaluationId, FollowUpId, InterviewId, QuestionId};
use viva_core::model::{Answer, AnswerMode, QuestionRef};

use crate::errors::{Result, StoreError};

/// Answer repository — stateless, every method takes `&Connection`.
pub struct AnswerRepo;

impl AnswerRepo {
    /// Insert a new answer.
    pub fn create(conn: &Connection, answer: &Answer) -> Result<()> {
        let (kind, question_id) = match &answer.question_ref {
            QuestionRef::Main(id) => ("main", id.as_str()),
            QuestionRef::FollowUp(id) => ("follow_up", id.as_str()),
        };
        let mode = match answer.mode {
            AnswerMode::Text => "text",
            AnswerMode::Voice => "voice",
        };
        let _ = conn.execute(
            "INSERT INTO answers (id, interview_id, question_kind, question_id, text, mode, evaluation_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                answer.id.as_str(),
                answer.interview_id.as_str(),
                kind,
                question_id,
                answer.text,
                mode,
                answer.evaluation_id.as_ref().map(EvaluationId::as_str),
                answer.created_at,
            ],
        )?;
        Ok(())
    }

    /// Fetch an answer by ID.
    pub fn get(conn: &Connection, id: &AnswerId) -> Result<Option<Answer>> {
        conn.query_row(
            "SELECT id, interview_id, question_kind, question_id, text, mode, evaluation_id, created_at
             FROM answers WHERE id = ?1",
            params![id.as_str()],
            Self::from_row,
        )
        .optional()?
        .transpose()
    }

    /// Link an evaluation to an answer (the one mutation an answer sees).
    pub fn link_evaluation(
        conn: &Connection,
        answer_id: &AnswerId,
        evaluation_id: &EvaluationId,
    ) -> Result<()> {
        let changed = conn.execute(
            "UPDATE answers SET evaluation_id = ?2 WHERE id = ?1",
            params![answer_id.as_str(), evaluation_id.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::AnswerNotFound(answer_id.to_string()));
        }
        Ok(())
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Answer>> {
        let id: String = row.get(0)?;
        let interview_id: String = row.get(1)?;
        let kind: String = row.get(2)?;
        let question_id: String = row.get(3)?;
        let text: String = row.get(4)?;
        let mode: String = row.get(5)?;
        let evaluation_id: Option<String> = row.get(6)?;
        let created_at: String = row.get(7)?;

        Ok(build_answer(
            id,
            interview_id,
            &kind,
            question_id,
            text,
            &mode,
            evaluation_id,
            created_at,
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_answer(
    id: String,
    interview_id: String,
    kind: &str,
    question_id: String,
    text: String,
    mode: &str,
    evaluation_id: Option<String>,
    created_at: String,
) -> Result<Answer> {
    let question_ref = match kind {
        "main" => QuestionRef::Main(QuestionId::from_string(question_id)),
        "follow_up" => QuestionRef::FollowUp(FollowUpId::from_string(question_id)),
        other => {
            return Err(StoreError::CorruptRow(format!(
                "unknown question kind: {other}"
            )));
        }
    };
    let mode = match mode {
        "text" => AnswerMode::Text,
        "voice" => AnswerMode::Voice,
        other => return Err(StoreError::CorruptRow(format!("unknown answer mode: {other}"))),
    };
    Ok(Answer {
        id: AnswerId::from_string(id),
        interview_id: InterviewId::from_string(interview_id),
        question_ref,
        text,
        mode,
        evaluation_id: evaluation_id.map(EvaluationId::from_string),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::repositories::interview::InterviewRepo;
    use viva_core::ids::CandidateId;
    use viva_core::model::{Interview, InterviewStatus};

    fn open_db_with_interview() -> (Connection, InterviewId) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let interview = Interview {
            id: InterviewId::new(),
            candidate_id: CandidateId::new(),
            experience_years: 1.0,
            question_ids: Vec::new(),
            status: InterviewStatus::Ready,
            planning_metadata: serde_json::json!({}),
            follow_up_ids: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        InterviewRepo::create(&conn, &interview).unwrap();
        (conn, interview.id)
    }

    fn sample_answer(interview_id: &InterviewId) -> Answer {
        Answer {
            id: AnswerId::new(),
            interview_id: interview_id.clone(),
            question_ref: QuestionRef::Main(QuestionId::from("q_1")),
            text: "A B-tree is a balanced tree...".into(),
            mode: AnswerMode::Text,
            evaluation_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn create_and_get() {
        let (conn, interview_id) = open_db_with_interview();
        let answer = sample_answer(&interview_id);
        AnswerRepo::create(&conn, &answer).unwrap();

        let loaded = AnswerRepo::get(&conn, &answer.id).unwrap().unwrap();
        assert_eq!(loaded.text, answer.text);
        assert_eq!(loaded.question_ref, answer.question_ref);
        assert!(loaded.evaluation_id.is_none());
    }

    #[test]
    fn follow_up_answer_roundtrip() {
        let (conn, interview_id) = open_db_with_interview();
        let answer = Answer {
            question_ref: QuestionRef::FollowUp(FollowUpId::from("fq_7")),
            mode: AnswerMode::Voice,
            ..sample_answer(&interview_id)
        };
        AnswerRepo::create(&conn, &answer).unwrap();

        let loaded = AnswerRepo::get(&conn, &answer.id).unwrap().unwrap();
        assert!(loaded.question_ref.is_follow_up());
        assert_eq!(loaded.mode, AnswerMode::Voice);
    }

    #[test]
    fn link_evaluation() {
        let (conn, interview_id) = open_db_with_interview();
        let answer = sample_answer(&interview_id);
        AnswerRepo::create(&conn, &answer).unwrap();

        let eval_id = EvaluationId::from("eval_1");
        AnswerRepo::link_evaluation(&conn, &answer.id, &eval_id).unwrap();

        let loaded = AnswerRepo::get(&conn, &answer.id).unwrap().unwrap();
        assert_eq!(loaded.evaluation_id, Some(eval_id));
    }

    #[test]
    fn link_evaluation_missing_answer() {
        let (conn, _) = open_db_with_interview();
        let err = AnswerRepo::link_evaluation(
            &conn,
            &AnswerId::from("ans_nope"),
            &EvaluationId::from("eval_1"),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::AnswerNotFound(_)));
    }

    #[test]
    fn get_missing_returns_none() {
        let (conn, _) = open_db_with_interview();
        assert!(
            AnswerRepo::get(&conn, &AnswerId::from("ans_nope"))
                .unwrap()
                .is_none()
        );
    }
}

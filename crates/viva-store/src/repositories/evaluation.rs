//! Evaluation repository — scored answers and their concept gaps.
//!
//! The parent/child chain is a plain foreign key (`parent_evaluation_id`)
//! plus [`EvaluationRepo::list_by_parent`]; children never embed
//! back-pointers. Gap resolution is monotonic and enforced in SQL: the
//! resolve update only ever flips `resolved` from 0 to 1.

use rusqlite::{Connection, OptionalExtension, params};

use viva_core::ids::{AnswerId, EvaluationId, GapId, InterviewId, QuestionId};
use viva_core::model::{ConceptGap, Evaluation, Feedback, GapSeverity};

use crate::errors::{Result, StoreError};

/// Evaluation repository — stateless, every method takes `&Connection`.
pub struct EvaluationRepo;

impl EvaluationRepo {
    /// Insert an evaluation together with its concept gaps.
    pub fn create(conn: &Connection, evaluation: &Evaluation) -> Result<()> {
        let feedback = serde_json::to_string(&evaluation.feedback)?;
        let _ = conn.execute(
            "INSERT INTO evaluations (id, answer_id, question_id, interview_id, raw_score,
             penalty, similarity, completeness, relevance, feedback, attempt_number,
             parent_evaluation_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                evaluation.id.as_str(),
                evaluation.answer_id.as_str(),
                evaluation.question_id.as_str(),
                evaluation.interview_id.as_str(),
                evaluation.raw_score,
                evaluation.penalty,
                evaluation.similarity,
                evaluation.completeness,
                evaluation.relevance,
                feedback,
                evaluation.attempt_number,
                evaluation
                    .parent_evaluation_id
                    .as_ref()
                    .map(EvaluationId::as_str),
                evaluation.created_at,
            ],
        )?;
        for gap in &evaluation.gaps {
            let _ = conn.execute(
                "INSERT INTO concept_gaps (id, evaluation_id, concept, severity, resolved)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    gap.id.as_str(),
                    evaluation.id.as_str(),
                    gap.concept,
                    gap.severity.as_str(),
                    i32::from(gap.resolved),
                ],
            )?;
        }
        Ok(())
    }

    /// Fetch an evaluation (with gaps) by ID.
    pub fn get(conn: &Connection, id: &EvaluationId) -> Result<Option<Evaluation>> {
        let row = conn
            .query_row(
                "SELECT id, answer_id, question_id, interview_id, raw_score, penalty,
                 similarity, completeness, relevance, feedback, attempt_number,
                 parent_evaluation_id, created_at
                 FROM evaluations WHERE id = ?1",
                params![id.as_str()],
                Self::from_row,
            )
            .optional()?;
        match row {
            Some(eval) => {
                let mut eval = eval?;
                eval.gaps = Self::gaps_for(conn, &eval.id)?;
                Ok(Some(eval))
            }
            None => Ok(None),
        }
    }

    /// Narrow lookup: the evaluation attached to a given answer.
    pub fn get_by_answer_id(conn: &Connection, answer_id: &AnswerId) -> Result<Option<Evaluation>> {
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM evaluations WHERE answer_id = ?1",
                params![answer_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => Self::get(conn, &EvaluationId::from_string(id)),
            None => Ok(None),
        }
    }

    /// Narrow lookup: children of a parent evaluation, oldest first.
    pub fn list_by_parent(
        conn: &Connection,
        parent: &EvaluationId,
    ) -> Result<Vec<Evaluation>> {
        let ids: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT id FROM evaluations WHERE parent_evaluation_id = ?1
                 ORDER BY attempt_number ASC",
            )?;
            let rows = stmt.query_map(params![parent.as_str()], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(eval) = Self::get(conn, &EvaluationId::from_string(id))? {
                out.push(eval);
            }
        }
        Ok(out)
    }

    /// All first-attempt (main question) evaluations for an interview,
    /// oldest first. Used for the overall-score aggregate.
    pub fn list_main_by_interview(
        conn: &Connection,
        interview_id: &InterviewId,
    ) -> Result<Vec<Evaluation>> {
        let ids: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT id FROM evaluations
                 WHERE interview_id = ?1 AND attempt_number = 1
                 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![interview_id.as_str()], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(eval) = Self::get(conn, &EvaluationId::from_string(id))? {
                out.push(eval);
            }
        }
        Ok(out)
    }

    /// Resolve all still-open gaps on an evaluation. Returns how many gaps
    /// flipped. Monotonic: already-resolved gaps are untouched, and nothing
    /// ever flips back.
    pub fn resolve_gaps(conn: &Connection, evaluation_id: &EvaluationId) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE concept_gaps SET resolved = 1
             WHERE evaluation_id = ?1 AND resolved = 0",
            params![evaluation_id.as_str()],
        )?;
        Ok(changed)
    }

    fn gaps_for(conn: &Connection, evaluation_id: &EvaluationId) -> Result<Vec<ConceptGap>> {
        let mut stmt = conn.prepare(
            "SELECT id, evaluation_id, concept, severity, resolved
             FROM concept_gaps WHERE evaluation_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![evaluation_id.as_str()], |row| {
            let id: String = row.get(0)?;
            let evaluation_id: String = row.get(1)?;
            let concept: String = row.get(2)?;
            let severity: String = row.get(3)?;
            let resolved: i64 = row.get(4)?;
            Ok((id, evaluation_id, concept, severity, resolved))
        })?;
        let mut gaps = Vec::new();
        for row in rows {
            let (id, evaluation_id, concept, severity, resolved) = row?;
            let severity = GapSeverity::parse(&severity).ok_or_else(|| {
                StoreError::CorruptRow(format!("unknown gap severity: {severity}"))
            })?;
            gaps.push(ConceptGap {
                id: GapId::from_string(id),
                evaluation_id: EvaluationId::from_string(evaluation_id),
                concept,
                severity,
                resolved: resolved != 0,
            });
        }
        Ok(gaps)
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Evaluation>> {
        let id: String = row.get(0)?;
        let answer_id: String = row.get(1)?;
        let question_id: String = row.get(2)?;
        let interview_id: String = row.get(3)?;
        let raw_score: f64 = row.get(4)?;
        let penalty: i8 = row.get(5)?;
        let similarity: Option<f64> = row.get(6)?;
        let completeness: f64 = row.get(7)?;
        let relevance: f64 = row.get(8)?;
        let feedback: String = row.get(9)?;
        let attempt_number: u8 = row.get(10)?;
        let parent_evaluation_id: Option<String> = row.get(11)?;
        let created_at: String = row.get(12)?;

        let feedback: std::result::Result<Feedback, _> = serde_json::from_str(&feedback);
        Ok(feedback.map_err(StoreError::from).map(|feedback| Evaluation {
            id: EvaluationId::from_string(id),
            answer_id: AnswerId::from_string(answer_id),
            question_id: QuestionId::from_string(question_id),
            interview_id: InterviewId::from_string(interview_id),
            raw_score,
            penalty,
            similarity,
            completeness,
            relevance,
            feedback,
            attempt_number,
            parent_evaluation_id: parent_evaluation_id.map(EvaluationId::from_string),
            gaps: Vec::new(),
            created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::repositories::answer::AnswerRepo;
    use crate::repositories::interview::InterviewRepo;
    use crate::repositories::question::QuestionRepo;
    use viva_core::ids::CandidateId;
    use viva_core::model::{
        Answer, AnswerMode, Difficulty, Interview, InterviewStatus, Question, QuestionRef,
        QuestionType,
    };

    struct Fixture {
        conn: Connection,
        interview_id: InterviewId,
        question_id: QuestionId,
    }

    fn fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        let interview = Interview {
            id: InterviewId::new(),
            candidate_id: CandidateId::new(),
            experience_years: 2.0,
            question_ids: Vec::new(),
            status: InterviewStatus::InProgress,
            planning_metadata: serde_json::json!({}),
            follow_up_ids: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        InterviewRepo::create(&conn, &interview).unwrap();

        let question = Question {
            id: QuestionId::new(),
            text: "Explain indexing.".into(),
            question_type: QuestionType::Technical,
            difficulty: Difficulty::Medium,
            skills: vec!["sql".into()],
            ideal_answer: None,
            rationale: None,
        };
        QuestionRepo::create(&conn, &question).unwrap();

        Fixture {
            conn,
            interview_id: interview.id,
            question_id: question.id,
        }
    }

    fn insert_answer(fx: &Fixture) -> AnswerId {
        let answer = Answer {
            id: AnswerId::new(),
            interview_id: fx.interview_id.clone(),
            question_ref: QuestionRef::Main(fx.question_id.clone()),
            text: "answer".into(),
            mode: AnswerMode::Text,
            evaluation_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        AnswerRepo::create(&fx.conn, &answer).unwrap();
        answer.id
    }

    fn sample_evaluation(fx: &Fixture, answer_id: &AnswerId, attempt: u8) -> Evaluation {
        let id = EvaluationId::new();
        Evaluation {
            id: id.clone(),
            answer_id: answer_id.clone(),
            question_id: fx.question_id.clone(),
            interview_id: fx.interview_id.clone(),
            raw_score: 55.0,
            penalty: viva_core::scoring::penalty_for_attempt(attempt),
            similarity: Some(0.42),
            completeness: 0.4,
            relevance: 0.7,
            feedback: Feedback {
                strengths: vec!["clear".into()],
                weaknesses: vec!["shallow".into()],
                suggestions: vec![],
            },
            attempt_number: attempt,
            parent_evaluation_id: None,
            gaps: vec![
                ConceptGap {
                    id: GapId::new(),
                    evaluation_id: id.clone(),
                    concept: "covering indexes".into(),
                    severity: GapSeverity::Moderate,
                    resolved: false,
                },
                ConceptGap {
                    id: GapId::new(),
                    evaluation_id: id,
                    concept: "write amplification".into(),
                    severity: GapSeverity::Minor,
                    resolved: false,
                },
            ],
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn create_and_get_with_gaps() {
        let fx = fixture();
        let answer_id = insert_answer(&fx);
        let eval = sample_evaluation(&fx, &answer_id, 1);
        EvaluationRepo::create(&fx.conn, &eval).unwrap();

        let loaded = EvaluationRepo::get(&fx.conn, &eval.id).unwrap().unwrap();
        assert_eq!(loaded.gaps.len(), 2);
        assert!((loaded.raw_score - 55.0).abs() < f64::EPSILON);
        assert_eq!(loaded.penalty, 0);
        assert_eq!(loaded.similarity, Some(0.42));
        assert_eq!(loaded.feedback.strengths, vec!["clear".to_owned()]);
        assert!((loaded.final_score() - 55.0).abs() < f64::EPSILON);
    }

    #[test]
    fn get_by_answer_id() {
        let fx = fixture();
        let answer_id = insert_answer(&fx);
        let eval = sample_evaluation(&fx, &answer_id, 1);
        EvaluationRepo::create(&fx.conn, &eval).unwrap();

        let loaded = EvaluationRepo::get_by_answer_id(&fx.conn, &answer_id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, eval.id);
    }

    #[test]
    fn list_by_parent_returns_chain() {
        let fx = fixture();
        let root_answer = insert_answer(&fx);
        let root = sample_evaluation(&fx, &root_answer, 1);
        EvaluationRepo::create(&fx.conn, &root).unwrap();

        let child_answer = insert_answer(&fx);
        let child = Evaluation {
            id: EvaluationId::new(),
            attempt_number: 2,
            penalty: -5,
            parent_evaluation_id: Some(root.id.clone()),
            gaps: Vec::new(),
            ..sample_evaluation(&fx, &child_answer, 2)
        };
        EvaluationRepo::create(&fx.conn, &child).unwrap();

        let children = EvaluationRepo::list_by_parent(&fx.conn, &root.id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);
        assert_eq!(children[0].parent_evaluation_id, Some(root.id));
    }

    #[test]
    fn list_main_by_interview_filters_attempts() {
        let fx = fixture();
        let a1 = insert_answer(&fx);
        let main = sample_evaluation(&fx, &a1, 1);
        EvaluationRepo::create(&fx.conn, &main).unwrap();

        let a2 = insert_answer(&fx);
        let follow = Evaluation {
            id: EvaluationId::new(),
            attempt_number: 2,
            penalty: -5,
            parent_evaluation_id: Some(main.id.clone()),
            gaps: Vec::new(),
            ..sample_evaluation(&fx, &a2, 2)
        };
        EvaluationRepo::create(&fx.conn, &follow).unwrap();

        let mains = EvaluationRepo::list_main_by_interview(&fx.conn, &fx.interview_id).unwrap();
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].id, main.id);
    }

    #[test]
    fn resolve_gaps_flips_open_only() {
        let fx = fixture();
        let answer_id = insert_answer(&fx);
        let eval = sample_evaluation(&fx, &answer_id, 1);
        EvaluationRepo::create(&fx.conn, &eval).unwrap();

        assert_eq!(EvaluationRepo::resolve_gaps(&fx.conn, &eval.id).unwrap(), 2);
        // Second call finds nothing open — monotonic, idempotent
        assert_eq!(EvaluationRepo::resolve_gaps(&fx.conn, &eval.id).unwrap(), 0);

        let loaded = EvaluationRepo::get(&fx.conn, &eval.id).unwrap().unwrap();
        assert!(loaded.gaps.iter().all(|g| g.resolved));
    }

    #[test]
    fn similarity_none_roundtrips() {
        let fx = fixture();
        let answer_id = insert_answer(&fx);
        let eval = Evaluation {
            similarity: None,
            ..sample_evaluation(&fx, &answer_id, 1)
        };
        EvaluationRepo::create(&fx.conn, &eval).unwrap();

        let loaded = EvaluationRepo::get(&fx.conn, &eval.id).unwrap().unwrap();
        assert!(loaded.similarity.is_none());
    }

    #[test]
    fn get_missing_returns_none() {
        let fx = fixture();
        assert!(
            EvaluationRepo::get(&fx.conn, &EvaluationId::from("eval_nope"))
                .unwrap()
                .is_none()
        );
    }
}

//! Question repository — immutable main-question rows.

use rusqlite::{Connection, OptionalExtension, params};

use viva_core::ids::QuestionId;
use viva_core::model::{Difficulty, Question, QuestionType};

use crate::errors::{Result, StoreError};

/// Question repository — stateless, every method takes `&Connection`.
pub struct QuestionRepo;

impl QuestionRepo {
    /// Insert a new question.
    pub fn create(conn: &Connection, question: &Question) -> Result<()> {
        let skills = serde_json::to_string(&question.skills)?;
        let _ = conn.execute(
            "INSERT INTO questions (id, text, question_type, difficulty, skills, ideal_answer, rationale)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                question.id.as_str(),
                question.text,
                question.question_type.as_str(),
                question.difficulty.as_str(),
                skills,
                question.ideal_answer,
                question.rationale,
            ],
        )?;
        Ok(())
    }

    /// Fetch a question by ID.
    pub fn get(conn: &Connection, id: &QuestionId) -> Result<Option<Question>> {
        conn.query_row(
            "SELECT id, text, question_type, difficulty, skills, ideal_answer, rationale
             FROM questions WHERE id = ?1",
            params![id.as_str()],
            Self::from_row,
        )
        .optional()?
        .transpose()
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Question>> {
        let id: String = row.get(0)?;
        let text: String = row.get(1)?;
        let question_type: String = row.get(2)?;
        let difficulty: String = row.get(3)?;
        let skills: String = row.get(4)?;
        let ideal_answer: Option<String> = row.get(5)?;
        let rationale: Option<String> = row.get(6)?;

        Ok(build_question(
            id,
            text,
            &question_type,
            &difficulty,
            &skills,
            ideal_answer,
            rationale,
        ))
    }
}

fn build_question(
    id: String,
    text: String,
    question_type: &str,
    difficulty: &str,
    skills: &str,
    ideal_answer: Option<String>,
    rationale: Option<String>,
) -> Result<Question> {
    let question_type = QuestionType::parse(question_type)
        .ok_or_else(|| StoreError::CorruptRow(format!("unknown question type: {question_type}")))?;
    let difficulty = Difficulty::parse(difficulty)
        .ok_or_else(|| StoreError::CorruptRow(format!("unknown difficulty: {difficulty}")))?;
    Ok(Question {
        id: QuestionId::from_string(id),
        text,
        question_type,
        difficulty,
        skills: serde_json::from_str(skills)?,
        ideal_answer,
        rationale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn open_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample_question() -> Question {
        Question {
            id: QuestionId::new(),
            text: "Explain eventual consistency.".into(),
            question_type: QuestionType::SystemDesign,
            difficulty: Difficulty::Hard,
            skills: vec!["distributed systems".into()],
            ideal_answer: Some("Replicas converge...".into()),
            rationale: Some("Tests understanding of CAP trade-offs.".into()),
        }
    }

    #[test]
    fn create_and_get() {
        let conn = open_db();
        let question = sample_question();
        QuestionRepo::create(&conn, &question).unwrap();

        let loaded = QuestionRepo::get(&conn, &question.id).unwrap().unwrap();
        assert_eq!(loaded.text, question.text);
        assert_eq!(loaded.question_type, QuestionType::SystemDesign);
        assert_eq!(loaded.difficulty, Difficulty::Hard);
        assert_eq!(loaded.skills, question.skills);
        assert_eq!(loaded.ideal_answer, question.ideal_answer);
    }

    #[test]
    fn question_without_ideal_answer() {
        let conn = open_db();
        let question = Question {
            ideal_answer: None,
            rationale: None,
            ..sample_question()
        };
        QuestionRepo::create(&conn, &question).unwrap();

        let loaded = QuestionRepo::get(&conn, &question.id).unwrap().unwrap();
        assert!(loaded.ideal_answer.is_none());
        assert!(loaded.rationale.is_none());
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_db();
        assert!(
            QuestionRepo::get(&conn, &QuestionId::from("q_nope"))
                .unwrap()
                .is_none()
        );
    }
}

//! Follow-up question repository.

use rusqlite::{Connection, OptionalExtension, params};

use viva_core::ids::{FollowUpId, QuestionId};
use viva_core::model::FollowUpQuestion;

use crate::errors::Result;

/// Follow-up question repository — stateless, every method takes `&Connection`.
pub struct FollowUpRepo;

impl FollowUpRepo {
    /// Insert a new follow-up question.
    pub fn create(conn: &Connection, follow_up: &FollowUpQuestion) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO follow_up_questions (id, parent_question_id, sequence, text)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                follow_up.id.as_str(),
                follow_up.parent_question_id.as_str(),
                follow_up.sequence,
                follow_up.text,
            ],
        )?;
        Ok(())
    }

    /// Fetch a follow-up by ID.
    pub fn get(conn: &Connection, id: &FollowUpId) -> Result<Option<FollowUpQuestion>> {
        let row = conn
            .query_row(
                "SELECT id, parent_question_id, sequence, text
                 FROM follow_up_questions WHERE id = ?1",
                params![id.as_str()],
                Self::from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All follow-ups for a main question, ordered by sequence.
    pub fn list_by_parent(
        conn: &Connection,
        parent: &QuestionId,
    ) -> Result<Vec<FollowUpQuestion>> {
        let mut stmt = conn.prepare(
            "SELECT id, parent_question_id, sequence, text
             FROM follow_up_questions WHERE parent_question_id = ?1
             ORDER BY sequence ASC",
        )?;
        let rows = stmt
            .query_map(params![parent.as_str()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FollowUpQuestion> {
        Ok(FollowUpQuestion {
            id: FollowUpId::from_string(row.get(0)?),
            parent_question_id: QuestionId::from_string(row.get(1)?),
            sequence: row.get(2)?,
            text: row.get(3)?,
        })
    }
}

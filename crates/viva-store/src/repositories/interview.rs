//! Interview repository — interview rows with JSON-encoded question plans.

use rusqlite::{Connection, OptionalExtension, params};

use viva_core::ids::{CandidateId, FollowUpId, InterviewId, QuestionId};
use viva_core::model::{Interview, InterviewStatus};

use crate::errors::{Result, StoreError};

/// Interview repository — stateless, every method takes `&Connection`.
pub struct InterviewRepo;

impl InterviewRepo {
    /// Insert a new interview.
    pub fn create(conn: &Connection, interview: &Interview) -> Result<()> {
        let question_ids = serde_json::to_string(&interview.question_ids)?;
        let follow_up_ids = serde_json::to_string(&interview.follow_up_ids)?;
        let metadata = serde_json::to_string(&interview.planning_metadata)?;
        let _ = conn.execute(
            "INSERT INTO interviews (id, candidate_id, experience_years, question_ids,
             status, planning_metadata, follow_up_ids, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                interview.id.as_str(),
                interview.candidate_id.as_str(),
                interview.experience_years,
                question_ids,
                interview.status.as_str(),
                metadata,
                follow_up_ids,
                interview.created_at,
            ],
        )?;
        Ok(())
    }

    /// Fetch an interview by ID.
    pub fn get(conn: &Connection, id: &InterviewId) -> Result<Option<Interview>> {
        conn.query_row(
            "SELECT id, candidate_id, experience_years, question_ids, status,
             planning_metadata, follow_up_ids, created_at
             FROM interviews WHERE id = ?1",
            params![id.as_str()],
            Self::from_row,
        )
        .optional()?
        .transpose()
    }

    /// Update the lifecycle status.
    pub fn set_status(
        conn: &Connection,
        id: &InterviewId,
        status: InterviewStatus,
    ) -> Result<()> {
        let changed = conn.execute(
            "UPDATE interviews SET status = ?2 WHERE id = ?1",
            params![id.as_str(), status.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::InterviewNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Record a generated follow-up question on the interview.
    pub fn append_follow_up(
        conn: &Connection,
        id: &InterviewId,
        follow_up_id: &FollowUpId,
    ) -> Result<()> {
        let current: String = conn
            .query_row(
                "SELECT follow_up_ids FROM interviews WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::InterviewNotFound(id.to_string()))?;
        let mut ids: Vec<FollowUpId> = serde_json::from_str(&current)?;
        ids.push(follow_up_id.clone());
        let _ = conn.execute(
            "UPDATE interviews SET follow_up_ids = ?2 WHERE id = ?1",
            params![id.as_str(), serde_json::to_string(&ids)?],
        )?;
        Ok(())
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Interview>> {
        let id: String = row.get(0)?;
        let candidate_id: String = row.get(1)?;
        let experience_years: f64 = row.get(2)?;
        let question_ids: String = row.get(3)?;
        let status: String = row.get(4)?;
        let metadata: String = row.get(5)?;
        let follow_up_ids: String = row.get(6)?;
        let created_at: String = row.get(7)?;

        Ok(build_interview(
            id,
            candidate_id,
            experience_years,
            &question_ids,
            &status,
            &metadata,
            &follow_up_ids,
            created_at,
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_interview(
    id: String,
    candidate_id: String,
    experience_years: f64,
    question_ids: &str,
    status: &str,
    metadata: &str,
    follow_up_ids: &str,
    created_at: String,
) -> Result<Interview> {
    let status = InterviewStatus::parse(status)
        .ok_or_else(|| StoreError::CorruptRow(format!("unknown interview status: {status}")))?;
    let question_ids: Vec<QuestionId> = serde_json::from_str(question_ids)?;
    let follow_up_ids: Vec<FollowUpId> = serde_json::from_str(follow_up_ids)?;
    let planning_metadata = serde_json::from_str(metadata)?;
    Ok(Interview {
        id: InterviewId::from_string(id),
        candidate_id: CandidateId::from_string(candidate_id),
        experience_years,
        question_ids,
        status,
        planning_metadata,
        follow_up_ids,
        created_at,
    })
}

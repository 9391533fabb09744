//! Question vector index with `SQLite` BLOB storage and brute-force KNN.
//!
//! The question bank is small (hundreds of rows), so a linear cosine scan
//! over BLOB-encoded vectors beats carrying a dedicated ANN dependency.

use rusqlite::{Connection, params};

use viva_core::ids::QuestionId;
use viva_core::model::{Difficulty, QuestionType};

use crate::errors::{Result, VectorError};
use crate::normalize::cosine_similarity;

/// Convert an f32 slice to a byte blob for storage.
pub fn f32_slice_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a byte blob back to an f32 vector.
pub fn blob_to_f32_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Metadata filter for vector search.
#[derive(Clone, Debug, Default)]
pub struct SearchFilter {
    /// Restrict matches to one question category.
    pub question_type: Option<QuestionType>,
    /// Restrict matches to one difficulty.
    pub difficulty: Option<Difficulty>,
    /// Exclude a specific question (typically the one being asked).
    pub exclude_question_id: Option<QuestionId>,
}

/// A single search result.
#[derive(Clone, Debug)]
pub struct QuestionMatch {
    /// The matched question.
    pub question_id: QuestionId,
    /// Cosine similarity score (higher = more similar).
    pub similarity: f32,
}

/// Vector index over question embeddings, backed by a regular `SQLite` table.
pub struct QuestionVectorIndex {
    conn: Connection,
    dims: usize,
}

impl QuestionVectorIndex {
    /// Create an index over the given connection with expected dimensions.
    #[must_use]
    pub fn new(conn: Connection, dims: usize) -> Self {
        Self { conn, dims }
    }

    /// Create the `question_vectors` table if it doesn't exist.
    pub fn ensure_table(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS question_vectors (
                question_id TEXT PRIMARY KEY,
                question_type TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
        )?;
        Ok(())
    }

    /// Store an embedding (delete-then-insert for upsert).
    pub fn store(
        &self,
        question_id: &QuestionId,
        question_type: QuestionType,
        difficulty: Difficulty,
        embedding: &[f32],
    ) -> Result<()> {
        if embedding.len() != self.dims {
            return Err(VectorError::Dimensions {
                expected: self.dims,
                got: embedding.len(),
            });
        }
        let blob = f32_slice_to_blob(embedding);
        let _ = self.conn.execute(
            "DELETE FROM question_vectors WHERE question_id = ?1",
            params![question_id.as_str()],
        )?;
        let _ = self.conn.execute(
            "INSERT INTO question_vectors (question_id, question_type, difficulty, embedding)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                question_id.as_str(),
                question_type.as_str(),
                difficulty.as_str(),
                blob
            ],
        )?;
        Ok(())
    }

    /// Count stored vectors.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT count(*) FROM question_vectors", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Search for nearest neighbors using brute-force cosine similarity.
    pub fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<QuestionMatch>> {
        let limit = if limit == 0 { 10 } else { limit };
        let rows = self.load_vectors(filter)?;
        Ok(Self::rank_results(query, rows, limit))
    }

    fn load_vectors(&self, filter: &SearchFilter) -> Result<Vec<(String, Vec<u8>)>> {
        let mut sql =
            String::from("SELECT question_id, embedding FROM question_vectors WHERE 1 = 1");
        let mut args: Vec<String> = Vec::new();

        if let Some(qt) = filter.question_type {
            sql.push_str(&format!(" AND question_type = ?{}", args.len() + 1));
            args.push(qt.as_str().to_owned());
        }
        if let Some(d) = filter.difficulty {
            sql.push_str(&format!(" AND difficulty = ?{}", args.len() + 1));
            args.push(d.as_str().to_owned());
        }
        if let Some(excl) = &filter.exclude_question_id {
            sql.push_str(&format!(" AND question_id != ?{}", args.len() + 1));
            args.push(excl.to_string());
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .filter_map(std::result::Result::ok)
            .collect();
        Ok(rows)
    }

    fn rank_results(
        query: &[f32],
        rows: Vec<(String, Vec<u8>)>,
        limit: usize,
    ) -> Vec<QuestionMatch> {
        let mut results: Vec<QuestionMatch> = rows
            .into_iter()
            .map(|(question_id, blob)| {
                let embedding = blob_to_f32_vec(&blob);
                QuestionMatch {
                    question_id: QuestionId::from(question_id),
                    similarity: cosine_similarity(query, &embedding),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        results
    }
}

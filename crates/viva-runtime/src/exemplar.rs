//! Fail-open exemplar retrieval.
//!
//! Finds up to three previously stored questions similar to the one about
//! to be generated, for stylistic and topical calibration. ANY failure in
//! embedding, search, or hydration degrades to zero exemplars — retrieval
//! must never block question generation.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use viva_core::VivaError;
use viva_core::model::{Difficulty, QuestionType};
use viva_core::scoring::{EXEMPLAR_FETCH_K, EXEMPLAR_MAX, EXEMPLAR_MIN_SIMILARITY, ExperienceBand};
use viva_llm::Exemplar;
use viva_store::InterviewStore;
use viva_vector::{Embedder, QuestionVectorIndex, SearchFilter};

use crate::Result;

/// Retrieves similar past questions to steer generation.
pub struct ExemplarRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<Mutex<QuestionVectorIndex>>,
    store: Arc<InterviewStore>,
}

impl ExemplarRetriever {
    /// Create a retriever over the given embedder, index, and store.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<Mutex<QuestionVectorIndex>>,
        store: Arc<InterviewStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
        }
    }

    /// The retrieval query for a skill/difficulty/experience combination.
    #[must_use]
    pub fn retrieval_query(skill: &str, difficulty: Difficulty, band: ExperienceBand) -> String {
        format!(
            "{} {} interview question for a {} candidate",
            skill,
            difficulty.as_str(),
            band.as_str()
        )
    }

    /// Find up to three exemplars for the given target. Infallible: any
    /// internal failure is logged and yields an empty list.
    #[instrument(skip(self), fields(skill, band = band.as_str()))]
    pub async fn find_exemplars(
        &self,
        skill: &str,
        question_type: QuestionType,
        difficulty: Difficulty,
        band: ExperienceBand,
    ) -> Vec<Exemplar> {
        match self.try_find(skill, question_type, difficulty, band).await {
            Ok(exemplars) => {
                debug!(count = exemplars.len(), "exemplar retrieval complete");
                exemplars
            }
            Err(err) => {
                warn!(error = %err, code = err.code(), "exemplar retrieval failed, continuing without exemplars");
                Vec::new()
            }
        }
    }

    async fn try_find(
        &self,
        skill: &str,
        question_type: QuestionType,
        difficulty: Difficulty,
        band: ExperienceBand,
    ) -> Result<Vec<Exemplar>> {
        let query = Self::retrieval_query(skill, difficulty, band);
        let embedding = self
            .embedder
            .embed(&query)
            .await
            .map_err(|e| VivaError::RetrievalDegraded(e.to_string()))?;

        // Lock released before any await below
        let matches = {
            let index = self.index.lock();
            index
                .search(
                    &embedding,
                    EXEMPLAR_FETCH_K,
                    &SearchFilter {
                        question_type: Some(question_type),
                        difficulty: Some(difficulty),
                        ..Default::default()
                    },
                )
                .map_err(|e| VivaError::RetrievalDegraded(e.to_string()))?
        };

        let mut exemplars = Vec::new();
        for matched in matches {
            if matched.similarity <= EXEMPLAR_MIN_SIMILARITY {
                continue;
            }
            if exemplars.len() >= EXEMPLAR_MAX {
                break;
            }
            let question = self
                .store
                .get_question(&matched.question_id)
                .map_err(|e| VivaError::RetrievalDegraded(e.to_string()))?;
            // A vector without a question row is stale; skip it
            let Some(question) = question else {
                debug!(question_id = %matched.question_id, "vector has no question row, skipping");
                continue;
            };
            exemplars.push(Exemplar {
                text: question.text,
                skills: question.skills,
                difficulty: question.difficulty,
                similarity: f64::from(matched.similarity),
            });
        }
        Ok(exemplars)
    }
}

//! Question generation — exemplar-steered main questions and gap-targeted
//! follow-up text.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use viva_core::ids::QuestionId;
use viva_core::model::{Difficulty, Question, QuestionType};
use viva_core::scoring::ExperienceBand;
use viva_llm::{FollowUpContext, GeneratedQuestion, GenerationRequest, LlmClient};
use viva_store::InterviewStore;
use viva_vector::{Embedder, QuestionVectorIndex};

use crate::Result;
use crate::exemplar::ExemplarRetriever;

/// Generates, enriches, and persists interview questions.
pub struct QuestionGenerator {
    llm: Arc<dyn LlmClient>,
    retriever: Arc<ExemplarRetriever>,
    embedder: Arc<dyn Embedder>,
    index: Arc<Mutex<QuestionVectorIndex>>,
    store: Arc<InterviewStore>,
}

impl QuestionGenerator {
    /// Create a generator over the given ports.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<ExemplarRetriever>,
        embedder: Arc<dyn Embedder>,
        index: Arc<Mutex<QuestionVectorIndex>>,
        store: Arc<InterviewStore>,
    ) -> Self {
        Self {
            llm,
            retriever,
            embedder,
            index,
            store,
        }
    }

    /// Generate and persist a main question for the given target.
    ///
    /// Exemplar retrieval is best-effort and never blocks generation;
    /// indexing the new question's vector is likewise best-effort.
    #[instrument(skip(self), fields(skill, band = band.as_str()))]
    pub async fn generate_main(
        &self,
        skill: &str,
        question_type: QuestionType,
        difficulty: Difficulty,
        band: ExperienceBand,
    ) -> Result<Question> {
        let exemplars = self
            .retriever
            .find_exemplars(skill, question_type, difficulty, band)
            .await;

        let generated = self
            .llm
            .generate_question(&GenerationRequest {
                skill: skill.to_owned(),
                question_type,
                difficulty,
                experience_band: band,
                exemplars: if exemplars.is_empty() {
                    None
                } else {
                    Some(exemplars)
                },
                follow_up: None,
            })
            .await?;

        let ideal_answer = self.llm.generate_ideal_answer(&generated.text).await?;
        let rationale = self
            .llm
            .generate_rationale(&generated.text, &ideal_answer)
            .await?;

        let skills = if generated.skills.is_empty() {
            vec![skill.to_owned()]
        } else {
            generated.skills
        };
        let question = Question {
            id: QuestionId::new(),
            text: generated.text,
            question_type,
            difficulty,
            skills,
            ideal_answer: Some(ideal_answer),
            rationale: Some(rationale),
        };
        self.store.create_question(&question)?;
        self.spawn_index_task(&question);

        debug!(question_id = %question.id, "main question generated");
        Ok(question)
    }

    /// Generate follow-up text targeting the chain's unresolved gaps.
    /// Persistence of the resulting `FollowUpQuestion` is the caller's job.
    #[instrument(skip(self, root), fields(parent = %root.id, attempt = context.attempt_number))]
    pub async fn generate_follow_up(
        &self,
        root: &Question,
        band: ExperienceBand,
        context: FollowUpContext,
    ) -> Result<GeneratedQuestion> {
        let skill = root
            .skills
            .first()
            .cloned()
            .unwrap_or_else(|| root.text.clone());
        let generated = self
            .llm
            .generate_question(&GenerationRequest {
                skill,
                question_type: root.question_type,
                difficulty: root.difficulty,
                experience_band: band,
                exemplars: None,
                follow_up: Some(context),
            })
            .await?;
        Ok(generated)
    }

    // Missing vectors only degrade future retrieval, so indexing failures
    // are logged and swallowed.
    // Indexing never blocks generation; failures are logged and the
    // question simply stays unsearchable until re-indexed.
    fn spawn_index_task(&self, question: &Question) {
        let embedder = self.embedder.clone();
        let index = self.index.clone();
        let question_id = question.id.clone();
        let text = question.text.clone();
        let question_type = question.question_type;
        let difficulty = question.difficulty;
        drop(tokio::spawn(async move {
            let embedding = match embedder.embed(&text).await {
                Ok(embedding) => embedding,
                Err(err) => {
                    warn!(question_id = %question_id, error = %err, "question embedding failed, skipping index");
                    return;
                }
            };
            let stored = {
                let index = index.lock();
                index.store(&question_id, question_type, difficulty, &embedding)
            };
            if let Err(err) = stored {
                warn!(question_id = %question_id, error = %err, "question vector store failed");
            }
        }));
    }
}

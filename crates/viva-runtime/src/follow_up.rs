//! Follow-up decisions — whether to probe again, and with what question.

use std::sync::Arc;

use tracing::{debug, instrument};

use viva_core::ids::FollowUpId;
use viva_core::model::{Evaluation, FollowUpQuestion, Interview, Question};
use viva_core::scoring::{ExperienceBand, MAX_ATTEMPTS, MAX_FOLLOW_UPS};
use viva_llm::FollowUpContext;
use viva_store::InterviewStore;

use crate::Result;
use crate::evaluation::cumulative_unresolved_labels;
use crate::question_gen::QuestionGenerator;

/// Decides whether an evaluation warrants a follow-up question and, if so,
/// generates and persists it.
pub struct FollowUpDecisionEngine {
    store: Arc<InterviewStore>,
    generator: Arc<QuestionGenerator>,
}

impl FollowUpDecisionEngine {
    /// Create a decision engine over the given store and generator.
    pub fn new(store: Arc<InterviewStore>, generator: Arc<QuestionGenerator>) -> Self {
        Self { store, generator }
    }

    /// Decide on a follow-up after an evaluation.
    ///
    /// Returns `Ok(None)` when the chain should end: the attempt cap is
    /// reached, no gaps remain unresolved, or the per-question follow-up
    /// budget is exhausted. Otherwise generates a follow-up targeting the
    /// chain's cumulative unresolved gaps and persists it atomically with
    /// the interview's follow-up list.
    #[instrument(skip_all, fields(interview_id = %interview.id, attempt = evaluation.attempt_number))]
    pub async fn decide(
        &self,
        interview: &Interview,
        root_question: &Question,
        evaluation: &Evaluation,
        follow_up_count: u8,
    ) -> Result<Option<FollowUpQuestion>> {
        if evaluation.attempt_number >= MAX_ATTEMPTS {
            debug!("attempt cap reached, no follow-up");
            return Ok(None);
        }
        let unresolved_gaps = cumulative_unresolved_labels(&self.store, evaluation)?;
        if unresolved_gaps.is_empty() {
            debug!("no unresolved gaps, no follow-up");
            return Ok(None);
        }
        if follow_up_count >= MAX_FOLLOW_UPS {
            debug!("follow-up budget exhausted");
            return Ok(None);
        }

        let band = ExperienceBand::from_years(interview.experience_years);
        let generated = self
            .generator
            .generate_follow_up(
                root_question,
                band,
                FollowUpContext {
                    parent_question_id: root_question.id.clone(),
                    parent_evaluation_id: evaluation.id.clone(),
                    attempt_number: evaluation.attempt_number,
                    unresolved_gaps,
                },
            )
            .await?;

        let follow_up = FollowUpQuestion {
            id: FollowUpId::new(),
            parent_question_id: root_question.id.clone(),
            sequence: evaluation.attempt_number + 1,
            text: generated.text,
        };
        self.store.create_follow_up(&interview.id, &follow_up)?;
        debug!(follow_up_id = %follow_up.id, sequence = follow_up.sequence, "follow-up created");
        Ok(Some(follow_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use viva_core::ids::{AnswerId, CandidateId, EvaluationId, InterviewId, QuestionId};
    use viva_core::model::{
        AnswerMode, ConceptGap, Difficulty, Feedback, GapSeverity, InterviewStatus, QuestionRef,
        QuestionType,
    };
    use viva_core::scoring::penalty_for_attempt;
    use viva_llm::{LlmClient, MockLlmClient};
    use viva_store::{ConnectionConfig, new_in_memory, run_migrations};
    use viva_vector::{Embedder, HashingEmbedder, QuestionVectorIndex};

    use crate::exemplar::ExemplarRetriever;

    struct Fixture {
        store: Arc<InterviewStore>,
        engine: FollowUpDecisionEngine,
        interview: Interview,
        question: Question,
    }

    fn fixture() -> Fixture {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
        }
        let store = Arc::new(InterviewStore::new(pool));
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let index = QuestionVectorIndex::new(
            rusqlite::Connection::open_in_memory().unwrap(),
            embedder.dimensions(),
        );
        index.ensure_table().unwrap();
        let index = Arc::new(Mutex::new(index));
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::new());
        let retriever = Arc::new(ExemplarRetriever::new(
            embedder.clone(),
            index.clone(),
            store.clone(),
        ));
        let generator = Arc::new(QuestionGenerator::new(
            llm,
            retriever,
            embedder,
            index,
            store.clone(),
        ));
        let engine = FollowUpDecisionEngine::new(store.clone(), generator);

        let question = Question {
            id: QuestionId::new(),
            text: "How does an LRU cache evict entries?".into(),
            question_type: QuestionType::Technical,
            difficulty: Difficulty::Medium,
            skills: vec!["caching".into()],
            ideal_answer: None,
            rationale: None,
        };
        store.create_question(&question).unwrap();

        let interview = Interview {
            id: InterviewId::new(),
            candidate_id: CandidateId::new(),
            experience_years: 4.0,
            question_ids: vec![question.id.clone()],
            status: InterviewStatus::InProgress,
            planning_metadata: serde_json::json!({}),
            follow_up_ids: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        store.create_interview(&interview).unwrap();

        Fixture {
            store,
            engine,
            interview,
            question,
        }
    }

    fn persisted_evaluation(fx: &Fixture, attempt: u8, gaps: &[&str], resolved: bool) -> Evaluation {
        let answer = viva_core::model::Answer {
            id: AnswerId::new(),
            interview_id: fx.interview.id.clone(),
            question_ref: QuestionRef::Main(fx.question.id.clone()),
            text: "an answer".into(),
            mode: AnswerMode::Text,
            evaluation_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        fx.store.create_answer(&answer).unwrap();

        let evaluation_id = EvaluationId::new();
        let evaluation = Evaluation {
            id: evaluation_id.clone(),
            answer_id: answer.id,
            question_id: fx.question.id.clone(),
            interview_id: fx.interview.id.clone(),
            raw_score: 55.0,
            penalty: penalty_for_attempt(attempt),
            similarity: None,
            completeness: 0.4,
            relevance: 0.9,
            feedback: Feedback::default(),
            attempt_number: attempt,
            parent_evaluation_id: None,
            gaps: gaps
                .iter()
                .map(|g| ConceptGap {
                    id: viva_core::ids::GapId::new(),
                    evaluation_id: evaluation_id.clone(),
                    concept: (*g).to_owned(),
                    severity: GapSeverity::Moderate,
                    resolved,
                })
                .collect(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        fx.store.record_evaluation(&evaluation).unwrap();
        evaluation
    }

    #[tokio::test]
    async fn unresolved_gaps_trigger_follow_up() {
        let fx = fixture();
        let evaluation = persisted_evaluation(&fx, 1, &["eviction order"], false);

        let follow_up = fx
            .engine
            .decide(&fx.interview, &fx.question, &evaluation, 0)
            .await
            .unwrap()
            .expect("follow-up expected");
        assert_eq!(follow_up.sequence, 2);
        assert_eq!(follow_up.parent_question_id, fx.question.id);
        assert!(follow_up.text.contains("eviction order"));

        // Persisted atomically with the interview's follow-up list
        let interview = fx.store.require_interview(&fx.interview.id).unwrap();
        assert_eq!(interview.follow_up_ids, vec![follow_up.id.clone()]);
        assert!(fx.store.get_follow_up(&follow_up.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn clean_evaluation_ends_the_chain() {
        let fx = fixture();
        let evaluation = persisted_evaluation(&fx, 1, &[], false);
        let decision = fx
            .engine
            .decide(&fx.interview, &fx.question, &evaluation, 0)
            .await
            .unwrap();
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn resolved_gaps_do_not_trigger_follow_up() {
        let fx = fixture();
        let evaluation = persisted_evaluation(&fx, 1, &["eviction order"], true);
        let decision = fx
            .engine
            .decide(&fx.interview, &fx.question, &evaluation, 0)
            .await
            .unwrap();
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn attempt_cap_ends_the_chain() {
        let fx = fixture();
        let evaluation = persisted_evaluation(&fx, 3, &["eviction order"], false);
        let decision = fx
            .engine
            .decide(&fx.interview, &fx.question, &evaluation, 2)
            .await
            .unwrap();
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn follow_up_budget_ends_the_chain() {
        let fx = fixture();
        let evaluation = persisted_evaluation(&fx, 2, &["eviction order"], false);
        let decision = fx
            .engine
            .decide(&fx.interview, &fx.question, &evaluation, 3)
            .await
            .unwrap();
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn second_follow_up_has_sequence_three() {
        let fx = fixture();
        let evaluation = persisted_evaluation(&fx, 2, &["eviction order"], false);
        let follow_up = fx
            .engine
            .decide(&fx.interview, &fx.question, &evaluation, 1)
            .await
            .unwrap()
            .expect("follow-up expected");
        assert_eq!(follow_up.sequence, 3);
    }
}

//! Answer evaluation — scoring, penalties, gap creation and resolution.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use viva_core::VivaError;
use viva_core::ids::{AnswerId, EvaluationId, GapId};
use viva_core::model::{
    Answer, AnswerMode, ConceptGap, Evaluation, Interview, Question, QuestionRef,
};
use viva_core::scoring::{penalty_for_attempt, resolves_gaps};
use viva_llm::{EvaluationRequest, LlmClient};
use viva_store::InterviewStore;
use viva_vector::{Embedder, answer_similarity};

use crate::Result;

/// One answer submission to be scored.
pub struct EvaluationInput<'a> {
    /// The owning interview.
    pub interview: &'a Interview,
    /// The root main question of the active chain.
    pub root_question: &'a Question,
    /// The question (main or follow-up) actually being answered.
    pub question_ref: QuestionRef,
    /// Text of the question as presented to the candidate.
    pub question_text: &'a str,
    /// The candidate's answer.
    pub answer_text: &'a str,
    /// Delivery mode.
    pub mode: AnswerMode,
    /// Attempt number within the chain (1–3).
    pub attempt_number: u8,
    /// The evaluation that triggered this attempt, for attempts > 1.
    pub parent_evaluation: Option<&'a Evaluation>,
}

/// Scores answers and maintains the gap ledger.
pub struct EvaluationEngine {
    store: Arc<InterviewStore>,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
}

impl EvaluationEngine {
    /// Create an engine over the given store, LLM port, and embedder.
    pub fn new(
        store: Arc<InterviewStore>,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            store,
            llm,
            embedder,
        }
    }

    /// Evaluate one answer.
    ///
    /// The Answer row is persisted before the scoring call, so a
    /// generation failure leaves an auditable answer with no linked
    /// evaluation; a retry submits fresh.
    #[instrument(skip_all, fields(interview_id = %input.interview.id, attempt = input.attempt_number))]
    pub async fn evaluate(&self, input: EvaluationInput<'_>) -> Result<Evaluation> {
        let answer = Answer {
            id: AnswerId::new(),
            interview_id: input.interview.id.clone(),
            question_ref: input.question_ref.clone(),
            text: input.answer_text.to_owned(),
            mode: input.mode,
            evaluation_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.store.create_answer(&answer)?;

        let prior_unresolved_gaps = match input.parent_evaluation {
            Some(parent) => cumulative_unresolved_labels(&self.store, parent)?,
            None => Vec::new(),
        };

        let assessment = self
            .llm
            .evaluate_answer(&EvaluationRequest {
                question_text: input.question_text.to_owned(),
                answer_text: input.answer_text.to_owned(),
                attempt_number: input.attempt_number,
                prior_unresolved_gaps,
            })
            .await?;

        // Similarity is supplementary: absent ideal answer or a failed
        // embedding both yield None, never zero.
        let similarity = match input.root_question.ideal_answer.as_deref() {
            Some(ideal) => {
                answer_similarity(self.embedder.as_ref(), ideal, input.answer_text).await
            }
            None => None,
        };

        let evaluation_id = EvaluationId::new();
        let gaps = assessment
            .gaps
            .iter()
            .map(|g| ConceptGap {
                id: GapId::new(),
                evaluation_id: evaluation_id.clone(),
                concept: g.concept.clone(),
                severity: g.severity,
                resolved: false,
            })
            .collect();

        let mut evaluation = Evaluation {
            id: evaluation_id,
            answer_id: answer.id,
            question_id: input.root_question.id.clone(),
            interview_id: input.interview.id.clone(),
            raw_score: assessment.score,
            penalty: penalty_for_attempt(input.attempt_number),
            similarity,
            completeness: assessment.completeness,
            relevance: assessment.relevance,
            feedback: assessment.feedback,
            attempt_number: input.attempt_number,
            parent_evaluation_id: input.parent_evaluation.map(|p| p.id.clone()),
            gaps,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.store.record_evaluation(&evaluation)?;

        if resolves_gaps(
            evaluation.final_score(),
            evaluation.completeness,
            evaluation.attempt_number,
        ) {
            self.resolve_chain(&evaluation)?;
            for gap in &mut evaluation.gaps {
                gap.resolved = true;
            }
        }

        debug!(
            evaluation_id = %evaluation.id,
            final_score = evaluation.final_score(),
            gaps = evaluation.gaps.len(),
            "answer evaluated"
        );
        Ok(evaluation)
    }

    /// Resolve this evaluation's gaps and every still-open gap up the
    /// parent chain. Resolution is terminal; already-resolved gaps are
    /// untouched.
    fn resolve_chain(&self, evaluation: &Evaluation) -> Result<()> {
        let _ = self.store.resolve_gaps(&evaluation.id)?;
        let mut parent_id = evaluation.parent_evaluation_id.clone();
        while let Some(id) = parent_id {
            match self.store.get_evaluation(&id)? {
                Some(parent) => {
                    let resolved = self.store.resolve_gaps(&parent.id)?;
                    if resolved > 0 {
                        debug!(evaluation_id = %parent.id, resolved, "parent gaps resolved");
                    }
                    parent_id = parent.parent_evaluation_id;
                }
                None => {
                    warn!(evaluation_id = %id, "parent evaluation missing, stopping gap propagation");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Cumulative de-duplicated unresolved gap labels across a question chain,
/// root first, walking parent links from the given leaf evaluation.
pub fn cumulative_unresolved_labels(
    store: &InterviewStore,
    leaf: &Evaluation,
) -> Result<Vec<String>> {
    let mut chain = vec![leaf.clone()];
    let mut parent_id = leaf.parent_evaluation_id.clone();
    while let Some(id) = parent_id {
        let parent = store
            .get_evaluation(&id)?
            .ok_or_else(|| VivaError::not_found("evaluation", id.as_str()))?;
        parent_id = parent.parent_evaluation_id.clone();
        chain.push(parent);
    }
    chain.reverse();

    let mut labels = Vec::new();
    for evaluation in &chain {
        for label in evaluation.unresolved_gap_labels() {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    }
    Ok(labels)
}

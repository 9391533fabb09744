//! Deterministic mock adapter for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::LlmClient;
use crate::errors::{LlmError, Result};
use crate::types::{
    AnswerAssessment, EvaluationRequest, GapAssessment, GeneratedQuestion, GenerationRequest,
};
use viva_core::model::GapSeverity;

/// [`LlmClient`] implementation with no I/O.
///
/// Question and text generation are pure functions of the request, so runs
/// are reproducible. Evaluations come from a scripted queue when one is
/// loaded, falling back to a word-count heuristic; `set_failing(true)`
/// makes every call error, for exercising failure paths.
#[derive(Default)]
pub struct MockLlmClient {
    scripted: Mutex<VecDeque<AnswerAssessment>>,
    failing: AtomicBool,
    generation_failing: AtomicBool,
}

impl MockLlmClient {
    /// Create a mock with heuristic evaluations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an assessment to be returned by the next `evaluate_answer` call.
    pub fn push_assessment(&self, assessment: AnswerAssessment) {
        self.scripted.lock().push_back(assessment);
    }

    /// Make every call fail (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make only the `generate_*` calls fail, leaving evaluation working.
    pub fn set_generation_failing(&self, failing: bool) {
        self.generation_failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::InvalidResponse("mock configured to fail".into()));
        }
        Ok(())
    }

    fn check_generation_failing(&self) -> Result<()> {
        self.check_failing()?;
        if self.generation_failing.load(Ordering::SeqCst) {
            return Err(LlmError::InvalidResponse(
                "mock configured to fail generation".into(),
            ));
        }
        Ok(())
    }

    fn heuristic_assessment(request: &EvaluationRequest) -> AnswerAssessment {
        let words = request.answer_text.split_whitespace().count();
        #[allow(clippy::cast_precision_loss)]
        let score = (words as f64 * 12.0).min(95.0);
        #[allow(clippy::cast_precision_loss)]
        let completeness = (words as f64 / 15.0).min(1.0);

        let mut gaps = Vec::new();
        if score < 80.0 {
            gaps.push(GapAssessment {
                concept: "supporting detail".into(),
                severity: GapSeverity::Moderate,
            });
            gaps.extend(request.prior_unresolved_gaps.iter().map(|g| GapAssessment {
                concept: g.clone(),
                severity: GapSeverity::Moderate,
            }));
        }

        AnswerAssessment {
            score,
            completeness,
            relevance: 0.9,
            feedback: viva_core::model::Feedback::default(),
            gaps,
            sentiment: None,
            reasoning: None,
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate_question(&self, request: &GenerationRequest) -> Result<GeneratedQuestion> {
        self.check_generation_failing()?;
        let text = match &request.follow_up {
            Some(ctx) if !ctx.unresolved_gaps.is_empty() => format!(
                "Earlier you did not cover {}. Can you walk me through that now?",
                ctx.unresolved_gaps.join(" and ")
            ),
            Some(_) => "Can you go deeper on your previous answer?".to_owned(),
            None => format!(
                "Explain how you would apply {} in production, including the trade-offs a {} engineer should weigh.",
                request.skill,
                request.experience_band.as_str()
            ),
        };
        Ok(GeneratedQuestion {
            text,
            skills: vec![request.skill.clone()],
        })
    }

    async fn generate_ideal_answer(&self, question_text: &str) -> Result<String> {
        self.check_generation_failing()?;
        Ok(format!(
            "A strong answer to \"{question_text}\" covers the core mechanism, \
             the main trade-offs, and one concrete production example."
        ))
    }

    async fn generate_rationale(&self, question_text: &str, _ideal_answer: &str) -> Result<String> {
        self.check_generation_failing()?;
        Ok(format!(
            "The ideal answer demonstrates applied understanding of the topic \
             behind \"{question_text}\", not just definitions."
        ))
    }

    async fn evaluate_answer(&self, request: &EvaluationRequest) -> Result<AnswerAssessment> {
        self.check_failing()?;
        if let Some(scripted) = self.scripted.lock().pop_front() {
            return Ok(scripted);
        }
        Ok(Self::heuristic_assessment(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use viva_core::model::{Difficulty, QuestionType};
    use viva_core::scoring::ExperienceBand;

    fn eval_request(answer: &str) -> EvaluationRequest {
        EvaluationRequest {
            question_text: "Explain sharding.".into(),
            answer_text: answer.into(),
            attempt_number: 1,
            prior_unresolved_gaps: vec![],
        }
    }

    #[tokio::test]
    async fn question_generation_is_deterministic() {
        let mock = MockLlmClient::new();
        let request = GenerationRequest {
            skill: "sharding".into(),
            question_type: QuestionType::SystemDesign,
            difficulty: Difficulty::Hard,
            experience_band: ExperienceBand::Senior,
            exemplars: None,
            follow_up: None,
        };
        let a = mock.generate_question(&request).await.unwrap();
        let b = mock.generate_question(&request).await.unwrap();
        assert_eq!(a.text, b.text);
        assert!(a.text.contains("sharding"));
        assert_eq!(a.skills, vec!["sharding"]);
    }

    #[tokio::test]
    async fn scripted_assessments_return_in_order() {
        let mock = MockLlmClient::new();
        for score in [30.0, 85.0] {
            mock.push_assessment(AnswerAssessment {
                score,
                completeness: 0.5,
                relevance: 0.9,
                feedback: viva_core::model::Feedback::default(),
                gaps: vec![],
                sentiment: None,
                reasoning: None,
            });
        }
        let first = mock.evaluate_answer(&eval_request("x")).await.unwrap();
        let second = mock.evaluate_answer(&eval_request("x")).await.unwrap();
        assert!((first.score - 30.0).abs() < f64::EPSILON);
        assert!((second.score - 85.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn heuristic_rewards_longer_answers() {
        let mock = MockLlmClient::new();
        let short = mock.evaluate_answer(&eval_request("splits data")).await.unwrap();
        let long = mock
            .evaluate_answer(&eval_request(
                "sharding splits data across nodes by key so each node holds a \
                 subset, improving write throughput at the cost of cross shard queries",
            ))
            .await
            .unwrap();
        assert!(long.score > short.score);
        assert!(short.gaps.iter().any(|g| g.concept == "supporting detail"));
        assert!(long.gaps.is_empty());
    }

    #[tokio::test]
    async fn failing_mode_errors_every_port() {
        let mock = MockLlmClient::new();
        mock.set_failing(true);
        assert_matches!(
            mock.generate_ideal_answer("q").await,
            Err(LlmError::InvalidResponse(_))
        );
        assert_matches!(
            mock.evaluate_answer(&eval_request("x")).await,
            Err(LlmError::InvalidResponse(_))
        );
        mock.set_failing(false);
        assert!(mock.generate_ideal_answer("q").await.is_ok());
    }

    #[tokio::test]
    async fn generation_failing_mode_spares_evaluation() {
        let mock = MockLlmClient::new();
        mock.set_generation_failing(true);
        assert_matches!(
            mock.generate_ideal_answer("q").await,
            Err(LlmError::InvalidResponse(_))
        );
        assert!(mock.evaluate_answer(&eval_request("x")).await.is_ok());
        mock.set_generation_failing(false);
        assert!(mock.generate_ideal_answer("q").await.is_ok());
    }
}

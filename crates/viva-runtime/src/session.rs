//! Per-interview session actor.
//!
//! One orchestrator task owns each live interview. Commands arrive on an
//! mpsc channel, events leave on another; because a single task does all
//! the work, event order is total within a session and no locking is
//! needed around session state.
//!
//! State machine:
//!
//! ```text
//! Idle ──start──▶ Questioning ──submit──▶ Evaluating ──┬─▶ FollowUp ─submit─▶ Evaluating
//!                      ▲                               ├─▶ Questioning (next main question)
//!                      └───────────────────────────────┴─▶ Complete (terminal)
//! ```

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use std::collections::HashMap;
use std::sync::Arc;

use viva_core::VivaError;
use viva_core::events::{SessionEvent, SessionSnapshot};
use viva_core::ids::InterviewId;
use viva_core::model::{
    AnswerMode, Evaluation, FollowUpQuestion, Interview, InterviewStatus, Question, QuestionRef,
};
use viva_core::scoring::FIRST_ATTEMPT;
use viva_store::InterviewStore;

use crate::Result;
use crate::evaluation::{EvaluationEngine, EvaluationInput};
use crate::follow_up::FollowUpDecisionEngine;

/// Session state machine states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Created, not yet started.
    Idle,
    /// A main question is awaiting an answer.
    Questioning,
    /// An answer is being scored.
    Evaluating,
    /// A follow-up question is awaiting an answer.
    FollowUp,
    /// Terminal.
    Complete,
}

impl SessionState {
    /// Wire/diagnostic name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Questioning => "questioning",
            Self::Evaluating => "evaluating",
            Self::FollowUp => "follow_up",
            Self::Complete => "complete",
        }
    }
}

/// Commands a session accepts.
pub(crate) enum SessionCommand {
    Start {
        reply: oneshot::Sender<Result<()>>,
    },
    SubmitAnswer {
        text: String,
        mode: AnswerMode,
        question_id: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    GetState {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

/// Cheap handle for sending commands to a running session.
#[derive(Clone)]
pub struct SessionClient {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionClient {
    /// Begin the interview: validates, transitions to questioning, and
    /// emits the first question event.
    pub async fn start(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Start { reply: tx }).await?;
        rx.await
            .map_err(|_| VivaError::Internal("session closed".into()))?
    }

    /// Submit an answer to the currently presented question.
    pub async fn submit_answer(&self, text: impl Into<String>, mode: AnswerMode) -> Result<()> {
        self.submit_answer_inner(text.into(), mode, None).await
    }

    /// Submit an answer targeted at a specific question id. The session
    /// rejects the answer if that question is not the one being asked,
    /// which guards against stale clients answering out of turn.
    pub async fn submit_answer_to(
        &self,
        question_id: impl Into<String>,
        text: impl Into<String>,
        mode: AnswerMode,
    ) -> Result<()> {
        self.submit_answer_inner(text.into(), mode, Some(question_id.into()))
            .await
    }

    async fn submit_answer_inner(
        &self,
        text: String,
        mode: AnswerMode,
        question_id: Option<String>,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::SubmitAnswer {
            text,
            mode,
            question_id,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| VivaError::Internal("session closed".into()))?
    }

    /// Read-only snapshot of the session's current state.
    pub async fn get_state(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetState { reply: tx }).await?;
        rx.await
            .map_err(|_| VivaError::Internal("session closed".into()))
    }

    /// Ask the session task to exit.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| VivaError::Internal("session closed".into()))
    }
}

/// A spawned session: command client plus the owning task.
pub struct SessionHandle {
    /// Command-sending side.
    pub client: SessionClient,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Abort the session task without a handshake.
    pub fn abort(&self) {
        self.task.abort();
    }
}

// Mutable progression fields, snapshotted before each risky step so a
// failure can roll the in-memory view back while storage keeps the
// already-committed rows.
#[derive(Clone)]
struct Progress {
    state: SessionState,
    question_index: usize,
    follow_up_count: u8,
    current_question: Option<Question>,
    current_follow_up: Option<FollowUpQuestion>,
    latest_evaluation: Option<Evaluation>,
}

/// The per-interview actor. Construct via [`SessionOrchestrator::spawn`].
pub struct SessionOrchestrator {
    interview_id: InterviewId,
    store: Arc<InterviewStore>,
    evaluator: EvaluationEngine,
    decider: FollowUpDecisionEngine,
    events: mpsc::Sender<SessionEvent>,
    interview: Option<Interview>,
    progress: Progress,
    started_at: Option<String>,
    updated_at: String,
}

impl SessionOrchestrator {
    /// Spawn a session task for the given interview.
    #[must_use]
    pub fn spawn(
        interview_id: InterviewId,
        store: Arc<InterviewStore>,
        evaluator: EvaluationEngine,
        decider: FollowUpDecisionEngine,
        events: mpsc::Sender<SessionEvent>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(32);
        let orchestrator = Self {
            interview_id,
            store,
            evaluator,
            decider,
            events,
            interview: None,
            progress: Progress {
                state: SessionState::Idle,
                question_index: 0,
                follow_up_count: 0,
                current_question: None,
                current_follow_up: None,
                latest_evaluation: None,
            },
            started_at: None,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let task = tokio::spawn(orchestrator.run(rx));
        SessionHandle {
            client: SessionClient { commands: tx },
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        debug!(interview_id = %self.interview_id, "session task started");
        while let Some(command) = commands.recv().await {
            match command {
                SessionCommand::Start { reply } => {
                    let result = self.handle_start().await;
                    if let Err(err) = &result {
                        self.emit_error(err).await;
                    }
                    let _ = reply.send(result);
                }
                SessionCommand::SubmitAnswer {
                    text,
                    mode,
                    question_id,
                    reply,
                } => {
                    let result = self.handle_submit(&text, mode, question_id.as_deref()).await;
                    if let Err(err) = &result {
                        self.emit_error(err).await;
                    }
                    let _ = reply.send(result);
                }
                SessionCommand::GetState { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                SessionCommand::Shutdown => break,
            }
        }
        debug!(interview_id = %self.interview_id, "session task exiting");
    }

    // ── start ───────────────────────────────────────────────────────────

    /// Validate-then-transition: every lookup happens while still Idle, so
    /// a failed start leaves the session startable.
    #[instrument(skip(self), fields(interview_id = %self.interview_id))]
    async fn handle_start(&mut self) -> Result<()> {
        if self.progress.state != SessionState::Idle {
            return Err(VivaError::InvalidTransition {
                operation: "start",
                current: self.progress.state.as_str().to_owned(),
                allowed: "idle".to_owned(),
            });
        }

        let interview = self.store.require_interview(&self.interview_id)?;
        if matches!(
            interview.status,
            InterviewStatus::InProgress | InterviewStatus::Complete
        ) {
            return Err(VivaError::InvalidTransition {
                operation: "start",
                current: interview.status.as_str().to_owned(),
                allowed: "preparing, ready".to_owned(),
            });
        }
        let first_id = interview
            .question_ids
            .first()
            .ok_or_else(|| VivaError::not_found("question", self.interview_id.as_str()))?
            .clone();
        let first = self.store.require_question(&first_id)?;

        self.store
            .set_interview_status(&self.interview_id, InterviewStatus::InProgress)?;
        let total = interview.question_ids.len();
        self.interview = Some(interview);
        self.progress.state = SessionState::Questioning;
        self.progress.current_question = Some(first.clone());
        self.started_at = Some(chrono::Utc::now().to_rfc3339());
        self.touch();

        info!(interview_id = %self.interview_id, total, "interview started");
        self.emit(SessionEvent::Question {
            interview_id: self.interview_id.clone(),
            id: first.id.clone(),
            text: first.text,
            question_type: first.question_type,
            difficulty: first.difficulty,
            index: 0,
            total,
        })
        .await;
        Ok(())
    }

    // ── submit ──────────────────────────────────────────────────────────

    #[instrument(skip(self, text), fields(interview_id = %self.interview_id, state = self.progress.state.as_str()))]
    async fn handle_submit(
        &mut self,
        text: &str,
        mode: AnswerMode,
        question_id: Option<&str>,
    ) -> Result<()> {
        if !matches!(
            self.progress.state,
            SessionState::Questioning | SessionState::FollowUp
        ) {
            return Err(VivaError::InvalidTransition {
                operation: "submit_answer",
                current: self.progress.state.as_str().to_owned(),
                allowed: "questioning, follow_up".to_owned(),
            });
        }
        if let Some(target) = question_id {
            let active = match self.progress.state {
                SessionState::FollowUp => self
                    .progress
                    .current_follow_up
                    .as_ref()
                    .map(|f| f.id.as_str().to_owned()),
                _ => self
                    .progress
                    .current_question
                    .as_ref()
                    .map(|q| q.id.as_str().to_owned()),
            };
            if active.as_deref() != Some(target) {
                return Err(VivaError::not_found("question", target));
            }
        }

        let backup = self.progress.clone();
        self.progress.state = SessionState::Evaluating;
        self.touch();

        match self.evaluate_and_progress(text, mode, &backup).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Storage keeps whatever was committed (the orphaned
                // Answer in particular); the in-memory view rolls back so
                // the candidate can answer again.
                self.progress = backup;
                self.touch();
                Err(err)
            }
        }
    }

    async fn evaluate_and_progress(
        &mut self,
        text: &str,
        mode: AnswerMode,
        before: &Progress,
    ) -> Result<()> {
        let interview = self
            .interview
            .clone()
            .ok_or_else(|| VivaError::Internal("session has no interview loaded".into()))?;
        let root = before
            .current_question
            .clone()
            .ok_or_else(|| VivaError::Internal("no active question".into()))?;

        let (question_ref, question_text, attempt_number) = match before.state {
            SessionState::FollowUp => {
                let follow_up = before
                    .current_follow_up
                    .clone()
                    .ok_or_else(|| VivaError::Internal("no active follow-up".into()))?;
                let attempt = before
                    .latest_evaluation
                    .as_ref()
                    .map_or(FIRST_ATTEMPT, |e| e.attempt_number)
                    + 1;
                (
                    QuestionRef::FollowUp(follow_up.id.clone()),
                    follow_up.text,
                    attempt,
                )
            }
            _ => (
                QuestionRef::Main(root.id.clone()),
                root.text.clone(),
                FIRST_ATTEMPT,
            ),
        };

        let evaluation = self
            .evaluator
            .evaluate(EvaluationInput {
                interview: &interview,
                root_question: &root,
                question_ref,
                question_text: &question_text,
                answer_text: text,
                mode,
                attempt_number,
                parent_evaluation: before.latest_evaluation.as_ref(),
            })
            .await?;

        self.emit(SessionEvent::Evaluation {
            interview_id: self.interview_id.clone(),
            answer_id: evaluation.answer_id.clone(),
            score: evaluation.final_score(),
            feedback: evaluation.feedback.clone(),
        })
        .await;

        let decision = self
            .decider
            .decide(&interview, &root, &evaluation, before.follow_up_count)
            .await?;

        match decision {
            Some(follow_up) => {
                self.progress.follow_up_count = before.follow_up_count + 1;
                self.progress.latest_evaluation = Some(evaluation);
                self.progress.current_follow_up = Some(follow_up.clone());
                self.progress.state = SessionState::FollowUp;
                self.touch();
                self.emit(SessionEvent::FollowUpQuestion {
                    interview_id: self.interview_id.clone(),
                    id: follow_up.id,
                    parent_question_id: follow_up.parent_question_id,
                    sequence: follow_up.sequence,
                    text: follow_up.text,
                })
                .await;
            }
            None => self.advance(&interview, before.question_index).await?,
        }
        Ok(())
    }

    /// Move to the next main question, or finish the interview.
    async fn advance(&mut self, interview: &Interview, current_index: usize) -> Result<()> {
        let next_index = current_index + 1;
        self.progress.question_index = next_index;
        self.progress.follow_up_count = 0;
        self.progress.current_follow_up = None;
        self.progress.latest_evaluation = None;

        if let Some(next_id) = interview.question_ids.get(next_index) {
            let next = self.store.require_question(next_id)?;
            self.progress.current_question = Some(next.clone());
            self.progress.state = SessionState::Questioning;
            self.touch();
            self.emit(SessionEvent::Question {
                interview_id: self.interview_id.clone(),
                id: next.id.clone(),
                text: next.text,
                question_type: next.question_type,
                difficulty: next.difficulty,
                index: next_index,
                total: interview.question_ids.len(),
            })
            .await;
            return Ok(());
        }

        self.progress.current_question = None;
        self.progress.state = SessionState::Complete;
        self.store
            .set_interview_status(&self.interview_id, InterviewStatus::Complete)?;
        self.touch();

        let overall_score = self.overall_score()?;
        info!(interview_id = %self.interview_id, overall_score, "interview complete");
        self.emit(SessionEvent::InterviewComplete {
            interview_id: self.interview_id.clone(),
            overall_score,
            summary: format!(
                "Covered {} question{} with an overall score of {overall_score:.1}.",
                interview.question_ids.len(),
                if interview.question_ids.len() == 1 { "" } else { "s" },
            ),
        })
        .await;
        Ok(())
    }

    /// Mean final score across main-question evaluations. Follow-up
    /// evaluations shape the flow but not the aggregate.
    ///
    /// A submit that rolled back after evaluation leaves a superseded
    /// first attempt behind; only the latest evaluation per question
    /// counts, so retries replace the aborted row in the aggregate.
    fn overall_score(&self) -> Result<f64> {
        let mains = self.store.list_main_evaluations(&self.interview_id)?;
        let mut latest = HashMap::new();
        for evaluation in &mains {
            let _ = latest.insert(evaluation.question_id.clone(), evaluation.final_score());
        }
        if latest.is_empty() {
            return Ok(0.0);
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = latest.values().sum::<f64>() / latest.len() as f64;
        Ok(mean)
    }

    // ── plumbing ────────────────────────────────────────────────────────

    fn snapshot(&self) -> SessionSnapshot {
        let current_question_id = match self.progress.state {
            SessionState::Idle | SessionState::Complete => None,
            _ => self
                .progress
                .current_follow_up
                .as_ref()
                .map(|f| f.id.as_str().to_owned())
                .or_else(|| {
                    self.progress
                        .current_question
                        .as_ref()
                        .map(|q| q.id.as_str().to_owned())
                }),
        };
        SessionSnapshot {
            state: self.progress.state.as_str().to_owned(),
            current_question_id,
            follow_up_count: self.progress.follow_up_count,
            question_index: self.progress.question_index,
            question_total: self
                .interview
                .as_ref()
                .map_or(0, |i| i.question_ids.len()),
            started_at: self.started_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }

    async fn emit(&self, event: SessionEvent) {
        debug!(interview_id = %self.interview_id, event = event.event_type(), "emit");
        // A closed receiver means the transport went away; session state
        // remains consistent regardless.
        if self.events.send(event).await.is_err() {
            warn!(interview_id = %self.interview_id, "event receiver closed");
        }
    }

    async fn emit_error(&self, err: &VivaError) {
        self.emit(SessionEvent::Error {
            interview_id: self.interview_id.clone(),
            code: err.code().to_owned(),
            message: err.to_string(),
        })
        .await;
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

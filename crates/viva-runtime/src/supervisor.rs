//! Supervisor — owns the live-session registry and the shared ports every
//! session is built from.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use viva_core::events::SessionEvent;
use viva_core::ids::InterviewId;
use viva_llm::LlmClient;
use viva_store::InterviewStore;
use viva_vector::{Embedder, QuestionVectorIndex};

use crate::evaluation::EvaluationEngine;
use crate::exemplar::ExemplarRetriever;
use crate::follow_up::FollowUpDecisionEngine;
use crate::question_gen::QuestionGenerator;
use crate::session::{SessionClient, SessionHandle, SessionOrchestrator};

/// Registry of live interview sessions.
///
/// One supervisor per process. Sessions are spawned on demand, keyed by
/// interview ID; a second spawn for the same interview returns the live
/// session's client rather than a duplicate actor.
pub struct SessionSupervisor {
    store: Arc<InterviewStore>,
    llm: Arc<dyn LlmClient>,
    embedder: Arc<dyn Embedder>,
    index: Arc<Mutex<QuestionVectorIndex>>,
    sessions: DashMap<InterviewId, SessionHandle>,
}

impl SessionSupervisor {
    /// Create a supervisor over the shared ports.
    pub fn new(
        store: Arc<InterviewStore>,
        llm: Arc<dyn LlmClient>,
        embedder: Arc<dyn Embedder>,
        index: Arc<Mutex<QuestionVectorIndex>>,
    ) -> Self {
        Self {
            store,
            llm,
            embedder,
            index,
            sessions: DashMap::new(),
        }
    }

    /// Generator wired to the supervisor's shared ports, for pre-session
    /// question planning.
    #[must_use]
    pub fn question_generator(&self) -> QuestionGenerator {
        let retriever = Arc::new(ExemplarRetriever::new(
            self.embedder.clone(),
            self.index.clone(),
            self.store.clone(),
        ));
        QuestionGenerator::new(
            self.llm.clone(),
            retriever,
            self.embedder.clone(),
            self.index.clone(),
            self.store.clone(),
        )
    }

    /// Spawn (or reuse) the session for an interview. Events flow to the
    /// given sender; a reused session keeps its original sender.
    #[instrument(skip(self, events))]
    pub fn spawn_session(
        &self,
        interview_id: &InterviewId,
        events: tokio::sync::mpsc::Sender<SessionEvent>,
    ) -> SessionClient {
        if let Some(existing) = self.sessions.get(interview_id) {
            debug!(interview_id = %interview_id, "reusing live session");
            return existing.client.clone();
        }

        let evaluator = EvaluationEngine::new(
            self.store.clone(),
            self.llm.clone(),
            self.embedder.clone(),
        );
        let decider = FollowUpDecisionEngine::new(
            self.store.clone(),
            Arc::new(self.question_generator()),
        );
        let handle = SessionOrchestrator::spawn(
            interview_id.clone(),
            self.store.clone(),
            evaluator,
            decider,
            events,
        );
        let client = handle.client.clone();
        let _ = self.sessions.insert(interview_id.clone(), handle);
        info!(interview_id = %interview_id, active = self.sessions.len(), "session spawned");
        client
    }

    /// Client for a live session, if one exists.
    #[must_use]
    pub fn get(&self, interview_id: &InterviewId) -> Option<SessionClient> {
        self.sessions.get(interview_id).map(|s| s.client.clone())
    }

    /// Whether a session is live for this interview.
    #[must_use]
    pub fn is_active(&self, interview_id: &InterviewId) -> bool {
        self.sessions.contains_key(interview_id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Remove and stop a session. Idempotent.
    pub async fn teardown(&self, interview_id: &InterviewId) {
        if let Some((_, handle)) = self.sessions.remove(interview_id) {
            handle.client.shutdown().await;
            info!(interview_id = %interview_id, active = self.sessions.len(), "session torn down");
        }
    }

    /// Abort every live session without a handshake. Used on server exit.
    pub fn abort_all(&self) {
        for entry in &self.sessions {
            entry.value().abort();
        }
        self.sessions.clear();
    }
}

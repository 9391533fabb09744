//! Connection registry — fan-out of session events to the sockets
//! watching an interview.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use viva_core::ids::InterviewId;

use super::connection::ClientConnection;

/// Live WebSocket connections, keyed by connection ID.
///
/// A reconnecting client gets a fresh connection entry; the session's
/// event forwarder delivers to every connection bound to the interview,
/// so reconnects pick the stream back up without restarting the session.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Arc<ClientConnection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    pub fn add(&self, connection: Arc<ClientConnection>) {
        let _ = self
            .connections
            .insert(connection.id.clone(), connection);
    }

    /// Remove a connection by ID.
    pub fn remove(&self, connection_id: &str) {
        let _ = self.connections.remove(connection_id);
    }

    /// Number of live connections.
    #[must_use]
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections bound to one interview.
    #[must_use]
    pub fn count_for(&self, interview_id: &InterviewId) -> usize {
        self.connections
            .iter()
            .filter(|entry| &entry.value().interview_id == interview_id)
            .count()
    }

    /// Deliver a message to every connection watching an interview.
    /// Returns the number of successful enqueues.
    pub fn send_to_interview(&self, interview_id: &InterviewId, message: &Arc<String>) -> usize {
        let mut delivered = 0;
        for entry in &self.connections {
            let conn = entry.value();
            if &conn.interview_id == interview_id && conn.send(message.clone()) {
                delivered += 1;
            }
        }
        if delivered == 0 {
            debug!(interview_id = %interview_id, "no live connections for event");
        }
        delivered
    }
}

//! WebSocket session loop — one connected candidate from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use viva_core::SessionEvent;
use viva_core::ids::InterviewId;
use viva_runtime::SessionSupervisor;

use crate::messages::ClientMessage;
use crate::server::AppState;

use super::connection::ClientConnection;
use super::registry::ConnectionRegistry;

/// Per-connection outbound queue depth.
const SEND_BUFFER: usize = 256;

/// Session event queue depth between orchestrator and forwarder.
const EVENT_BUFFER: usize = 64;

/// Run a WebSocket session for one connected candidate.
///
/// 1. Registers the connection and spawns (or joins) the interview's
///    session actor
/// 2. Forwards the actor's ordered event stream out over the socket
/// 3. Dispatches inbound `start` / `submitAnswer` / `getState` commands
/// 4. Pings periodically and disconnects unresponsive clients
#[instrument(skip_all, fields(client_id = %client_id, interview_id = %interview_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    client_id: String,
    interview_id: InterviewId,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(SEND_BUFFER);
    let connection = Arc::new(ClientConnection::new(
        client_id.clone(),
        interview_id.clone(),
        send_tx,
    ));
    state.registry.add(connection.clone());
    info!("client connected");

    // Spawning is idempotent: if the session is already live the passed
    // sender is dropped and the existing forwarder keeps delivering.
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let session = state.supervisor.spawn_session(&interview_id, events_tx);
    // The forwarder runs detached: every socket bound to the interview
    // shares one ordered stream, and it exits when the session does.
    let _forwarder = spawn_event_forwarder(
        events_rx,
        state.registry.clone(),
        state.supervisor.clone(),
        interview_id.clone(),
    );

    // Outbound writer with periodic pings.
    let ping_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let pong_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ticker.tick().await;
        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!("client unresponsive for {pong_timeout:?}, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Inbound commands.
    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => t.to_string(),
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                continue;
            }
            Message::Binary(_) => {
                debug!("binary frame ignored");
                continue;
            }
        };
        connection.mark_alive();

        let command: ClientMessage = match serde_json::from_str(&text) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, "unparseable client message");
                let _ = connection.send_json(&SessionEvent::Error {
                    interview_id: interview_id.clone(),
                    code: "invalid_message".into(),
                    message: format!("invalid message: {err}"),
                });
                continue;
            }
        };

        match command {
            ClientMessage::Start => {
                // Failures surface as error events on the session stream.
                if let Err(err) = session.start().await {
                    debug!(code = err.code(), "start rejected");
                }
            }
            ClientMessage::SubmitAnswer {
                text,
                mode,
                question_id,
            } => {
                let result = match question_id {
                    Some(target) => session.submit_answer_to(target, text, mode).await,
                    None => session.submit_answer(text, mode).await,
                };
                if let Err(err) = result {
                    debug!(code = err.code(), "answer rejected");
                }
            }
            ClientMessage::GetState => match session.get_state().await {
                Ok(snapshot) => {
                    let _ = connection.send_json(&SessionEvent::State {
                        interview_id: interview_id.clone(),
                        snapshot,
                    });
                }
                Err(err) => {
                    let _ = connection.send_json(&SessionEvent::Error {
                        interview_id: interview_id.clone(),
                        code: err.code().into(),
                        message: err.to_string(),
                    });
                }
            },
        }
    }

    info!(age_secs = connection.age().as_secs(), dropped = connection.drop_count(), "client disconnected");
    outbound.abort();
    cleanup_connection(&client_id, &interview_id, &state.registry, &state.supervisor).await;
}

/// Disconnect cleanup: drop the registry entry and, once no socket is
/// bound to the interview, tear the session actor down. Progress is
/// already persisted, so nothing is lost when the actor exits.
pub(crate) async fn cleanup_connection(
    client_id: &str,
    interview_id: &InterviewId,
    registry: &ConnectionRegistry,
    supervisor: &SessionSupervisor,
) {
    registry.remove(client_id);
    if registry.count_for(interview_id) == 0 {
        debug!(interview_id = %interview_id, "last socket closed, tearing session down");
        supervisor.teardown(interview_id).await;
    }
}

/// Forward a session's event stream to every socket watching the
/// interview. Exits when the session drops its sender; tears the session
/// down once the terminal event has been delivered.
pub(crate) fn spawn_event_forwarder(
    mut events: mpsc::Receiver<SessionEvent>,
    registry: Arc<ConnectionRegistry>,
    supervisor: Arc<SessionSupervisor>,
    interview_id: InterviewId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let terminal = matches!(event, SessionEvent::InterviewComplete { .. });
            match serde_json::to_string(&event) {
                Ok(json) => {
                    let _ = registry.send_to_interview(&interview_id, &Arc::new(json));
                }
                Err(err) => warn!(error = %err, "event serialization failed"),
            }
            if terminal {
                supervisor.teardown(&interview_id).await;
                break;
            }
        }
        debug!(interview_id = %interview_id, "event forwarder exiting");
    })
}

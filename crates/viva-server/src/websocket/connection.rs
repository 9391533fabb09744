//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use viva_core::ids::InterviewId;

/// One connected WebSocket client, bound to an interview for its lifetime.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: String,
    /// The interview this socket serves.
    pub interview_id: InterviewId,
    /// Send channel to the socket's write task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last ping.
    is_alive: AtomicBool,
    /// When the last pong (or any activity) was received.
    last_pong: Mutex<Instant>,
    /// Messages dropped due to a full channel.
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a connection bound to an interview.
    pub fn new(id: String, interview_id: InterviewId, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            interview_id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a text message for the client. Returns `false` and bumps
    /// the drop counter if the channel is full or closed.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Serialize a value and enqueue it.
    pub fn send_json<T: serde::Serialize>(&self, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.send(Arc::new(json)),
            Err(_) => false,
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Record a pong (or other liveness signal).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag. Returns `true` if the client was
    /// alive since the previous check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

//! # viva-server
//!
//! Axum HTTP + `WebSocket` transport for interview sessions.
//!
//! - HTTP endpoints: health check
//! - `WebSocket` gateway at `/ws/{interview_id}`: one socket per candidate,
//!   inbound commands (`start`, `submitAnswer`, `getState`) dispatched to
//!   the session actor, outbound [`viva_core::SessionEvent`]s forwarded in
//!   emission order
//! - Heartbeat pings with unresponsive-client disconnect
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod messages;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::{AppState, VivaServer};
pub use shutdown::ShutdownCoordinator;

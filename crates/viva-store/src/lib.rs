//! # viva-store
//!
//! `SQLite` persistence for the interview engine.
//!
//! Layout follows a repository-per-aggregate pattern:
//!
//! - [`connection`]: r2d2 pool with WAL mode and foreign keys enabled
//! - [`migrations`]: versioned, idempotent schema migrations
//! - [`repositories`]: stateless repos, every method takes `&Connection`
//! - [`InterviewStore`]: the high-level facade the orchestrator consumes
//!
//! `final_score` is never a column — it is recomputed from `raw_score` and
//! `penalty` on read.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
pub use errors::{Result, StoreError};
pub use migrations::run_migrations;
pub use store::InterviewStore;

//! `SQLite` connection pool with WAL mode and foreign keys enabled.
//!
//! Uses `r2d2` connection pooling with the `r2d2_sqlite` backend. The
//! [`PragmaCustomizer`] runs on each new connection to ensure WAL mode,
//! foreign keys, and performance pragmas are set.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size (default: 8).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
    /// Cache size in KiB (default: 4096 = 4 MB).
    pub cache_size_kib: i64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 30_000,
            cache_size_kib: 4096,
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
    cache_size_kib: i64,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;\
             PRAGMA cache_size = -{};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms, self.cache_size_kib
        ))?;
        Ok(())
    }
}

fn build(manager: SqliteConnectionManager, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(std::time::Duration::from_secs(5))
        .connection_customizer(Box::new(PragmaCustomizer {
            busy_timeout_ms: config.busy_timeout_ms,
            cache_size_kib: config.cache_size_kib,
        }))
        .build(manager)?;
    Ok(pool)
}

/// Create an in-memory connection pool (for testing).
///
/// Uses a uniquely named shared-cache URI so every pooled connection sees
/// the same database, while separate pools stay isolated.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT_DB: AtomicU64 = AtomicU64::new(0);

    let name = NEXT_DB.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:viva_mem_{name}?mode=memory&cache=shared");
    let manager = SqliteConnectionManager::file(uri).with_flags(
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_URI,
    );
    build(manager, config)
}

/// Create a file-backed connection pool.
pub fn new_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    build(SqliteConnectionManager::file(path), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.pool_size, 8);
        assert_eq!(cfg.busy_timeout_ms, 30_000);
    }

    #[test]
    fn in_memory_pool_connects() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn foreign_keys_enabled() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn file_pool_connects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = new_file(path.to_str().unwrap(), &ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn pooled_connections_share_memory_db() {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        }
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE name = 't'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}

//! # viva-agent
//!
//! Interview server binary — wires together storage, embeddings, the LLM
//! port, and the session runtime, then starts the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;

use viva_llm::{LlmClient, MockLlmClient, OpenAiClient, OpenAiConfig};
use viva_runtime::SessionSupervisor;
use viva_server::{ServerConfig, VivaServer};
use viva_store::{ConnectionConfig, InterviewStore};
use viva_vector::{Embedder, HashingEmbedder, QuestionVectorIndex};

/// Adaptive interview server.
#[derive(Parser, Debug)]
#[command(name = "viva-agent", about = "Adaptive interview server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "8765")]
    port: u16,

    /// Path to the `SQLite` database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Maximum concurrent WebSocket connections.
    #[arg(long, default_value = "100")]
    max_connections: usize,

    /// Minimum log level when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Use the deterministic mock LLM instead of the OpenAI API.
    #[arg(long)]
    mock_llm: bool,

    /// OpenAI-compatible API base URL.
    #[arg(long, default_value = "https://api.openai.com/v1")]
    openai_base_url: String,

    /// Model used for generation and evaluation.
    #[arg(long, default_value = "gpt-4o-mini")]
    openai_model: String,
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".viva").join("viva.db")
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Pick the LLM adapter: OpenAI when a key is present, mock otherwise.
fn build_llm(args: &Cli) -> Result<Arc<dyn LlmClient>> {
    if args.mock_llm {
        tracing::info!("using mock LLM adapter");
        return Ok(Arc::new(MockLlmClient::new()));
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(api_key) if !api_key.is_empty() => {
            tracing::info!(model = %args.openai_model, "using OpenAI adapter");
            let client = OpenAiClient::new(OpenAiConfig {
                base_url: args.openai_base_url.clone(),
                api_key,
                model: args.openai_model.clone(),
                ..OpenAiConfig::default()
            })
            .context("failed to build OpenAI client")?;
            Ok(Arc::new(client))
        }
        _ => {
            tracing::warn!("OPENAI_API_KEY not set, falling back to the mock LLM adapter");
            Ok(Arc::new(MockLlmClient::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    viva_core::logging::init_subscriber(&args.log_level);

    let db_path = args.db_path.clone().unwrap_or_else(Cli::default_db_path);
    ensure_parent_dir(&db_path)?;
    let db_str = db_path.to_string_lossy();
    let pool = viva_store::new_file(&db_str, &ConnectionConfig::default())
        .context("failed to open database")?;
    {
        let conn = pool.get().context("failed to get DB connection")?;
        viva_store::run_migrations(&conn).context("failed to run migrations")?;
    }
    let store = Arc::new(InterviewStore::new(pool));
    tracing::info!(path = %db_path.display(), "database ready");

    // The vector index owns a dedicated connection behind a mutex; pragmas
    // must match the pool or concurrent writes hit SQLITE_BUSY.
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
    let vec_conn =
        rusqlite::Connection::open(&db_path).context("failed to open vector connection")?;
    vec_conn
        .execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
        .context("failed to set vector connection pragmas")?;
    let index = QuestionVectorIndex::new(vec_conn, embedder.dimensions());
    index.ensure_table().context("failed to create vector table")?;
    let index = Arc::new(Mutex::new(index));

    let llm = build_llm(&args)?;
    let supervisor = Arc::new(SessionSupervisor::new(
        store.clone(),
        llm,
        embedder,
        index,
    ));

    let server = VivaServer::new(
        ServerConfig {
            host: args.host,
            port: args.port,
            max_connections: args.max_connections,
            ..ServerConfig::default()
        },
        supervisor.clone(),
        store,
    );

    // Ctrl-C initiates a graceful drain, then sessions are aborted.
    let shutdown = server.shutdown().clone();
    let supervisor_for_signal = supervisor.clone();
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.shutdown();
            supervisor_for_signal.abort_all();
        }
    }));

    server.serve().await.context("server error")?;
    tracing::info!("server stopped");
    Ok(())
}

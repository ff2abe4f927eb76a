use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use quill::channels::{Channel, CliChannel};
use quill::config::PipelineConfig;
use quill::correlation::{ThreadCorrelator, spawn_sweep_task};
use quill::llm::{LlmConfig, create_provider};
use quill::oracle::LlmOracle;
use quill::pipeline::docs::DocumentationService;
use quill::pipeline::processor::MessageProcessor;
use quill::pipeline::routing::Router;
use quill::shutdown::install_signal_handler;
use quill::store::FsDocumentStore;
use quill::worker::{WorkerDeps, WorkerPool};

/// Log to stderr, and to a daily file under `QUILL_LOG_DIR` when set.
/// Stdout carries the CLI channel's replies.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match std::env::var("QUILL_LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "quill.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let config = PipelineConfig::from_env().context("invalid pipeline configuration")?;
    let llm_config = LlmConfig::from_env().context("invalid LLM configuration")?;

    let shutdown = install_signal_handler();

    // ── Collaborators ───────────────────────────────────────────────

    let llm = create_provider(&llm_config)?;
    let oracle = Arc::new(LlmOracle::new(llm));

    let store = FsDocumentStore::new(&config.docs_dir);
    store
        .ensure_root()
        .await
        .with_context(|| format!("cannot create {}", config.docs_dir.display()))?;
    tracing::info!("Documents stored under {}", config.docs_dir.display());

    let channel: Arc<dyn Channel> = Arc::new(CliChannel::default());

    // ── Pipeline ────────────────────────────────────────────────────

    let docs = Arc::new(DocumentationService::new(
        oracle.clone(),
        Arc::new(store),
        config.docs_base.clone(),
    ));
    let router = Router::new(docs, Arc::clone(&channel));
    let processor = Arc::new(MessageProcessor::new(oracle.clone(), oracle, router));

    let correlator = Arc::new(ThreadCorrelator::new(
        config.thread_capacity,
        config.thread_ttl,
    ));
    let sweeper = config.thread_ttl.map(|_| {
        spawn_sweep_task(
            Arc::clone(&correlator),
            config.sweep_interval,
            shutdown.clone(),
        )
    });

    // ── Run ─────────────────────────────────────────────────────────

    let events = channel.start().await?;
    eprintln!("quill ready. One message per line; `re:<marker> text` replies. Ctrl+D to exit.");

    let pool = WorkerPool::new(
        WorkerDeps {
            correlator: Arc::clone(&correlator),
            processor,
        },
        config.pool,
    );
    let stats = pool.run(events, shutdown.clone()).await;

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }

    tracing::info!(
        processed = stats.processed,
        failed = stats.failed,
        threads = correlator.len(),
        "quill stopped"
    );
    Ok(())
}

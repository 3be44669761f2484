//! Taskpilot daemon entry point.
//!
//! Boots configuration, wires the executor pool and task store together,
//! and runs the orchestrator until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskpilot::services::events::{EventBus, OrchestratorEvent};
use taskpilot::services::executors::cli::build_executor_set;
use taskpilot::services::knowledge::{CompletionJournal, ContextProvider, ProjectBriefProvider};
use taskpilot::services::task_store::{MemoryTaskStore, RestTaskStore, TaskStore};
use taskpilot::services::Orchestrator;
use taskpilot::storage::ConfigService;

/// Taskpilot daemon CLI
#[derive(Parser, Debug)]
#[command(name = "taskpilot")]
#[command(about = "Routes open tasks to CLI coding agents and runs them to completion")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Task store base URL, overriding the configured one
    #[arg(long)]
    store: Option<String>,

    /// Run a single pick/work cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("taskpilot={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting taskpilot v{}", env!("CARGO_PKG_VERSION"));

    let config_service = match &cli.config {
        Some(path) => ConfigService::at_path(path.clone()),
        None => ConfigService::new(),
    }
    .context("loading configuration")?;
    let mut config = config_service.config().clone();
    if let Some(url) = cli.store {
        config.store_url = Some(url);
    }

    let executors = build_executor_set(&config);
    if executors.is_empty() {
        anyhow::bail!("no executors enabled; enable at least one in the config file");
    }
    info!(executors = executors.len(), "executor pool ready");

    let store: Arc<dyn TaskStore> = match &config.store_url {
        Some(url) => {
            let token = std::env::var(&config.store_token_env).ok();
            if token.is_none() {
                warn!(
                    env = %config.store_token_env,
                    "store token env var not set, connecting unauthenticated"
                );
            }
            Arc::new(
                RestTaskStore::new(url.clone(), token).context("building task store client")?,
            )
        }
        None => {
            warn!("no store URL configured, falling back to an in-memory store");
            Arc::new(MemoryTaskStore::new())
        }
    };

    let journal = match CompletionJournal::new() {
        Ok(journal) => Some(Arc::new(journal)),
        Err(err) => {
            warn!(error = %err, "completion journal unavailable, continuing without it");
            None
        }
    };

    let mut providers: Vec<Arc<dyn ContextProvider>> = Vec::new();
    match ProjectBriefProvider::new() {
        Ok(provider) => providers.push(Arc::new(provider)),
        Err(err) => warn!(error = %err, "project briefs unavailable, continuing without them"),
    }
    if let Some(journal) = &journal {
        providers.push(journal.clone());
    }

    let bus = Arc::new(EventBus::new(config.event_capacity));
    let orchestrator = Orchestrator::new(&config, store, executors, bus.clone(), providers, journal);

    if cli.once {
        orchestrator.run_once().await;
        return Ok(());
    }

    spawn_event_logger(&bus);
    orchestrator.start().await;

    wait_for_shutdown_signal().await;
    orchestrator.shutdown().await;
    info!("taskpilot stopped");
    Ok(())
}

/// Mirror orchestrator events into the log so a headless run stays observable.
fn spawn_event_logger(bus: &Arc<EventBus>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!(lagged = n, "event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(event: &OrchestratorEvent) {
    match event {
        OrchestratorEvent::StateChanged { snapshot } => {
            debug!(
                state = %snapshot.state,
                completed = snapshot.completed_count,
                "state changed"
            );
        }
        OrchestratorEvent::ExecutorLog {
            executor, chunk, ..
        } => {
            debug!(executor = %executor, "{}", chunk.trim_end());
        }
        OrchestratorEvent::RouteSwitched {
            task_id,
            executor,
            reason,
        } => {
            info!(task = %task_id, executor = %executor, reason = %reason, "route switched");
        }
        OrchestratorEvent::TaskCompleted { task_id, executor } => {
            info!(task = %task_id, executor = %executor, "task completed");
        }
        OrchestratorEvent::TaskEscalated {
            task_id, closed, ..
        } => {
            warn!(task = %task_id, closed = closed, "task escalated");
        }
        OrchestratorEvent::CycleFailed { task_id, error } => {
            warn!(task = %task_id, error = %error, "cycle failed");
        }
    }
}

/// Wait for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

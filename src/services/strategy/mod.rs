//! Execution Strategies
//!
//! Three composable strategies turn a routed task into an
//! `ExecutionResult`: fallback-chain, parallel-writer-with-shadow, and
//! discussion-then-execute. All of them consume the single `Invoker`
//! primitive (one call, one executor round trip with its own timeout
//! and a child of the cycle's cancellation token) and differ only in
//! composition. Exactly one strategy runs per cycle.

pub mod discussion;
pub mod fallback;
pub mod parallel;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::models::{
    DiscussionTurn, ExecutionResult, ExecutorKind, ExecutorMode, ExecutorRunState, ExecutorsConfig,
    RouteDecision, RuntimeConfig,
};
use crate::services::executors::{catalog, ExecutorSet, InvokeError, InvokeRequest};
use crate::services::policy::blockers::BlockerSet;
use crate::services::prompt::PromptSet;

pub use fallback::{AttemptLog, ExecutionAttempt};

/// Surface strategies use to report progress back to the cycle owner.
///
/// Strategies never mutate orchestrator state directly; everything goes
/// through this observer so status reporting stays single-writer.
#[async_trait]
pub trait CycleObserver: Send + Sync {
    /// An executor's run state changed.
    async fn executor_state(&self, kind: ExecutorKind, state: ExecutorRunState);

    /// The active route switched to another executor.
    async fn route_switched(&self, kind: ExecutorKind, reason: &str);

    /// Incremental output from an executor.
    async fn log_chunk(&self, kind: ExecutorKind, chunk: &str);
}

/// Observer that ignores everything; used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct NullObserver;

#[async_trait]
impl CycleObserver for NullObserver {
    async fn executor_state(&self, _kind: ExecutorKind, _state: ExecutorRunState) {}
    async fn route_switched(&self, _kind: ExecutorKind, _reason: &str) {}
    async fn log_chunk(&self, _kind: ExecutorKind, _chunk: &str) {}
}

/// The shared invocation primitive.
///
/// Created once per cycle. Carries the cycle token (every invocation
/// gets a child token), the per-family timeouts, the blocker patterns,
/// and whether the active route is strict, which arms the mid-stream
/// blocker watch for policy-restricted executors.
pub struct Invoker {
    executors: ExecutorSet,
    timeouts: ExecutorsConfig,
    observer: Arc<dyn CycleObserver>,
    blockers: Arc<BlockerSet>,
    cycle_token: CancellationToken,
    strict: bool,
}

impl Invoker {
    pub fn new(
        executors: ExecutorSet,
        timeouts: ExecutorsConfig,
        observer: Arc<dyn CycleObserver>,
        cycle_token: CancellationToken,
        strict: bool,
    ) -> Self {
        Self {
            executors,
            timeouts,
            observer,
            blockers: Arc::new(BlockerSet::standard()),
            cycle_token,
            strict,
        }
    }

    /// The cycle-wide cancellation token.
    pub fn cycle_token(&self) -> &CancellationToken {
        &self.cycle_token
    }

    /// The observer strategies report through.
    pub fn observer(&self) -> &Arc<dyn CycleObserver> {
        &self.observer
    }

    /// Run one prompt on one executor.
    ///
    /// Streams chunks to the observer, arms the mid-stream blocker watch
    /// when the route is strict and the executor is policy-restricted,
    /// and classifies the outcome: cycle-level cancellation always wins
    /// over a blocker-triggered abort, and blocking signals found in the
    /// final output or failure message surface as `InvokeError::Blocked`.
    pub async fn invoke(
        &self,
        kind: ExecutorKind,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<ExecutionResult, InvokeError> {
        let executor = self
            .executors
            .get(kind)
            .ok_or_else(|| InvokeError::Spawn(format!("no {} executor configured", kind)))?;

        let timeout = Duration::from_secs(self.timeouts.timeout_secs(kind));
        let mut request = InvokeRequest::new(prompt, timeout);
        if let Some(system) = system {
            request = request.with_system(system);
        }

        let child_token = self.cycle_token.child_token();
        let watch_armed = self.strict && catalog::is_policy_restricted(kind);
        let signal: Arc<tokio::sync::Mutex<Option<String>>> =
            Arc::new(tokio::sync::Mutex::new(None));

        let (chunk_tx, mut chunk_rx) = mpsc::channel::<String>(64);
        {
            let observer = self.observer.clone();
            let blockers = self.blockers.clone();
            let signal = signal.clone();
            let watch_token = child_token.clone();
            tokio::spawn(async move {
                while let Some(chunk) = chunk_rx.recv().await {
                    observer.log_chunk(kind, &chunk).await;
                    if watch_armed {
                        if let Some(hit) = blockers.scan(&chunk) {
                            debug!(executor = %kind, signal = %hit, "mid-stream blocker, aborting");
                            *signal.lock().await = Some(hit);
                            watch_token.cancel();
                        }
                    }
                }
            });
        }

        self.observer
            .executor_state(kind, ExecutorRunState::Running)
            .await;

        let outcome = executor.invoke(request, chunk_tx, child_token).await;

        let classified = match outcome {
            Ok(result) => {
                // Exit 0 with a hard blocker in the transcript still blocks
                match self.blockers.scan(&result.content) {
                    Some(hit) => Err(InvokeError::Blocked(hit)),
                    None => Ok(result),
                }
            }
            Err(InvokeError::Cancelled) => {
                if self.cycle_token.is_cancelled() {
                    Err(InvokeError::Cancelled)
                } else if let Some(hit) = signal.lock().await.take() {
                    Err(InvokeError::Blocked(hit))
                } else {
                    Err(InvokeError::Cancelled)
                }
            }
            Err(InvokeError::Failed(message)) => match self.blockers.scan(&message) {
                Some(hit) => Err(InvokeError::Blocked(hit)),
                None => Err(InvokeError::Failed(message)),
            },
            Err(other) => Err(other),
        };

        let state = if classified.is_ok() {
            ExecutorRunState::Success
        } else {
            ExecutorRunState::Error
        };
        self.observer.executor_state(kind, state).await;

        classified
    }
}

/// Which strategy a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    FallbackChain,
    ParallelShadow,
    Discussion,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::FallbackChain => write!(f, "fallback_chain"),
            StrategyKind::ParallelShadow => write!(f, "parallel_shadow"),
            StrategyKind::Discussion => write!(f, "discussion"),
        }
    }
}

/// Select the strategy for one cycle.
///
/// Discussion mode wins outright; the parallel shadow only runs for
/// non-strict routes in auto mode; everything else takes the fallback
/// chain (which itself disables fallback when the route is strict).
pub fn select_strategy(config: &RuntimeConfig, decision: &RouteDecision) -> StrategyKind {
    if config.discussion_mode {
        StrategyKind::Discussion
    } else if config.executor_mode == ExecutorMode::Auto
        && !decision.strict
        && config.parallel_execution
    {
        StrategyKind::ParallelShadow
    } else {
        StrategyKind::FallbackChain
    }
}

/// What a strategy produced for the cycle.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    /// The authoritative result
    pub result: ExecutionResult,
    /// Every invocation attempt made along the way
    pub attempts: AttemptLog,
    /// Discussion transcript (empty outside discussion mode)
    pub discussion: Vec<DiscussionTurn>,
}

impl StrategyOutcome {
    /// Outcome with no extra attempts beyond the result itself.
    pub fn from_result(result: ExecutionResult, attempts: AttemptLog) -> Self {
        Self {
            result,
            attempts,
            discussion: Vec::new(),
        }
    }
}

/// Run the selected strategy for one routed task.
pub async fn execute_route(
    invoker: &Invoker,
    decision: &RouteDecision,
    prompts: &PromptSet,
    config: &RuntimeConfig,
) -> Result<StrategyOutcome, crate::services::policy::CycleError> {
    let strategy = select_strategy(config, decision);
    debug!(strategy = %strategy, executor = %decision.executor, strict = decision.strict, "strategy selected");
    match strategy {
        StrategyKind::FallbackChain => fallback::run_fallback_chain(invoker, decision, prompts).await,
        StrategyKind::ParallelShadow => parallel::run_parallel_shadow(invoker, decision, prompts).await,
        StrategyKind::Discussion => discussion::run_discussion(invoker, prompts, config).await,
    }
}

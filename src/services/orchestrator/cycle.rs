//! One Task Cycle
//!
//! Everything between picking a task and handing its outcome back to the
//! loop: context gathering, prompt building, routing and strategy
//! execution. Strategies report progress through `CycleHandle`, which
//! bridges observer callbacks onto the status board and the event sink;
//! they never touch orchestrator state directly.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    ExecutorKind, ExecutorRunState, ExecutorsConfig, RouteDecision, RouteHistory, RuntimeConfig,
    Task,
};
use crate::services::events::{EventSink, OrchestratorEvent};
use crate::services::executors::ExecutorSet;
use crate::services::knowledge::{gather_context, ContextProvider};
use crate::services::policy::CycleError;
use crate::services::prompt;
use crate::services::routing;
use crate::services::strategy::{self, CycleObserver, Invoker, StrategyOutcome};

use super::status::StatusBoard;

/// Immutable dependencies shared by every cycle.
pub(super) struct CycleContext {
    pub executors: ExecutorSet,
    pub timeouts: ExecutorsConfig,
    pub providers: Vec<Arc<dyn ContextProvider>>,
    pub board: Arc<StatusBoard>,
    pub sink: Arc<dyn EventSink>,
}

/// What a finished cycle hands back to the loop.
pub(super) struct CycleSuccess {
    /// The route the cycle started with
    pub decision: RouteDecision,
    /// Result plus the full attempt log
    pub outcome: StrategyOutcome,
}

/// Observer bridge for one cycle.
///
/// Keeps the per-cycle route history and forwards everything strategies
/// report to the status board and the event sink.
pub(super) struct CycleHandle {
    task_id: String,
    board: Arc<StatusBoard>,
    sink: Arc<dyn EventSink>,
    history: Mutex<RouteHistory>,
}

impl CycleHandle {
    fn new(task_id: String, board: Arc<StatusBoard>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            task_id,
            board,
            sink,
            history: Mutex::new(RouteHistory::new()),
        }
    }

    /// Record the initial route before any strategy runs.
    async fn record_initial(&self, decision: &RouteDecision) {
        self.history
            .lock()
            .await
            .record(decision.executor, &decision.reason);
        self.board.set_current_executor(decision.executor).await;
    }

    /// Snapshot of the route transitions so far.
    async fn history(&self) -> RouteHistory {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl CycleObserver for CycleHandle {
    async fn executor_state(&self, kind: ExecutorKind, state: ExecutorRunState) {
        self.board.set_executor_state(kind, state).await;
    }

    async fn route_switched(&self, kind: ExecutorKind, reason: &str) {
        self.history.lock().await.record(kind, reason);
        self.board.set_current_executor(kind).await;
        self.sink.emit(OrchestratorEvent::RouteSwitched {
            task_id: self.task_id.clone(),
            executor: kind,
            reason: reason.to_string(),
        });
    }

    async fn log_chunk(&self, kind: ExecutorKind, chunk: &str) {
        self.sink.emit(OrchestratorEvent::ExecutorLog {
            task_id: self.task_id.clone(),
            executor: kind,
            chunk: chunk.to_string(),
        });
    }
}

/// Run one task from prompt to result.
pub(super) async fn run_cycle(
    ctx: &CycleContext,
    task: &Task,
    runtime: RuntimeConfig,
    token: CancellationToken,
) -> Result<CycleSuccess, CycleError> {
    let cycle_id = Uuid::new_v4();
    info!(cycle = %cycle_id, task = %task.id, title = %task.title, "cycle started");

    let blocks = gather_context(&ctx.providers, task).await;
    let prompts = prompt::build_prompt_set(task, &blocks);

    let decision = routing::route(task, &runtime);
    info!(
        cycle = %cycle_id,
        executor = %decision.executor,
        skill = %decision.skill,
        strict = decision.strict,
        reason = %decision.reason,
        "task routed"
    );

    let handle = Arc::new(CycleHandle::new(
        task.id.clone(),
        ctx.board.clone(),
        ctx.sink.clone(),
    ));
    handle.record_initial(&decision).await;

    let invoker = Invoker::new(
        ctx.executors.clone(),
        ctx.timeouts.clone(),
        handle.clone() as Arc<dyn CycleObserver>,
        token,
        decision.strict,
    );
    let outcome = strategy::execute_route(&invoker, &decision, &prompts, &runtime).await?;

    let history = handle.history().await;
    info!(
        cycle = %cycle_id,
        executor = %outcome.result.executor,
        attempts = outcome.attempts.len(),
        route_transitions = history.len(),
        "cycle finished"
    );

    Ok(CycleSuccess { decision, outcome })
}

//! Shared Test Fixtures
//!
//! Scripted executors, a collecting event sink, and polling helpers used
//! across the integration suite. Scripts are queued per executor family
//! and replayed in order; an exhausted script fails the invocation so a
//! test that under-provisions its script fails loudly instead of
//! succeeding by accident.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use taskpilot::models::{AppConfig, ExecutionResult, ExecutorKind, TokenUsage};
use taskpilot::services::events::{EventSink, OrchestratorEvent};
use taskpilot::services::executors::{Executor, ExecutorSet, InvokeError, InvokeRequest};
use taskpilot::services::task_store::MemoryTaskStore;
use taskpilot::services::Orchestrator;
use taskpilot::OrchestratorState;

const WAIT_DEADLINE: Duration = Duration::from_secs(5);
const WAIT_TICK: Duration = Duration::from_millis(20);

/// What a scripted executor does on its next invocation.
#[derive(Debug, Clone)]
pub enum Step {
    /// Stream the content as one chunk, then return it as the result
    Succeed(String),
    /// Sleep first (still abortable), then succeed
    SucceedAfter(Duration, String),
    /// Return `InvokeError::Failed` with this message
    Fail(String),
    /// Wait for cancellation, then return `InvokeError::Cancelled`
    Hang,
}

/// Executor that replays a scripted sequence of outcomes.
pub struct ScriptedExecutor {
    kind: ExecutorKind,
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    fn new(kind: ExecutorKind) -> Self {
        Self {
            kind,
            steps: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn result(&self, content: String) -> ExecutionResult {
        ExecutionResult {
            content,
            model: "scripted".to_string(),
            provider: self.kind.id().to_string(),
            usage: TokenUsage::default(),
            executor: self.kind,
        }
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    fn kind(&self) -> ExecutorKind {
        self.kind
    }

    async fn invoke(
        &self,
        request: InvokeRequest,
        chunk_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult, InvokeError> {
        self.calls.lock().await.push(request.prompt.clone());
        let step = self
            .steps
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Step::Fail("script exhausted".to_string()));
        match step {
            Step::Succeed(content) => {
                let _ = chunk_tx.send(content.clone()).await;
                Ok(self.result(content))
            }
            Step::SucceedAfter(delay, content) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(InvokeError::Cancelled),
                }
                let _ = chunk_tx.send(content.clone()).await;
                Ok(self.result(content))
            }
            Step::Fail(message) => Err(InvokeError::Failed(message)),
            Step::Hang => {
                cancel.cancelled().await;
                Err(InvokeError::Cancelled)
            }
        }
    }
}

/// Three scripted executors addressable by family.
pub struct Bench {
    executors: HashMap<ExecutorKind, Arc<ScriptedExecutor>>,
}

impl Bench {
    pub fn new() -> Self {
        let executors = ExecutorKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(ScriptedExecutor::new(kind))))
            .collect();
        Self { executors }
    }

    /// Queue the steps one executor will replay, in order.
    pub async fn script(&self, kind: ExecutorKind, steps: Vec<Step>) {
        self.executors[&kind].steps.lock().await.extend(steps);
    }

    /// Prompts the executor has received so far.
    pub async fn calls(&self, kind: ExecutorKind) -> Vec<String> {
        self.executors[&kind].calls.lock().await.clone()
    }

    pub fn executor_set(&self) -> ExecutorSet {
        ExecutorSet::new(
            self.executors
                .values()
                .map(|e| e.clone() as Arc<dyn Executor>)
                .collect(),
        )
    }
}

/// Sink that stores every emitted event for later assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: std::sync::Mutex<Vec<OrchestratorEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<OrchestratorEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: OrchestratorEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Config with near-zero delays so loop tests run fast.
pub fn fast_config() -> AppConfig {
    AppConfig {
        poll_interval_secs: 1,
        inter_task_delay_secs: 0,
        transport_cooldown_secs: 0,
        ..Default::default()
    }
}

/// A bench, a store, a collecting sink, and an orchestrator over them.
pub struct Rig {
    pub bench: Bench,
    pub store: MemoryTaskStore,
    pub sink: Arc<CollectingSink>,
    pub orchestrator: Orchestrator,
}

pub fn rig() -> Rig {
    let bench = Bench::new();
    let store = MemoryTaskStore::new();
    let sink = Arc::new(CollectingSink::default());
    let orchestrator = Orchestrator::new(
        &fast_config(),
        Arc::new(store.clone()),
        bench.executor_set(),
        sink.clone(),
        Vec::new(),
        None,
    );
    Rig {
        bench,
        store,
        sink,
        orchestrator,
    }
}

/// Wait until the store reports the task completed.
pub async fn wait_for_completion(store: &MemoryTaskStore, id: &str) {
    let deadline = tokio::time::Instant::now() + WAIT_DEADLINE;
    while !store.completed_ids().await.iter().any(|done| done == id) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {id} was not completed in time"
        );
        tokio::time::sleep(WAIT_TICK).await;
    }
}

/// Wait until the orchestrator reports the given state.
pub async fn wait_for_state(orchestrator: &Orchestrator, state: OrchestratorState) {
    let deadline = tokio::time::Instant::now() + WAIT_DEADLINE;
    while orchestrator.status().await.state != state {
        assert!(
            tokio::time::Instant::now() < deadline,
            "orchestrator never reached {state}"
        );
        tokio::time::sleep(WAIT_TICK).await;
    }
}

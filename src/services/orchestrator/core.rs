//! Orchestrator Core
//!
//! State machine and control surface. One long-lived loop owns all cycle
//! execution; control calls (pause, trigger, stop, shutdown, config
//! updates) act on shared state from any handle clone and never run work
//! themselves. The loop cannot die from a failed cycle: every error is
//! resolved into a follow-up action and a reschedule delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{
    AppConfig, OrchestratorState, RuntimeConfig, RuntimeConfigUpdate, Task, TaskPatch,
};
use crate::services::events::{EventSink, OrchestratorEvent, StatusSnapshot, TaskRef};
use crate::services::executors::{catalog, ExecutorSet};
use crate::services::knowledge::{CompletionJournal, ContextProvider, JournalEntry};
use crate::services::policy::{self, CycleError, FailureAction, ESCALATION_TAG};
use crate::services::task_store::TaskStore;

use super::cycle::{self, CycleContext, CycleSuccess};
use super::status::StatusBoard;

/// How many queued tasks a status snapshot previews.
const QUEUE_PREVIEW_LEN: usize = 5;

/// What one pick attempt produced.
enum Picked {
    Task(Task),
    Empty,
    StoreDown,
}

/// Cheap-to-clone handle over the running orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    ctx: CycleContext,
    store: Arc<dyn TaskStore>,
    journal: Option<Arc<CompletionJournal>>,
    runtime: RwLock<RuntimeConfig>,
    poll_interval: Duration,
    inter_task_delay: Duration,
    transport_cooldown: Duration,
    paused: AtomicBool,
    pick_requested: AtomicBool,
    wake: Notify,
    shutdown: CancellationToken,
    active_cycle: Mutex<Option<CancellationToken>>,
    loop_task: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn TaskStore>,
        executors: ExecutorSet,
        sink: Arc<dyn EventSink>,
        providers: Vec<Arc<dyn ContextProvider>>,
        journal: Option<Arc<CompletionJournal>>,
    ) -> Self {
        let board = Arc::new(StatusBoard::new(sink.clone()));
        let ctx = CycleContext {
            executors,
            timeouts: config.executors.clone(),
            providers,
            board,
            sink,
        };
        Self {
            inner: Arc::new(OrchestratorInner {
                ctx,
                store,
                journal,
                runtime: RwLock::new(config.runtime),
                poll_interval: Duration::from_secs(config.poll_interval_secs),
                inter_task_delay: Duration::from_secs(config.inter_task_delay_secs),
                transport_cooldown: Duration::from_secs(config.transport_cooldown_secs),
                paused: AtomicBool::new(false),
                pick_requested: AtomicBool::new(false),
                wake: Notify::new(),
                shutdown: CancellationToken::new(),
                active_cycle: Mutex::new(None),
                loop_task: Mutex::new(None),
            }),
        }
    }

    /// Spawn the polling loop. Starting twice is a no-op.
    pub async fn start(&self) {
        let mut slot = self.inner.loop_task.lock().await;
        if slot.is_some() {
            warn!("orchestrator already started");
            return;
        }
        let inner = Arc::clone(&self.inner);
        *slot = Some(tokio::spawn(async move { inner.run_loop().await }));
        info!("orchestrator started");
    }

    /// Cancel the active cycle, stop the loop and wait for it to end.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.cancel_active_cycle().await;
        self.inner.wake.notify_waiters();

        let task = self.inner.loop_task.lock().await.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!(error = %err, "orchestrator loop ended abnormally");
            }
        }
        info!("orchestrator shut down");
    }

    /// Ask for an immediate pick. Accepted only while idle in Waiting.
    pub async fn trigger_pick(&self) -> bool {
        if self.inner.paused.load(Ordering::SeqCst) {
            return false;
        }
        if self.inner.ctx.board.state().await != OrchestratorState::Waiting {
            return false;
        }
        self.inner.pick_requested.store(true, Ordering::SeqCst);
        // notify_one stores a permit, so the wake survives landing between
        // the loop's flag check and its park
        self.inner.wake.notify_one();
        true
    }

    /// Suppress future picks; an in-flight cycle keeps running.
    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        self.inner.wake.notify_one();
        info!("orchestrator paused");
    }

    /// Re-arm pick scheduling.
    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        self.inner.wake.notify_one();
        info!("orchestrator resumed");
    }

    /// Cancel the active cycle, if any. Returns whether one was running.
    pub async fn stop_current(&self) -> bool {
        self.inner.cancel_active_cycle().await
    }

    /// Apply a runtime configuration update; effective from the next pick.
    pub async fn update_config(&self, update: RuntimeConfigUpdate) -> RuntimeConfig {
        let mut runtime = self.inner.runtime.write().await;
        let diff = runtime.apply_update(update);
        if diff.is_empty() {
            debug!("runtime config update carried no changes");
        } else {
            info!(changes = %diff.join(", "), "runtime config updated");
        }
        *runtime
    }

    /// Current runtime configuration.
    pub async fn runtime_config(&self) -> RuntimeConfig {
        *self.inner.runtime.read().await
    }

    /// Current status snapshot.
    pub async fn status(&self) -> StatusSnapshot {
        self.inner.ctx.board.snapshot().await
    }

    /// One pick-and-work round without the loop; used by `--once` runs.
    pub async fn run_once(&self) {
        match self.inner.pick().await {
            Picked::Task(task) => {
                self.inner.work(task).await;
            }
            Picked::Empty => info!("no runnable task"),
            Picked::StoreDown => warn!("task store unavailable"),
        }
        self.inner
            .ctx
            .board
            .transition(OrchestratorState::Waiting)
            .await;
    }
}

impl OrchestratorInner {
    fn board(&self) -> &Arc<StatusBoard> {
        &self.ctx.board
    }

    async fn cancel_active_cycle(&self) -> bool {
        let guard = self.active_cycle.lock().await;
        match guard.as_ref() {
            Some(token) => {
                token.cancel();
                info!("active cycle cancelled");
                true
            }
            None => false,
        }
    }

    async fn run_loop(&self) {
        info!("orchestrator loop running");
        let mut delay = Duration::ZERO;
        loop {
            if !self.wait_for_next_pick(delay).await {
                break;
            }
            delay = match self.pick().await {
                Picked::StoreDown => self.transport_cooldown,
                Picked::Empty => self.poll_interval,
                Picked::Task(task) => self.work(task).await,
            };
        }
        self.board().finish_cycle(false).await;
        self.board().transition(OrchestratorState::Waiting).await;
        info!("orchestrator loop stopped");
    }

    /// Park in Waiting until the next pick is due.
    ///
    /// Wakes early on `trigger_pick`, re-evaluates on pause/resume and
    /// returns false once shutdown is requested. While paused, the timer
    /// is not armed at all.
    async fn wait_for_next_pick(&self, delay: Duration) -> bool {
        self.board().transition(OrchestratorState::Waiting).await;
        loop {
            if self.shutdown.is_cancelled() {
                return false;
            }
            if self.paused.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = self.wake.notified() => continue,
                    _ = self.shutdown.cancelled() => return false,
                }
            }
            if self.pick_requested.swap(false, Ordering::SeqCst) {
                debug!("pick requested");
                return true;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if !self.paused.load(Ordering::SeqCst) {
                        return true;
                    }
                }
                _ = self.wake.notified() => {}
                _ = self.shutdown.cancelled() => return false,
            }
        }
    }

    /// Fetch active tasks and pick the runnable head, FIFO.
    async fn pick(&self) -> Picked {
        self.board().transition(OrchestratorState::Picking).await;

        let tasks = match self.store.list_active().await {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "task store read failed");
                return Picked::StoreDown;
            }
        };

        let mut runnable = Vec::new();
        for task in tasks {
            if is_runnable(&task) {
                runnable.push(task);
            } else {
                let section = task.section.as_deref().unwrap_or_default();
                let signature = format!("{}/{}", task.id, section);
                if self.board().first_skip(&signature).await {
                    info!(task = %task.id, section = %section, "skipping task in unrecognized section");
                }
            }
        }

        let preview: Vec<TaskRef> = runnable
            .iter()
            .take(QUEUE_PREVIEW_LEN)
            .map(TaskRef::from)
            .collect();
        self.board().set_queue_preview(preview).await;

        match runnable.into_iter().next() {
            Some(task) => Picked::Task(task),
            None => {
                debug!("no runnable tasks");
                Picked::Empty
            }
        }
    }

    /// Run one full cycle for a task; returns the delay before the next
    /// pick.
    async fn work(&self, task: Task) -> Duration {
        self.board().begin_cycle(&task).await;

        let runtime = *self.runtime.read().await;
        let token = CancellationToken::new();
        *self.active_cycle.lock().await = Some(token.clone());

        let result = cycle::run_cycle(&self.ctx, &task, runtime, token).await;

        *self.active_cycle.lock().await = None;

        match result {
            Ok(success) => self.complete(&task, &success).await,
            Err(error) => self.handle_failure(&task, error).await,
        }
    }

    /// Close the task out against the store and record the completion.
    async fn complete(&self, task: &Task, success: &CycleSuccess) -> Duration {
        self.board()
            .transition(OrchestratorState::Completing)
            .await;
        let executor = success.outcome.result.executor;

        if let Err(err) = self.store.complete(&task.id).await {
            warn!(task = %task.id, error = %err, "store completion failed, continuing");
        }
        self.ctx.sink.emit(OrchestratorEvent::TaskCompleted {
            task_id: task.id.clone(),
            executor,
        });
        self.append_journal(task, success);

        info!(
            task = %task.id,
            executor = %executor,
            attempts = success.outcome.attempts.len(),
            "task completed"
        );
        self.board().finish_cycle(true).await;
        self.inter_task_delay
    }

    /// Record the completion in the journal without waiting for it.
    fn append_journal(&self, task: &Task, success: &CycleSuccess) {
        let Some(journal) = self.journal.clone() else {
            return;
        };
        let entry = JournalEntry {
            task_id: task.id.clone(),
            title: task.title.clone(),
            project: task.project.clone(),
            executor: success.outcome.result.executor,
            skill: success.decision.skill.clone(),
            completed_at: Utc::now(),
        };
        tokio::spawn(async move {
            if let Err(err) = journal.append(&entry).await {
                debug!(error = %err, "journal append failed");
            }
        });
    }

    /// Resolve a failed cycle into its follow-up action and delay.
    async fn handle_failure(&self, task: &Task, error: CycleError) -> Duration {
        let delay = match policy::resolve_failure(&error) {
            FailureAction::ReturnToWaiting => {
                info!(task = %task.id, "cycle cancelled, returning to waiting");
                self.poll_interval
            }
            FailureAction::RetryAfterCooldown => {
                warn!(task = %task.id, error = %error, "transport failure, cooling down");
                self.ctx.sink.emit(OrchestratorEvent::CycleFailed {
                    task_id: task.id.clone(),
                    error: error.to_string(),
                });
                self.transport_cooldown
            }
            FailureAction::EscalateAndClose { note } => {
                self.escalate(task, note, true).await;
                self.inter_task_delay
            }
            FailureAction::EscalateAndLeaveOpen { note } => {
                self.escalate(task, note, false).await;
                self.inter_task_delay
            }
        };
        self.board().finish_cycle(false).await;
        delay
    }

    /// Write the escalation back to the store.
    ///
    /// Store write failures are logged and never block the loop.
    async fn escalate(&self, task: &Task, note: String, close: bool) {
        warn!(task = %task.id, closed = close, "escalating task to a human");

        let mut patch = TaskPatch::note(note.clone());
        if close {
            patch = patch.with_tag(ESCALATION_TAG);
        }
        if let Err(err) = self.store.update(&task.id, patch).await {
            warn!(task = %task.id, error = %err, "escalation note could not be written");
        }
        if close {
            if let Err(err) = self.store.complete(&task.id).await {
                warn!(task = %task.id, error = %err, "escalated task could not be closed");
            }
        }
        self.ctx.sink.emit(OrchestratorEvent::TaskEscalated {
            task_id: task.id.clone(),
            note,
            closed: close,
        });
    }
}

/// A task is runnable when it has no section or sits under a section the
/// executor catalog recognizes.
fn is_runnable(task: &Task) -> bool {
    match task.section.as_deref() {
        None => true,
        Some(section) => catalog::is_recognized_section(section),
    }
}

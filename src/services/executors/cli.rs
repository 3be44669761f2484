//! CLI Process Executor
//!
//! Shells out to a configured coding-agent CLI: prompt in over stdin,
//! result streamed line-by-line from stdout. Transport is deliberately
//! thin; the orchestrator only depends on the `Executor` contract, and
//! everything interesting (timeouts, cancellation, attribution) lives in
//! that contract rather than in process mechanics.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use async_trait::async_trait;
use tracing::debug;

use super::{Executor, ExecutorSet, InvokeError, InvokeRequest};
use crate::models::{AppConfig, ExecutionResult, ExecutorKind, ExecutorProcessConfig, TokenUsage};
use crate::utils::text::excerpt;

/// Executor backed by a local CLI process.
pub struct CliExecutor {
    kind: ExecutorKind,
    config: ExecutorProcessConfig,
}

impl CliExecutor {
    /// Create an executor for one family from its process config.
    pub fn new(kind: ExecutorKind, config: ExecutorProcessConfig) -> Self {
        Self { kind, config }
    }
}

#[async_trait]
impl Executor for CliExecutor {
    fn kind(&self) -> ExecutorKind {
        self.kind
    }

    async fn invoke(
        &self,
        request: InvokeRequest,
        chunk_tx: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult, InvokeError> {
        let timeout = request.timeout;

        debug!(
            executor = %self.kind,
            command = %self.config.command,
            timeout_secs = timeout.as_secs(),
            "spawning executor process"
        );

        let mut cmd = Command::new(&self.config.command);
        for arg in &self.config.args {
            cmd.arg(arg);
        }
        if let Some(ref model) = request.model {
            cmd.arg("--model").arg(model);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InvokeError::Spawn(format!(
                    "{} CLI not found (command: {})",
                    self.kind, self.config.command
                ))
            } else {
                InvokeError::Spawn(format!("failed to spawn {}: {}", self.config.command, e))
            }
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| InvokeError::Spawn("failed to open executor stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| InvokeError::Spawn("failed to capture executor stdout".to_string()))?;
        let stderr = child.stderr.take();

        let full_prompt = match &request.system_prompt {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };
        let input_tokens = approx_tokens(&full_prompt);

        // Drain stdout into a channel before writing stdin so a chatty
        // child cannot deadlock on a full pipe in either direction.
        let (line_tx, mut line_rx) = mpsc::channel::<String>(100);
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr);
                let _ = reader.read_to_string(&mut buf).await;
            }
            buf
        });

        tokio::spawn(async move {
            let _ = stdin.write_all(full_prompt.as_bytes()).await;
            let _ = stdin.shutdown().await;
        });

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut content = String::new();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = child.start_kill();
                    return Err(InvokeError::Cancelled);
                }
                _ = &mut deadline => {
                    let _ = child.start_kill();
                    return Err(InvokeError::Timeout(timeout));
                }
                line = line_rx.recv() => match line {
                    Some(line) => {
                        let _ = chunk_tx.send(line.clone()).await;
                        content.push_str(&line);
                        content.push('\n');
                    }
                    // stdout closed; the process is wrapping up
                    None => break,
                }
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                return Err(InvokeError::Cancelled);
            }
            status = child.wait() => status.map_err(|e| {
                InvokeError::Failed(format!("failed to reap executor process: {}", e))
            })?,
        };

        let stderr_text = stderr_handle.await.unwrap_or_default();

        if !status.success() {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "killed by signal".to_string());
            let detail = if stderr_text.trim().is_empty() {
                excerpt(&content, 300)
            } else {
                excerpt(&stderr_text, 300)
            };
            return Err(InvokeError::Failed(format!(
                "{} exited with status {}: {}",
                self.config.command, code, detail
            )));
        }

        if content.trim().is_empty() && looks_error_like(&stderr_text) {
            return Err(InvokeError::Failed(format!(
                "empty output with error transcript: {}",
                excerpt(&stderr_text, 300)
            )));
        }

        let output_tokens = approx_tokens(&content);
        Ok(ExecutionResult {
            content,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            provider: self.kind.id().to_string(),
            usage: TokenUsage {
                input_tokens,
                output_tokens,
            },
            executor: self.kind,
        })
    }
}

/// Build one CLI executor per family from the application config.
pub fn build_executor_set(config: &AppConfig) -> ExecutorSet {
    let executors: Vec<Arc<dyn Executor>> = ExecutorKind::ALL
        .into_iter()
        .map(|kind| {
            Arc::new(CliExecutor::new(kind, config.executors.get(kind).clone()))
                as Arc<dyn Executor>
        })
        .collect();
    ExecutorSet::new(executors)
}

/// Rough token estimate for usage accounting (4 chars per token).
fn approx_tokens(text: &str) -> u64 {
    (text.chars().count() as u64 + 3) / 4
}

/// Whether a transcript reads like an error dump.
fn looks_error_like(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ["error", "panic", "exception", "fatal", "traceback"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

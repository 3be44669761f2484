//! Settings Models
//!
//! Two configuration layers: `AppConfig` is the bootstrap configuration
//! loaded from `~/.taskpilot/config.json` (store endpoint, timings,
//! executor commands), and `RuntimeConfig` is the small mutable surface
//! that can be changed while the daemon runs. Runtime updates are clamped
//! server-side and take effect starting with the next picked task.

use serde::{Deserialize, Serialize};

use super::execution::ExecutorKind;

/// Bounds for the discussion turn cap.
pub const DISCUSSION_TURNS_MIN: u8 = 1;
pub const DISCUSSION_TURNS_MAX: u8 = 5;

/// Which executor handles tasks when no override applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutorMode {
    /// Weighted keyword classification picks the executor
    Auto,
    /// Every task is pinned to one executor
    Fixed(ExecutorKind),
}

impl Default for ExecutorMode {
    fn default() -> Self {
        ExecutorMode::Auto
    }
}

impl ExecutorMode {
    /// Stable string form ("auto", "claude", "codex", "gemini").
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorMode::Auto => "auto",
            ExecutorMode::Fixed(kind) => kind.id(),
        }
    }

    /// Lenient parse: executor ids map to `Fixed`, anything else to `Auto`.
    pub fn parse_lenient(s: &str) -> Self {
        match ExecutorKind::parse(s) {
            Some(kind) => ExecutorMode::Fixed(kind),
            None => ExecutorMode::Auto,
        }
    }
}

impl From<String> for ExecutorMode {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<ExecutorMode> for String {
    fn from(mode: ExecutorMode) -> Self {
        mode.as_str().to_string()
    }
}

impl std::fmt::Display for ExecutorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable runtime configuration.
///
/// Changes apply to the next picked task only; a cycle in flight keeps
/// the snapshot it started with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Executor selection mode
    #[serde(default)]
    pub executor_mode: ExecutorMode,
    /// Run an advisory shadow executor next to the writer (auto mode only)
    #[serde(default)]
    pub parallel_execution: bool,
    /// Negotiate a plan between two executors before implementing
    #[serde(default)]
    pub discussion_mode: bool,
    /// Turn cap for discussion mode, clamped to 1..=5
    #[serde(default = "default_discussion_max_turns")]
    pub discussion_max_turns: u8,
}

fn default_discussion_max_turns() -> u8 {
    3
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            executor_mode: ExecutorMode::Auto,
            parallel_execution: false,
            discussion_mode: false,
            discussion_max_turns: default_discussion_max_turns(),
        }
    }
}

impl RuntimeConfig {
    /// Clamp out-of-range fields in place.
    pub fn clamp_fields(&mut self) {
        self.discussion_max_turns = self
            .discussion_max_turns
            .clamp(DISCUSSION_TURNS_MIN, DISCUSSION_TURNS_MAX);
    }

    /// Apply a partial update, clamping values server-side.
    ///
    /// Returns a diff summary, one entry per field that changed.
    pub fn apply_update(&mut self, update: RuntimeConfigUpdate) -> Vec<String> {
        let mut diff = Vec::new();

        if let Some(mode) = update.executor_mode {
            let parsed = ExecutorMode::parse_lenient(&mode);
            if parsed != self.executor_mode {
                diff.push(format!("executor_mode: {} -> {}", self.executor_mode, parsed));
                self.executor_mode = parsed;
            }
        }
        if let Some(parallel) = update.parallel_execution {
            if parallel != self.parallel_execution {
                diff.push(format!(
                    "parallel_execution: {} -> {}",
                    self.parallel_execution, parallel
                ));
                self.parallel_execution = parallel;
            }
        }
        if let Some(discussion) = update.discussion_mode {
            if discussion != self.discussion_mode {
                diff.push(format!(
                    "discussion_mode: {} -> {}",
                    self.discussion_mode, discussion
                ));
                self.discussion_mode = discussion;
            }
        }
        if let Some(turns) = update.discussion_max_turns {
            let clamped = turns.clamp(DISCUSSION_TURNS_MIN, DISCUSSION_TURNS_MAX);
            if clamped != self.discussion_max_turns {
                diff.push(format!(
                    "discussion_max_turns: {} -> {}",
                    self.discussion_max_turns, clamped
                ));
                self.discussion_max_turns = clamped;
            }
        }

        diff
    }
}

/// Partial runtime configuration update.
///
/// `executor_mode` is accepted as a raw string so unknown values can fall
/// back to auto instead of failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfigUpdate {
    pub executor_mode: Option<String>,
    pub parallel_execution: Option<bool>,
    pub discussion_mode: Option<bool>,
    pub discussion_max_turns: Option<u8>,
}

/// Command line for one executor family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorProcessConfig {
    /// Binary to run
    pub command: String,
    /// Arguments before the prompt is written to stdin
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-invocation timeout in seconds
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,
}

fn default_executor_timeout() -> u64 {
    600
}

impl ExecutorProcessConfig {
    fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs: default_executor_timeout(),
        }
    }
}

/// Commands and timeouts for all three executor families.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorsConfig {
    pub claude: ExecutorProcessConfig,
    pub codex: ExecutorProcessConfig,
    pub gemini: ExecutorProcessConfig,
}

impl Default for ExecutorsConfig {
    fn default() -> Self {
        Self {
            claude: ExecutorProcessConfig::new("claude", &["-p", "--output-format", "text"]),
            codex: ExecutorProcessConfig::new("codex", &["exec"]),
            gemini: ExecutorProcessConfig::new("gemini", &["-p"]),
        }
    }
}

impl ExecutorsConfig {
    /// Config for one executor family.
    pub fn get(&self, kind: ExecutorKind) -> &ExecutorProcessConfig {
        match kind {
            ExecutorKind::Claude => &self.claude,
            ExecutorKind::Codex => &self.codex,
            ExecutorKind::Gemini => &self.gemini,
        }
    }

    /// Timeout for one executor family.
    pub fn timeout_secs(&self, kind: ExecutorKind) -> u64 {
        self.get(kind).timeout_secs
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Task store base URL; unset runs the in-memory store (local mode)
    #[serde(default)]
    pub store_url: Option<String>,
    /// Environment variable holding the store API token
    #[serde(default = "default_store_token_env")]
    pub store_token_env: String,
    /// Seconds between store polls while idle
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Seconds between finishing one task and picking the next
    #[serde(default = "default_inter_task_delay")]
    pub inter_task_delay_secs: u64,
    /// Cooldown after a transport failure (longer than the normal delay)
    #[serde(default = "default_transport_cooldown")]
    pub transport_cooldown_secs: u64,
    /// Broadcast capacity for the event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Executor command lines and timeouts
    #[serde(default)]
    pub executors: ExecutorsConfig,
    /// Initial runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

fn default_store_token_env() -> String {
    "TASKPILOT_STORE_TOKEN".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_inter_task_delay() -> u64 {
    10
}

fn default_transport_cooldown() -> u64 {
    180
}

fn default_event_capacity() -> usize {
    256
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            store_token_env: default_store_token_env(),
            poll_interval_secs: default_poll_interval(),
            inter_task_delay_secs: default_inter_task_delay(),
            transport_cooldown_secs: default_transport_cooldown(),
            event_capacity: default_event_capacity(),
            executors: ExecutorsConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Clamp fields that are corrected rather than rejected.
    pub fn normalize(&mut self) {
        self.runtime.clamp_fields();
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_secs < 5 {
            return Err("poll_interval_secs must be at least 5".to_string());
        }
        if self.inter_task_delay_secs < 1 {
            return Err("inter_task_delay_secs must be at least 1".to_string());
        }
        if self.transport_cooldown_secs < self.inter_task_delay_secs {
            return Err(
                "transport_cooldown_secs must not be shorter than inter_task_delay_secs"
                    .to_string(),
            );
        }
        for kind in ExecutorKind::ALL {
            let exec = self.executors.get(kind);
            if exec.command.trim().is_empty() {
                return Err(format!("executor command for {} must not be empty", kind));
            }
            if exec.timeout_secs < 30 {
                return Err(format!(
                    "executor timeout for {} must be at least 30 seconds",
                    kind
                ));
            }
        }
        if self.event_capacity < 16 {
            return Err("event_capacity must be at least 16".to_string());
        }
        Ok(())
    }
}

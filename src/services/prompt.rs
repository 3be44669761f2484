//! Prompt Builders
//!
//! Builds the prompts a cycle feeds to executors: the writer execution
//! prompt, the advisory (read-only) variant for shadow runs, and the
//! discussion-turn and final prompts for discussion mode. Natural
//! language content is deliberately plain; the interesting part is which
//! task fields and how much transcript each prompt carries.

use crate::models::{DiscussionTurn, Task};
use crate::utils::text::clip_chars;

/// Marker a discussion turn emits to signal the plan is ready.
pub const READINESS_MARKER: &str = "READY_TO_IMPLEMENT";

/// Character budget for each prior turn quoted into a prompt.
pub const TURN_CONTEXT_CHARS: usize = 2000;

/// How many prior turns a discussion turn sees.
const TURN_CONTEXT_WINDOW: usize = 2;

/// All prompts prepared for one task cycle.
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Shared system prompt
    pub system: String,
    /// Writer execution prompt
    pub execution: String,
    /// Read-only advisory variant for shadow runs
    pub advisory: String,
    /// Short task description used by discussion turns
    pub task_brief: String,
}

/// Build every prompt variant for a task up front.
pub fn build_prompt_set(task: &Task, context_blocks: &[String]) -> PromptSet {
    let execution = build_execution_prompt(task, context_blocks);
    PromptSet {
        system: build_system_prompt(),
        advisory: build_advisory_prompt(&execution),
        task_brief: build_task_brief(task),
        execution,
    }
}

/// Shared system prompt for all executors.
pub fn build_system_prompt() -> String {
    "You are an autonomous software engineer working through a task queue. \
     Work directly on the task described by the user prompt. \
     Be concrete: name the files you changed and summarize what you did at the end."
        .to_string()
}

/// Build the writer execution prompt from task fields.
pub fn build_execution_prompt(task: &Task, context_blocks: &[String]) -> String {
    let mut parts = Vec::new();

    parts.push(format!("# Task: {}", task.title));

    if !task.notes.trim().is_empty() {
        parts.push(format!("\n## Notes\n{}", task.notes.trim()));
    }

    let open_items = task.open_checklist();
    if !open_items.is_empty() {
        let list = open_items
            .iter()
            .map(|item| format!("- [ ] {}", item.text))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!("\n## Checklist\n{}", list));
    }

    if let Some(project) = &task.project {
        parts.push(format!("\n## Project\n{}", project));
    }

    for block in context_blocks {
        parts.push(format!("\n{}", block));
    }

    parts.push(
        "\n## Instructions\nComplete the task above. Finish with a short summary of what changed."
            .to_string(),
    );

    parts.join("\n")
}

/// Build the advisory variant of an execution prompt.
///
/// The shadow run is read-only: it reviews the task and flags risks but
/// must not change anything, and its output is never authoritative.
pub fn build_advisory_prompt(execution: &str) -> String {
    format!(
        "You are running in ADVISORY mode: do NOT modify any files or run \
         any commands with side effects.\n\
         Review the task below, outline how you would approach it, and list \
         the biggest risks or blockers you can see.\n\n{}",
        execution
    )
}

/// Short task description carried through discussion turns.
pub fn build_task_brief(task: &Task) -> String {
    let mut brief = format!("Task: {}", task.title);
    if !task.notes.trim().is_empty() {
        brief.push_str("\nNotes: ");
        brief.push_str(&clip_chars(task.notes.trim(), 500));
    }
    brief
}

/// Build one discussion turn prompt.
///
/// The speaker sees at most the previous two turns, each clipped to the
/// per-turn character budget, and is asked for a plan, risks, and an
/// explicit readiness signal.
pub fn discussion_turn_prompt(task_brief: &str, turns: &[DiscussionTurn], max_turns: u8) -> String {
    let mut parts = Vec::new();

    parts.push(format!(
        "You are one of two engineers negotiating an implementation plan \
         before any code is written (turn {} of at most {}).",
        turns.len() + 1,
        max_turns
    ));
    parts.push(format!("\n## Task\n{}", task_brief));

    let window_start = turns.len().saturating_sub(TURN_CONTEXT_WINDOW);
    for turn in &turns[window_start..] {
        parts.push(format!(
            "\n## Turn {} ({})\n{}",
            turn.index + 1,
            turn.executor,
            clip_chars(&turn.content, TURN_CONTEXT_CHARS)
        ));
    }

    parts.push(format!(
        "\n## Instructions\nRespond with your plan and the risks you see. \
         If the plan is settled and ready to implement, include the exact \
         marker {} on its own line.",
        READINESS_MARKER
    ));

    parts.join("\n")
}

/// Build the final execution prompt embedding the discussion transcript.
pub fn discussion_final_prompt(execution: &str, turns: &[DiscussionTurn]) -> String {
    let mut parts = Vec::new();

    parts.push(execution.to_string());
    parts.push("\n## Agreed Plan (discussion transcript)".to_string());
    for turn in turns {
        parts.push(format!(
            "\n### Turn {} ({})\n{}",
            turn.index + 1,
            turn.executor,
            clip_chars(&turn.content, TURN_CONTEXT_CHARS)
        ));
    }
    parts.push(
        "\nImplement the task following the agreed plan above where it is sound."
            .to_string(),
    );

    parts.join("\n")
}

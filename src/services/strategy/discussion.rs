//! Discussion Then Execute
//!
//! Two fixed executors negotiate an implementation plan before any code
//! is written, alternating turns with a bounded context window, then a
//! single finisher executes the agreed plan. The route decision is
//! ignored here: the speaking order is fixed so transcripts stay
//! comparable across tasks. The finisher runs exactly once: a failure
//! at that point escalates rather than falling back, since a plan
//! negotiated for one executor is not handed to another.

use tracing::{debug, info, warn};

use crate::models::{DiscussionTurn, ExecutorKind, RuntimeConfig};
use crate::services::policy::CycleError;
use crate::services::prompt::{self, PromptSet};

use super::fallback::{timed_invoke, AttemptLog};
use super::{Invoker, StrategyOutcome};

/// The two executors that hold the discussion, in speaking order.
pub const SPEAKERS: [ExecutorKind; 2] = [ExecutorKind::Claude, ExecutorKind::Codex];

/// The executor that turns the agreed plan into the final run.
pub const FINISHER: ExecutorKind = ExecutorKind::Claude;

/// Hold the discussion, then execute the agreed plan.
///
/// A turn that emits the readiness marker ends the discussion early
/// once at least two turns exist. A failed turn is logged and the
/// discussion moves straight to execution with the turns gathered so
/// far. Cancellation anywhere aborts the whole cycle.
pub async fn run_discussion(
    invoker: &Invoker,
    prompts: &PromptSet,
    config: &RuntimeConfig,
) -> Result<StrategyOutcome, CycleError> {
    let max_turns = config.discussion_max_turns;
    let mut turns: Vec<DiscussionTurn> = Vec::new();
    let mut log = AttemptLog::new();

    for index in 0..max_turns as usize {
        let speaker = SPEAKERS[index % SPEAKERS.len()];
        let turn_prompt = prompt::discussion_turn_prompt(&prompts.task_brief, &turns, max_turns);
        let role = format!("turn {}", index + 1);

        match timed_invoke(invoker, speaker, &role, &turn_prompt, Some(&prompts.system), &mut log)
            .await
        {
            Ok(result) => {
                let ready = result.content.contains(prompt::READINESS_MARKER);
                turns.push(DiscussionTurn {
                    index,
                    executor: speaker,
                    content: result.content,
                });
                debug!(turn = index + 1, speaker = %speaker, ready, "discussion turn complete");
                if ready && turns.len() >= 2 {
                    info!(turns = turns.len(), "readiness marker seen, ending discussion early");
                    break;
                }
            }
            Err(err) if err.is_cancelled() => return Err(CycleError::Cancelled),
            Err(err) => {
                warn!(
                    turn = index + 1,
                    speaker = %speaker,
                    error = %err,
                    "discussion turn failed, moving to execution with partial transcript"
                );
                break;
            }
        }
    }

    let final_prompt = prompt::discussion_final_prompt(&prompts.execution, &turns);
    info!(finisher = %FINISHER, turns = turns.len(), "executing the agreed plan");

    match timed_invoke(
        invoker,
        FINISHER,
        "finisher",
        &final_prompt,
        Some(&prompts.system),
        &mut log,
    )
    .await
    {
        Ok(result) => Ok(StrategyOutcome {
            result,
            attempts: log,
            discussion: turns,
        }),
        Err(err) => Err(CycleError::from_strict_failure(FINISHER, &err)),
    }
}

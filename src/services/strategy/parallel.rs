//! Parallel Writer + Shadow
//!
//! Runs the routed executor as the writer while the first executor in
//! its fallback order shadows it concurrently on a read-only advisory
//! prompt. The writer's result is always authoritative; the shadow
//! exists to produce a second opinion and to prove an alternate lane
//! viable before the writer's failure is known. Only non-strict routes
//! in auto mode ever reach this strategy.

use tracing::{debug, info, warn};

use crate::models::{ExecutionResult, ExecutorKind, RouteDecision};
use crate::services::executors::{catalog, InvokeError};
use crate::services::policy::CycleError;
use crate::services::prompt::PromptSet;
use crate::utils::text::excerpt;

use super::fallback::{self, timed_invoke, AttemptLog, ExecutionAttempt};
use super::{Invoker, StrategyOutcome};

const ADVISORY_EXCERPT_CHARS: usize = 200;

/// One concurrently running invocation, timed and recorded.
async fn lane(
    invoker: &Invoker,
    kind: ExecutorKind,
    role: &str,
    prompt: &str,
    system: &str,
) -> (Result<ExecutionResult, InvokeError>, ExecutionAttempt) {
    let started_at = chrono::Utc::now();
    let clock = std::time::Instant::now();
    let outcome = invoker.invoke(kind, prompt, Some(system)).await;
    let attempt = ExecutionAttempt {
        executor: kind,
        role: role.to_string(),
        error: outcome.as_ref().err().map(|e| e.to_string()),
        duration_ms: clock.elapsed().as_millis() as u64,
        started_at,
    };
    (outcome, attempt)
}

/// Run the writer and its shadow concurrently.
///
/// Writer success wins regardless of the shadow. Writer failure with a
/// successful shadow promotes the shadow to writer through the fallback
/// chain. Both lanes failing leaves one tertiary attempt on the
/// remaining executor; its failure aggregates all three. Cancellation
/// propagates from any lane without further attempts.
pub async fn run_parallel_shadow(
    invoker: &Invoker,
    decision: &RouteDecision,
    prompts: &PromptSet,
) -> Result<StrategyOutcome, CycleError> {
    let writer = decision.executor;
    let order = catalog::fallback_order(writer);
    let shadow = order[0];
    let tertiary = order[1];

    debug!(writer = %writer, shadow = %shadow, "launching writer with shadow");

    let (
        (writer_outcome, writer_attempt),
        (shadow_outcome, shadow_attempt),
    ) = tokio::join!(
        lane(invoker, writer, "writer", &prompts.execution, &prompts.system),
        lane(invoker, shadow, "shadow", &prompts.advisory, &prompts.system),
    );

    let mut log = AttemptLog::new();
    log.push(writer_attempt);
    log.push(shadow_attempt);

    match (writer_outcome, shadow_outcome) {
        (Ok(result), shadow_outcome) => {
            match shadow_outcome {
                Ok(advisory) => {
                    info!(
                        shadow = %shadow,
                        advisory = %excerpt(&advisory.content, ADVISORY_EXCERPT_CHARS),
                        "shadow advisory"
                    );
                }
                Err(err) => debug!(shadow = %shadow, error = %err, "shadow lane failed"),
            }
            Ok(StrategyOutcome::from_result(result, log))
        }
        (Err(writer_err), _) if writer_err.is_cancelled() => Err(CycleError::Cancelled),
        (Err(writer_err), Ok(advisory)) => {
            warn!(writer = %writer, error = %writer_err, shadow = %shadow, "writer failed, promoting shadow");
            let reason = format!(
                "writer {} failed ({}), promoting shadow {}",
                writer, writer_err, shadow
            );
            invoker.observer().route_switched(shadow, &reason).await;
            info!(
                advisory = %excerpt(&advisory.content, ADVISORY_EXCERPT_CHARS),
                "shadow advisory carried into promotion"
            );

            let promoted = RouteDecision {
                executor: shadow,
                agent_id: catalog::profile(shadow).agent_id.to_string(),
                skill: decision.skill.clone(),
                reason,
                scores: decision.scores,
                strict: false,
            };
            let mut outcome = fallback::run_fallback_chain(invoker, &promoted, prompts).await?;
            let mut merged = log;
            merged.merge(outcome.attempts);
            outcome.attempts = merged;
            Ok(outcome)
        }
        (Err(writer_err), Err(shadow_err)) => {
            if shadow_err.is_cancelled() {
                return Err(CycleError::Cancelled);
            }
            warn!(
                writer = %writer,
                writer_error = %writer_err,
                shadow = %shadow,
                shadow_error = %shadow_err,
                tertiary = %tertiary,
                "both lanes failed, trying the remaining executor"
            );
            let reason = format!(
                "writer {} and shadow {} both failed, last resort {}",
                writer, shadow, tertiary
            );
            invoker.observer().route_switched(tertiary, &reason).await;

            match timed_invoke(
                invoker,
                tertiary,
                "tertiary",
                &prompts.execution,
                Some(&prompts.system),
                &mut log,
            )
            .await
            {
                Ok(result) => Ok(StrategyOutcome::from_result(result, log)),
                Err(err) if err.is_cancelled() => Err(CycleError::Cancelled),
                Err(_) => Err(CycleError::from_exhausted_chain(log.failed())),
            }
        }
    }
}

//! Step evaluation: one atomic application of a step procedure.

use crate::core::{IterError, Snapshot, StepFailure, FINISHED_KEY, ITER_KEY};
use std::sync::Arc;
use tracing::{trace, warn};

/// Result of a bounded step procedure.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// The state advanced and a value will be yielded from it.
    Advanced(Snapshot),

    /// The generator has nothing more to produce.
    Exhausted,
}

impl From<Snapshot> for StepOutcome {
    fn from(snapshot: Snapshot) -> Self {
        StepOutcome::Advanced(snapshot)
    }
}

/// Shared step procedure.
/// Receives an owned copy of the current snapshot and returns the next one.
pub type StepProcedure =
    Arc<dyn Fn(Snapshot) -> Result<StepOutcome, StepFailure> + Send + Sync>;

/// Shared yield selector.
pub type YieldSelector<Y> = Arc<dyn Fn(&Snapshot) -> Y + Send + Sync>;

pub(crate) fn unbounded<F>(step: F) -> StepProcedure
where
    F: Fn(Snapshot) -> Result<Snapshot, StepFailure> + Send + Sync + 'static,
{
    Arc::new(move |snapshot: Snapshot| step(snapshot).map(StepOutcome::Advanced))
}

pub(crate) fn bounded<F>(step: F) -> StepProcedure
where
    F: Fn(Snapshot) -> Result<StepOutcome, StepFailure> + Send + Sync + 'static,
{
    Arc::new(step)
}

pub(crate) fn selector<Y, F>(select: F) -> YieldSelector<Y>
where
    F: Fn(&Snapshot) -> Y + Send + Sync + 'static,
{
    Arc::new(select)
}

/// Result of a single application of the step procedure.
pub(crate) enum Evaluation<Y> {
    Stepped { snapshot: Snapshot, value: Y },
    Exhausted,
}

/// Apply `step` to a copy of `current`, then extract the yield value.
///
/// `current` is never touched. The caller commits the returned snapshot,
/// so a failure at any point leaves the iterator exactly as it was.
pub(crate) fn apply<Y>(
    step: &StepProcedure,
    select: &YieldSelector<Y>,
    current: &Snapshot,
    iteration: usize,
) -> Result<Evaluation<Y>, IterError> {
    let next_iteration = iteration + 1;

    let outcome = step(current.clone()).map_err(|source| IterError::StepEvaluation {
        iteration: next_iteration,
        source,
    })?;

    let mut next = match outcome {
        StepOutcome::Advanced(snapshot) => snapshot,
        StepOutcome::Exhausted => {
            trace!(iteration, "step procedure reported exhaustion");
            return Ok(Evaluation::Exhausted);
        }
    };

    let (added, removed) = current.key_diff(&next);
    if !added.is_empty() || !removed.is_empty() {
        warn!(
            iteration = next_iteration,
            ?added,
            ?removed,
            "step procedure changed the snapshot keys"
        );
        return Err(IterError::KeySetChanged {
            iteration: next_iteration,
            added,
            removed,
        });
    }

    next.put_reserved(ITER_KEY, next_iteration);
    next.put_reserved(FINISHED_KEY, false);
    let value = select(&next);

    trace!(iteration = next_iteration, keys = next.len(), "step applied");
    Ok(Evaluation::Stepped {
        snapshot: next,
        value,
    })
}

//! Builder for constructing stateful iterators.

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::collect::CollectorConfig;
use crate::core::{ConfigError, IntoSnapshot, IterError, Snapshot, StepFailure, Value};
use crate::iterator::{
    bounded, selector, unbounded, StatefulIterator, StepOutcome, StepProcedure, YieldSelector,
};
use tracing::debug;

/// Builder for constructing stateful iterators with a fluent API.
///
/// The step procedure, initial state and yield selector are required; the
/// collector configuration falls back to [`CollectorConfig::default`].
pub struct IteratorBuilder<Y = Value> {
    step: Option<StepProcedure>,
    initial: Option<Result<Snapshot, ConfigError>>,
    select: Option<YieldSelector<Y>>,
    config: CollectorConfig,
    resumed: Option<(usize, bool)>,
}

impl<Y> IteratorBuilder<Y> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step: None,
            initial: None,
            select: None,
            config: CollectorConfig::default(),
            resumed: None,
        }
    }

    /// Set a step procedure that never runs out (required, or use
    /// [`IteratorBuilder::step_with_outcome`]).
    pub fn step<F>(mut self, step: F) -> Self
    where
        F: Fn(Snapshot) -> Result<Snapshot, StepFailure> + Send + Sync + 'static,
    {
        self.step = Some(unbounded(step));
        self
    }

    /// Set a step procedure that may report exhaustion.
    pub fn step_with_outcome<F>(mut self, step: F) -> Self
    where
        F: Fn(Snapshot) -> Result<StepOutcome, StepFailure> + Send + Sync + 'static,
    {
        self.step = Some(bounded(step));
        self
    }

    /// Set the initial state (required).
    ///
    /// Conversion problems are held until [`IteratorBuilder::build`].
    pub fn initial(mut self, state: impl IntoSnapshot) -> Self {
        self.initial = Some(state.into_snapshot());
        self
    }

    /// Set the yield selector (required).
    pub fn yield_with<G>(mut self, select: G) -> Self
    where
        G: Fn(&Snapshot) -> Y + Send + Sync + 'static,
    {
        self.select = Some(selector(select));
        self
    }

    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    pub fn growth_factor(mut self, factor: usize) -> Self {
        self.config.growth_factor = factor;
        self
    }

    /// Continue from a checkpoint instead of a fresh initial state.
    ///
    /// Restores the snapshot, counter, finished flag and collector
    /// configuration. The step procedure and yield selector still have to
    /// be supplied, since closures are not part of a checkpoint.
    pub fn resume_from(mut self, checkpoint: Checkpoint) -> Result<Self, CheckpointError> {
        checkpoint.validate()?;

        debug!(
            checkpoint = %checkpoint.id,
            iteration = checkpoint.iteration,
            finished = checkpoint.finished,
            "resuming from checkpoint"
        );
        self.initial = Some(Ok(checkpoint.snapshot));
        self.config = checkpoint.config;
        self.resumed = Some((checkpoint.iteration, checkpoint.finished));
        Ok(self)
    }

    /// Build the iterator.
    /// Returns an error if required pieces are missing or the collector
    /// configuration is invalid.
    pub fn build(self) -> Result<StatefulIterator<Y>, IterError> {
        let step = self.step.ok_or(ConfigError::MissingStep)?;
        let snapshot = self.initial.ok_or(ConfigError::MissingInitialState)??;
        let select = self.select.ok_or(ConfigError::MissingYield)?;
        self.config.validate()?;

        let (iteration, finished) = self.resumed.unwrap_or((0, false));
        Ok(StatefulIterator::restore(
            step,
            snapshot,
            select,
            self.config,
            iteration,
            finished,
        ))
    }
}

impl<Y> Default for IteratorBuilder<Y> {
    fn default() -> Self {
        Self::new()
    }
}

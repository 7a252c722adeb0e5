//! The stateful iterator: snapshot, step procedure, yield selector,
//! counter and finished flag.

use super::step::{self, Evaluation, StepOutcome, StepProcedure, YieldSelector};
use crate::builder::IteratorBuilder;
use crate::collect::CollectorConfig;
use crate::core::{
    ConfigError, IntoSnapshot, IterError, Snapshot, StepFailure, Value, FINISHED_KEY, ITER_KEY,
    RESERVED_PREFIX,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A generator that applies a step procedure to an evolving snapshot and
/// yields one value per step.
///
/// State persists between calls, so a later `yield_next` or `yield_more`
/// resumes exactly where the previous call stopped. Cloning produces an
/// independent iterator that shares no mutable storage with its source.
///
/// # Example
///
/// ```rust
/// use stepwise::{Snapshot, StatefulIterator, Value};
///
/// let mut counter = StatefulIterator::new(
///     |mut s: Snapshot| {
///         s.set("x", &s["x"] + 1)?;
///         Ok(s)
///     },
///     [("x", 0)],
///     |s: &Snapshot| s["x"].clone(),
/// )
/// .unwrap();
///
/// assert_eq!(counter.yield_next().unwrap(), Some(Value::Int(1)));
/// assert_eq!(counter.yield_next().unwrap(), Some(Value::Int(2)));
/// assert_eq!(counter.iteration(), 2);
/// ```
pub struct StatefulIterator<Y = Value> {
    snapshot: Snapshot,
    step: StepProcedure,
    select: YieldSelector<Y>,
    iteration: usize,
    finished: bool,
    /// Set once `Iterator::next` has handed out an error.
    halted: bool,
    config: CollectorConfig,
}

impl<Y> StatefulIterator<Y> {
    /// Create an iterator whose step procedure never runs out.
    ///
    /// Fails with a configuration error if `initial` is not a valid
    /// key/value mapping.
    pub fn new<F, S, G>(step: F, initial: S, select: G) -> Result<Self, IterError>
    where
        F: Fn(Snapshot) -> Result<Snapshot, StepFailure> + Send + Sync + 'static,
        S: IntoSnapshot,
        G: Fn(&Snapshot) -> Y + Send + Sync + 'static,
    {
        Ok(Self::from_parts(
            step::unbounded(step),
            initial.into_snapshot()?,
            step::selector(select),
            CollectorConfig::default(),
        ))
    }

    /// Create an iterator whose step procedure can report exhaustion.
    pub fn with_outcome<F, S, G>(step: F, initial: S, select: G) -> Result<Self, IterError>
    where
        F: Fn(Snapshot) -> Result<StepOutcome, StepFailure> + Send + Sync + 'static,
        S: IntoSnapshot,
        G: Fn(&Snapshot) -> Y + Send + Sync + 'static,
    {
        Ok(Self::from_parts(
            step::bounded(step),
            initial.into_snapshot()?,
            step::selector(select),
            CollectorConfig::default(),
        ))
    }

    /// Start a fluent builder.
    pub fn builder() -> IteratorBuilder<Y> {
        IteratorBuilder::new()
    }

    pub(crate) fn from_parts(
        step: StepProcedure,
        snapshot: Snapshot,
        select: YieldSelector<Y>,
        config: CollectorConfig,
    ) -> Self {
        Self::restore(step, snapshot, select, config, 0, false)
    }

    pub(crate) fn restore(
        step: StepProcedure,
        snapshot: Snapshot,
        select: YieldSelector<Y>,
        config: CollectorConfig,
        iteration: usize,
        finished: bool,
    ) -> Self {
        let mut it = Self {
            snapshot,
            step,
            select,
            iteration,
            finished,
            halted: false,
            config,
        };
        it.sync_reserved();
        it
    }

    fn sync_reserved(&mut self) {
        self.snapshot.put_reserved(ITER_KEY, self.iteration);
        self.snapshot.put_reserved(FINISHED_KEY, self.finished);
    }

    /// Number of successful steps taken so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current state, including the reserved `.iter` and `.finished` keys.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub(crate) fn ensure_active(&self) -> Result<(), IterError> {
        if self.finished {
            Err(IterError::Exhausted {
                iterations: self.iteration,
            })
        } else {
            Ok(())
        }
    }

    /// Take one step and return the yielded value.
    ///
    /// Returns `Ok(None)` when the step procedure reports exhaustion; the
    /// iterator is finished from then on and further calls fail with
    /// [`IterError::Exhausted`]. On any error the snapshot and counter are
    /// left unchanged.
    pub fn yield_next(&mut self) -> Result<Option<Y>, IterError> {
        self.ensure_active()?;

        match step::apply(&self.step, &self.select, &self.snapshot, self.iteration)? {
            Evaluation::Stepped { snapshot, value } => {
                self.snapshot = snapshot;
                self.iteration += 1;
                Ok(Some(value))
            }
            Evaluation::Exhausted => {
                self.finished = true;
                self.sync_reserved();
                debug!(iterations = self.iteration, "iterator reached end of sequence");
                Ok(None)
            }
        }
    }

    /// Clone the iterator with some snapshot values replaced.
    ///
    /// The clone starts unfinished and keeps the current iteration count.
    /// Every override key must already exist in the snapshot: unknown keys
    /// are reported together as [`IterError::UnknownKey`], and reserved keys
    /// cannot be overridden at all.
    ///
    /// ```rust
    /// use stepwise::{Snapshot, StatefulIterator, Value};
    ///
    /// let mut it = StatefulIterator::new(
    ///     |mut s: Snapshot| {
    ///         s.set("x", &s["x"] + &s["by"])?;
    ///         Ok(s)
    ///     },
    ///     [("x", 0), ("by", 1)],
    ///     |s: &Snapshot| s["x"].clone(),
    /// )
    /// .unwrap();
    ///
    /// let mut tens = it.clone_with([("by", 10)]).unwrap();
    /// assert_eq!(tens.yield_next().unwrap(), Some(Value::Int(10)));
    /// assert_eq!(it.yield_next().unwrap(), Some(Value::Int(1)));
    ///
    /// assert!(it.clone_with([("nope", 1)]).is_err());
    /// ```
    pub fn clone_with<I, K, V>(&self, overrides: I) -> Result<Self, IterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut snapshot = self.snapshot.clone();
        let mut unknown = Vec::new();
        let mut applied = 0usize;

        for (key, value) in overrides {
            let key = key.into();
            if key.starts_with(RESERVED_PREFIX) {
                return Err(ConfigError::ReservedOverride { key }.into());
            }
            if snapshot.set(&key, value).is_err() {
                unknown.push(key);
            } else {
                applied += 1;
            }
        }

        if !unknown.is_empty() {
            return Err(IterError::UnknownKey { keys: unknown });
        }

        debug!(iteration = self.iteration, overrides = applied, "iterator cloned");
        Ok(self.fork(snapshot))
    }

    fn fork(&self, snapshot: Snapshot) -> Self {
        Self::restore(
            Arc::clone(&self.step),
            snapshot,
            Arc::clone(&self.select),
            self.config.clone(),
            self.iteration,
            false,
        )
    }
}

/// Same as [`StatefulIterator::clone_with`] without overrides: the copy
/// has the current snapshot and counter but is never finished.
impl<Y> Clone for StatefulIterator<Y> {
    fn clone(&self) -> Self {
        self.fork(self.snapshot.clone())
    }
}

/// Drives the iterator one step per item. It ends once the iterator is
/// finished, or right after the first error it yields. A failed step leaves
/// the state untouched, so [`StatefulIterator::yield_next`] can still retry
/// it; clones start with the adapter live again.
impl<Y> Iterator for StatefulIterator<Y> {
    type Item = Result<Y, IterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.halted {
            return None;
        }
        let item = self.yield_next().transpose();
        self.halted = matches!(item, Some(Err(_)));
        item
    }
}

impl<Y> fmt::Debug for StatefulIterator<Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulIterator")
            .field("snapshot", &self.snapshot)
            .field("iteration", &self.iteration)
            .field("finished", &self.finished)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

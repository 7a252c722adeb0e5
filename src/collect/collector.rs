//! Bulk production on top of single-step advancement.

use super::buffer::GrowthBuffer;
use super::config::MAX_INITIAL_CAPACITY;
use crate::core::{IterError, Predicate};
use crate::iterator::StatefulIterator;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use tracing::debug;

/// Why a bulk operation stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The requested number of values was produced.
    CountReached,

    /// The continuation condition became false.
    ConditionFalse,

    /// The underlying sequence ran out before the request was satisfied.
    Exhausted,
}

/// Values produced by `yield_more` / `yield_while`, plus the reason the
/// operation stopped.
///
/// Dereferences to a slice of the values.
#[derive(Clone, Debug, PartialEq)]
pub struct Yielded<Y> {
    values: Vec<Y>,
    end: EndReason,
}

impl<Y> Yielded<Y> {
    pub fn values(&self) -> &[Y] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Y> {
        self.values
    }

    pub fn end(&self) -> EndReason {
        self.end
    }

    /// True when the sequence ran out, as opposed to the count being met
    /// or the condition becoming false.
    pub fn is_exhausted(&self) -> bool {
        self.end == EndReason::Exhausted
    }
}

impl<Y> Deref for Yielded<Y> {
    type Target = [Y];

    fn deref(&self) -> &[Y] {
        &self.values
    }
}

impl<Y> IntoIterator for Yielded<Y> {
    type Item = Y;
    type IntoIter = std::vec::IntoIter<Y>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Result of `move_more` / `move_while`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Moved {
    pub steps: usize,
    pub end: EndReason,
}

impl Moved {
    pub fn is_exhausted(&self) -> bool {
        self.end == EndReason::Exhausted
    }
}

impl<Y> StatefulIterator<Y> {
    /// Produce up to `n` values.
    ///
    /// Exactly `n` values come back unless the sequence is exhausted first,
    /// in which case the result is shorter and [`Yielded::is_exhausted`]
    /// holds. Fails as a unit: if any step errors, nothing is returned.
    ///
    /// ```rust
    /// use stepwise::{Snapshot, StatefulIterator, Value};
    ///
    /// let mut it = StatefulIterator::new(
    ///     |mut s: Snapshot| {
    ///         s.set("x", &s["x"] + 1)?;
    ///         Ok(s)
    ///     },
    ///     [("x", 0)],
    ///     |s: &Snapshot| s["x"].clone(),
    /// )
    /// .unwrap();
    ///
    /// let first = it.yield_more(3).unwrap();
    /// assert_eq!(first.values(), &[Value::Int(1), Value::Int(2), Value::Int(3)]);
    ///
    /// let next = it.yield_more(2).unwrap();
    /// assert_eq!(next.values(), &[Value::Int(4), Value::Int(5)]);
    /// ```
    pub fn yield_more(&mut self, n: usize) -> Result<Yielded<Y>, IterError> {
        self.ensure_active()?;

        let mut buffer = self.buffer(n.min(self.config().initial_capacity));
        let end = self.pull_count(n, |value| buffer.push(value))?;
        let values = buffer.finish();

        debug!(requested = n, produced = values.len(), ?end, "yield_more finished");
        Ok(Yielded { values, end })
    }

    /// Produce values for as long as `predicate` holds.
    ///
    /// The predicate is checked against the current snapshot before every
    /// step, so an initially false predicate yields nothing. An undefined
    /// predicate result fails with [`IterError::UndefinedCondition`].
    pub fn yield_while<P: Predicate>(&mut self, predicate: P) -> Result<Yielded<Y>, IterError> {
        self.ensure_active()?;

        let mut buffer = self.buffer(self.config().initial_capacity);
        let end = self.pull_while(&predicate, |value| buffer.push(value))?;
        let values = buffer.finish();

        debug!(produced = values.len(), ?end, "yield_while finished");
        Ok(Yielded { values, end })
    }

    /// Advance up to `n` steps, discarding the values.
    pub fn move_more(&mut self, n: usize) -> Result<Moved, IterError> {
        self.ensure_active()?;

        let mut steps = 0;
        let end = self.pull_count(n, |_| steps += 1)?;
        Ok(Moved { steps, end })
    }

    /// Advance while `predicate` holds, discarding the values.
    pub fn move_while<P: Predicate>(&mut self, predicate: P) -> Result<Moved, IterError> {
        self.ensure_active()?;

        let mut steps = 0;
        let end = self.pull_while(&predicate, |_| steps += 1)?;
        Ok(Moved { steps, end })
    }

    fn buffer(&self, initial_capacity: usize) -> GrowthBuffer<Y> {
        GrowthBuffer::new(
            initial_capacity.min(MAX_INITIAL_CAPACITY),
            self.config().growth_factor,
        )
    }

    fn pull_count(&mut self, n: usize, mut sink: impl FnMut(Y)) -> Result<EndReason, IterError> {
        for _ in 0..n {
            match self.yield_next()? {
                Some(value) => sink(value),
                None => return Ok(EndReason::Exhausted),
            }
        }
        Ok(EndReason::CountReached)
    }

    fn pull_while<P: Predicate>(
        &mut self,
        predicate: &P,
        mut sink: impl FnMut(Y),
    ) -> Result<EndReason, IterError> {
        loop {
            if !predicate.check(self.snapshot(), self.iteration())? {
                return Ok(EndReason::ConditionFalse);
            }
            match self.yield_next()? {
                Some(value) => sink(value),
                None => return Ok(EndReason::Exhausted),
            }
        }
    }
}

//! Continuation conditions for predicate-driven iteration.
//!
//! A condition is a pure function of the current snapshot. It is evaluated
//! before every step of `yield_while` / `move_while` and must produce a
//! definite answer: an undefined result stops the iteration with an error
//! rather than being read as "continue" or "stop".

use super::error::IterError;
use super::snapshot::Snapshot;
use super::value::Truth;
use std::sync::Arc;

/// Pure predicate deciding whether an iterator takes another step.
///
/// The snapshot passed in includes the reserved `.iter` counter, so
/// conditions can bound iteration by count as well as by state.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{Condition, Predicate, Snapshot, Truth};
///
/// let state = Snapshot::from_pairs([("n", 8)]).unwrap();
///
/// let not_one = Condition::new(|s: &Snapshot| s["n"].ne_to(1));
/// assert_eq!(not_one.evaluate(&state), Truth::True);
/// assert!(not_one.check(&state, 0).unwrap());
///
/// let undefined = Condition::new(|s: &Snapshot| s["unset"].less_than(3));
/// assert!(undefined.check(&state, 0).is_err());
/// ```
#[derive(Clone)]
pub struct Condition {
    predicate: Arc<dyn Fn(&Snapshot) -> Truth + Send + Sync>,
}

impl Condition {
    /// Create a condition from a pure predicate.
    ///
    /// The predicate may return a plain `bool`, an `Option<bool>` or a
    /// [`Truth`].
    pub fn new<F, T>(predicate: F) -> Self
    where
        F: Fn(&Snapshot) -> T + Send + Sync + 'static,
        T: Into<Truth>,
    {
        Condition {
            predicate: Arc::new(move |snapshot: &Snapshot| -> Truth { predicate(snapshot).into() }),
        }
    }
}

/// Anything that can decide whether iteration continues.
///
/// Implemented for [`Condition`] and for any closure over a snapshot that
/// returns `bool`, `Option<bool>` or [`Truth`]. Closures passed directly to
/// `yield_while` may borrow from their surroundings; a [`Condition`] is the
/// owned, shareable form.
pub trait Predicate {
    /// Three-valued result of the predicate.
    fn evaluate(&self, snapshot: &Snapshot) -> Truth;

    /// Definite result of the predicate.
    ///
    /// `iteration` only labels the error raised for an undefined result.
    fn check(&self, snapshot: &Snapshot, iteration: usize) -> Result<bool, IterError> {
        self.evaluate(snapshot)
            .to_bool()
            .ok_or(IterError::UndefinedCondition { iteration })
    }
}

impl Predicate for Condition {
    fn evaluate(&self, snapshot: &Snapshot) -> Truth {
        (self.predicate)(snapshot)
    }
}

impl<F, T> Predicate for F
where
    F: Fn(&Snapshot) -> T,
    T: Into<Truth>,
{
    fn evaluate(&self, snapshot: &Snapshot) -> Truth {
        self(snapshot).into()
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn state(n: i64) -> Snapshot {
        Snapshot::from_pairs([("n", n)]).unwrap()
    }

    #[test]
    fn condition_accepts_plain_bool() {
        let even = Condition::new(|s: &Snapshot| s["n"].as_i64().is_some_and(|n| n % 2 == 0));
        assert!(even.check(&state(4), 0).unwrap());
        assert!(!even.check(&state(3), 0).unwrap());
    }

    #[test]
    fn condition_accepts_truth() {
        let small = Condition::new(|s: &Snapshot| s["n"].less_than(10));
        assert_eq!(small.evaluate(&state(3)), Truth::True);
        assert_eq!(small.evaluate(&state(30)), Truth::False);
    }

    #[test]
    fn undefined_result_is_an_error() {
        let cond = Condition::new(|s: &Snapshot| s["n"].eq_to(Value::Missing));
        let err = cond.check(&state(1), 7).unwrap_err();
        assert!(matches!(err, IterError::UndefinedCondition { iteration: 7 }));
    }

    #[test]
    fn option_none_is_undefined() {
        let cond = Condition::new(|s: &Snapshot| s["flag"].as_bool());
        assert_eq!(cond.evaluate(&state(1)), Truth::Undefined);
    }

    #[test]
    fn condition_is_deterministic() {
        let cond = Condition::new(|s: &Snapshot| s["n"].greater_than(0));
        let snapshot = state(5);
        assert_eq!(cond.evaluate(&snapshot), cond.evaluate(&snapshot));
    }

    #[test]
    fn closures_are_predicates() {
        let limit = 3;
        let below_limit = |s: &Snapshot| s["n"].less_than(limit);
        assert!(below_limit.check(&state(2), 0).unwrap());
        assert!(!below_limit.check(&state(3), 0).unwrap());
    }

    #[test]
    fn clones_share_the_predicate() {
        let cond = Condition::new(|s: &Snapshot| s["n"].at_least(2));
        let copy = cond.clone();
        assert_eq!(cond.evaluate(&state(2)), copy.evaluate(&state(2)));
    }
}

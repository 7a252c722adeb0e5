//! Set-builder construction of filtering iterators.
//!
//! `that_for_all(source).against(candidates).we_have(membership)` describes
//! the set of source elements `x` for which `membership(x, y)` holds for
//! every candidate `y`. The result is an ordinary [`StatefulIterator`] that
//! walks the source with an index and yields each qualifying element.
//!
//! # Environment capture
//!
//! Step procedures normally see nothing but the snapshot they are given.
//! The membership test and candidate generator here are the exception:
//! they are closures, so they carry whatever they captured when the
//! iterator was built, and later changes to that environment are not
//! visible to them.
//!
//! # Example
//!
//! ```rust
//! use stepwise::{that_for_all, Value};
//!
//! // Numbers with no divisor in 2..x, i.e. primes.
//! let mut primes = that_for_all(2..=30)
//!     .against(|x: &Value| Value::range(2, x))
//!     .we_have(|x: &Value, y: &Value| (x % y).ne_to(0))
//!     .unwrap();
//!
//! let found = primes.yield_more(5).unwrap();
//! assert_eq!(found.into_values(), vec![
//!     Value::Int(2),
//!     Value::Int(3),
//!     Value::Int(5),
//!     Value::Int(7),
//!     Value::Int(11),
//! ]);
//! ```

use crate::collect::CollectorConfig;
use crate::core::{
    IterError, Snapshot, StepFailure, Truth, Value, ELEMENT_KEY, INDEX_KEY, SOURCE_KEY,
};
use crate::iterator::{bounded, selector, StatefulIterator, StepOutcome};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

type Candidates = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Failures raised by a comprehension's step procedure.
///
/// They reach callers as the source of [`IterError::StepEvaluation`].
#[derive(Debug, Error, PartialEq)]
pub enum ComprehensionError {
    #[error("membership of element {element} (position {position}) is undefined")]
    MembershipUndefined { element: Value, position: usize },

    #[error("index '{}' is not a valid position (found {found})", INDEX_KEY)]
    CorruptIndex { found: String },

    #[error("source '{}' is not a sequence (found {found})", SOURCE_KEY)]
    CorruptSource { found: String },
}

/// Start a comprehension over `source`.
pub fn that_for_all<I, T>(source: I) -> ForAll
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    ForAll {
        source: source.into_iter().map(Into::into).collect(),
        candidates: Arc::new(|_: &Value| Value::Seq(Vec::new())),
        config: CollectorConfig::default(),
    }
}

/// A comprehension awaiting its membership test.
pub struct ForAll {
    source: Vec<Value>,
    candidates: Candidates,
    config: CollectorConfig,
}

impl ForAll {
    /// Supply the `y` candidates for each source element `x`.
    ///
    /// A sequence is tested element by element, any other value counts as
    /// a single candidate, and `Missing` makes membership undefined. With
    /// no candidates every element qualifies.
    pub fn against<F, V>(mut self, candidates: F) -> Self
    where
        F: Fn(&Value) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.candidates = Arc::new(move |x: &Value| -> Value { candidates(x).into() });
        self
    }

    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish with the membership test and build the iterator.
    pub fn we_have<P, T>(self, membership: P) -> Result<StatefulIterator<Value>, IterError>
    where
        P: Fn(&Value, &Value) -> T + Send + Sync + 'static,
        T: Into<Truth>,
    {
        self.config.validate()?;

        let mut snapshot = Snapshot::default();
        snapshot.put_reserved(INDEX_KEY, 0usize);
        snapshot.put_reserved(SOURCE_KEY, Value::Seq(self.source));
        snapshot.put_reserved(ELEMENT_KEY, Value::Missing);

        let candidates = self.candidates;
        let qualifies = move |x: &Value| -> Truth {
            match candidates(x) {
                Value::Seq(ys) => {
                    Truth::all(ys.iter().map(|y| -> Truth { membership(x, y).into() }))
                }
                Value::Missing => Truth::Undefined,
                y => membership(x, &y).into(),
            }
        };

        Ok(StatefulIterator::from_parts(
            bounded(move |snapshot: Snapshot| advance(snapshot, &qualifies)),
            snapshot,
            selector(|s: &Snapshot| s[ELEMENT_KEY].clone()),
            self.config,
        ))
    }
}

/// Scan forward from `.i` to the next qualifying element.
fn advance(
    mut snapshot: Snapshot,
    qualifies: &impl Fn(&Value) -> Truth,
) -> Result<StepOutcome, StepFailure> {
    let start = snapshot[INDEX_KEY]
        .as_index()
        .ok_or_else(|| ComprehensionError::CorruptIndex {
            found: snapshot[INDEX_KEY].to_string(),
        })?;
    let source = snapshot[SOURCE_KEY]
        .as_seq()
        .ok_or_else(|| ComprehensionError::CorruptSource {
            found: snapshot[SOURCE_KEY].kind().to_string(),
        })?;

    let mut found = None;
    for (position, element) in source.iter().enumerate().skip(start) {
        match qualifies(element) {
            Truth::True => {
                found = Some((position, element.clone()));
                break;
            }
            Truth::False => {}
            Truth::Undefined => {
                return Err(ComprehensionError::MembershipUndefined {
                    element: element.clone(),
                    position,
                }
                .into())
            }
        }
    }

    match found {
        Some((position, element)) => {
            trace!(position, skipped = position - start, "comprehension element found");
            snapshot.put_reserved(INDEX_KEY, position + 1);
            snapshot.put_reserved(ELEMENT_KEY, element);
            Ok(StepOutcome::Advanced(snapshot))
        }
        None => Ok(StepOutcome::Exhausted),
    }
}

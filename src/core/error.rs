//! Error types for iterators, snapshots and configuration.

use thiserror::Error;

/// Error raised by a user step procedure.
///
/// Step closures can use `?` on any error type that is `Send + Sync`,
/// including [`IterError`] returned by `Snapshot::set`.
pub type StepFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by iterator operations.
///
/// Every error reaches the immediate caller. A failed step leaves the
/// iterator's snapshot, counter and finished flag untouched.
#[derive(Debug, Error)]
pub enum IterError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Iterator finished after {iterations} iterations. Clone it to continue from its state")]
    Exhausted { iterations: usize },

    #[error("Unknown snapshot key(s): {}", .keys.join(", "))]
    UnknownKey { keys: Vec<String> },

    #[error("Condition evaluated to an undefined result at iteration {iteration}")]
    UndefinedCondition { iteration: usize },

    #[error("Step procedure failed at iteration {iteration}: {source}")]
    StepEvaluation {
        iteration: usize,
        #[source]
        source: StepFailure,
    },

    #[error(
        "Step procedure changed the snapshot keys at iteration {iteration} (added: [{}], removed: [{}])",
        .added.join(", "),
        .removed.join(", ")
    )]
    KeySetChanged {
        iteration: usize,
        added: Vec<String>,
        removed: Vec<String>,
    },
}

/// A single problem found while validating an initial state.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SnapshotProblem {
    #[error("key '{0}' is reserved (keys starting with '.' are maintained by the iterator)")]
    ReservedKey(String),

    #[error("empty key")]
    EmptyKey,

    #[error("key '{0}' appears more than once")]
    DuplicateKey(String),

    #[error("key '{key}' holds an unsupported value ({found})")]
    UnsupportedValue { key: String, found: String },
}

/// A single problem found while validating a collector configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CollectorProblem {
    #[error("initial capacity must be at least 1")]
    ZeroCapacity,

    #[error("growth factor must be at least 2 (got {0})")]
    GrowthFactorTooSmall(usize),

    #[error("initial capacity must be at most {max} (got {found})")]
    CapacityTooLarge { found: usize, max: usize },

    #[error("growth factor must be at most {max} (got {found})")]
    GrowthFactorTooLarge { found: usize, max: usize },
}

/// Malformed constructor arguments.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Initial state is not a key/value mapping (found {found})")]
    NotAMapping { found: String },

    #[error("Invalid initial state: {}", join(.problems))]
    InvalidSnapshot { problems: Vec<SnapshotProblem> },

    #[error("Reserved key '{key}' cannot be overridden")]
    ReservedOverride { key: String },

    #[error("Step procedure not specified. Call .step(f) or .step_with_outcome(f) before .build()")]
    MissingStep,

    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Yield selector not specified. Call .yield_with(f) before .build()")]
    MissingYield,

    #[error("Invalid collector configuration: {}", join(.problems))]
    InvalidCollector { problems: Vec<CollectorProblem> },

    #[error("Configuration could not be parsed: {0}")]
    Unreadable(String),
}

fn join<T: ToString>(problems: &[T]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//! Core value, state and predicate types.
//!
//! This module contains the pure building blocks every iterator is made of:
//! - [`Value`] and [`Truth`] for dynamically typed state and three-valued logic
//! - [`Snapshot`], the fixed-key state record
//! - [`Condition`], the continuation predicate
//! - [`IterError`] and friends, the error taxonomy
//!
//! Nothing in this module mutates shared state; snapshots are plain values
//! that are copied whenever they cross an iterator boundary.

mod condition;
mod error;
mod snapshot;
mod value;

pub use condition::{Condition, Predicate};
pub use error::{CollectorProblem, ConfigError, IterError, SnapshotProblem, StepFailure};
pub use snapshot::{
    IntoSnapshot, Snapshot, ELEMENT_KEY, FINISHED_KEY, INDEX_KEY, ITER_KEY, RESERVED_PREFIX,
    SOURCE_KEY,
};
pub use value::{Truth, Value};

//! Stepwise: resumable stateful generators
//!
//! A [`StatefulIterator`] repeatedly applies a step procedure to an explicit
//! state snapshot and emits one value per step. State survives between
//! calls, so every call resumes exactly where the previous one stopped.
//! Step procedures are pure functions from snapshot to snapshot; the
//! iterator commits a new snapshot only once a step has fully succeeded.
//!
//! # Core Concepts
//!
//! - **Snapshot**: a fixed set of named [`Value`]s plus the reserved
//!   `.iter` and `.finished` keys
//! - **Step procedure**: computes the next snapshot, optionally reporting
//!   exhaustion through [`StepOutcome`]
//! - **Bulk production**: `yield_more` / `yield_while` collect into a
//!   geometrically growing buffer
//! - **Predicates**: three-valued conditions, where an undefined answer is
//!   an error rather than a guess
//! - **Cloning**: `clone_with` forks an independent iterator with some
//!   values replaced
//!
//! # Example
//!
//! ```rust
//! use stepwise::{Snapshot, StatefulIterator, Value};
//!
//! let mut collatz = StatefulIterator::new(
//!     |mut s: Snapshot| {
//!         let n = &s["n"];
//!         let next = if (n % 2).eq_to(0).is_true() { n / 2 } else { n * 3 + 1 };
//!         s.set("n", next)?;
//!         Ok(s)
//!     },
//!     [("n", 50)],
//!     |s: &Snapshot| s["n"].clone(),
//! )
//! .unwrap();
//!
//! let head = collatz.yield_more(5).unwrap();
//! assert_eq!(head.values(), &[
//!     Value::Int(25),
//!     Value::Int(76),
//!     Value::Int(38),
//!     Value::Int(19),
//!     Value::Int(58),
//! ]);
//!
//! let rest = collatz.yield_while(|s: &Snapshot| s["n"].ne_to(1)).unwrap();
//! assert_eq!(rest.last(), Some(&Value::Int(1)));
//! assert_eq!(collatz.iteration(), 24);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod collect;
pub mod comprehension;
pub mod core;
pub mod iterator;

// Re-export commonly used types
pub use builder::IteratorBuilder;
pub use checkpoint::{Checkpoint, CheckpointError};
pub use collect::{CollectorConfig, EndReason, Moved, Yielded};
pub use comprehension::{that_for_all, ComprehensionError, ForAll};
pub use core::{
    Condition, ConfigError, IntoSnapshot, IterError, Predicate, Snapshot, StepFailure, Truth,
    Value,
};
pub use iterator::{StatefulIterator, StepOutcome};

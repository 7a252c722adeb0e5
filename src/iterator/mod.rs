//! Stateful iterators and step evaluation.
//!
//! # Key Concepts
//!
//! - **Step procedure**: a closure from the current snapshot to the next one.
//!   Bounded procedures return a [`StepOutcome`] and may report exhaustion.
//! - **Yield selector**: a closure extracting the emitted value from the
//!   snapshot produced by a step.
//! - **Atomic steps**: the procedure works on an owned copy, so a failing step
//!   never leaves a half-updated snapshot behind.

mod stateful;
mod step;

pub use stateful::StatefulIterator;
pub use step::{StepOutcome, StepProcedure, YieldSelector};

pub(crate) use step::{bounded, selector, unbounded};

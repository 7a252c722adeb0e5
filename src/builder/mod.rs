//! Builder API for ergonomic iterator construction.
//!
//! This module provides a fluent builder and the `snapshot!` macro for
//! creating iterators without spelling out every conversion by hand.

pub mod iterator;
pub mod macros;

pub use iterator::IteratorBuilder;

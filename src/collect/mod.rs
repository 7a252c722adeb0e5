//! Amortized bulk collection: `yield_more`, `yield_while` and their silent
//! `move_*` variants.
//!
//! Bulk operations are plain loops over single-step advancement. Values are
//! appended to a [`GrowthBuffer`] whose capacity grows geometrically, and
//! the result is trimmed to the exact count before it is returned.

mod buffer;
mod collector;
mod config;

pub use buffer::GrowthBuffer;
pub use collector::{EndReason, Moved, Yielded};
pub use config::{
    CollectorConfig, DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_CAPACITY, MAX_GROWTH_FACTOR,
    MAX_INITIAL_CAPACITY,
};

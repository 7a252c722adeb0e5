//! Geometric growth buffer for bulk collection.

use tracing::trace;

/// Append-only buffer whose capacity is multiplied whenever it fills up.
///
/// Growing geometrically keeps the total copying cost linear in the number
/// of elements, so each append is amortized O(1). [`GrowthBuffer::finish`]
/// trims the spare capacity before the values are handed out.
#[derive(Debug)]
pub struct GrowthBuffer<T> {
    items: Vec<T>,
    growth_factor: usize,
    growths: usize,
}

impl<T> GrowthBuffer<T> {
    /// Start with room for `initial_capacity` items. An allocation that
    /// cannot be satisfied leaves the buffer empty; it then grows on demand.
    pub fn new(initial_capacity: usize, growth_factor: usize) -> Self {
        let mut items = Vec::new();
        if let Err(e) = items.try_reserve_exact(initial_capacity) {
            trace!(requested = initial_capacity, error = %e, "initial reservation refused");
        }
        Self {
            items,
            growth_factor: growth_factor.max(2),
            growths: 0,
        }
    }

    /// Append `item`, growing by `growth_factor` when full. If the
    /// geometric target cannot be reserved, room for one more item is requested.
    pub fn push(&mut self, item: T) {
        let capacity = self.items.capacity();
        if self.items.len() == capacity {
            let target = capacity.saturating_mul(self.growth_factor).max(1);
            if self.items.try_reserve_exact(target - self.items.len()).is_err() {
                self.items.reserve(1);
            }
            self.growths += 1;
            trace!(
                from = capacity,
                to = self.items.capacity(),
                "collector buffer grown"
            );
        }
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Number of times the buffer had to grow.
    pub fn growths(&self) -> usize {
        self.growths
    }

    /// Collected items, trimmed to their exact count.
    pub fn finish(mut self) -> Vec<T> {
        self.items.shrink_to_fit();
        self.items
    }
}

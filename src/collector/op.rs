//! Update requests sent from producers to the collection loop.

use std::sync::atomic::{AtomicI64, Ordering};

/// One requested mutation of a counter.
///
/// Produced by [`Collector::inc`](crate::Collector::inc) and
/// [`Collector::set`](crate::Collector::set), consumed exactly once by the
/// loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    /// Add `delta` to the current value.
    Inc { name: String, delta: i64 },
    /// Replace the current value.
    Set { name: String, value: i64 },
}

impl Op {
    /// Returns the name of the targeted counter.
    pub(crate) fn name(&self) -> &str {
        match self {
            Op::Inc { name, .. } | Op::Set { name, .. } => name,
        }
    }

    /// Applies the operation to `cell` and returns the resulting value.
    ///
    /// Only the loop writes counter cells, so `Relaxed` is enough: readers
    /// need atomicity, not ordering with the file writes.
    pub(crate) fn apply(&self, cell: &AtomicI64) -> i64 {
        match *self {
            Op::Inc { delta, .. } => cell.fetch_add(delta, Ordering::Relaxed).wrapping_add(delta),
            Op::Set { value, .. } => {
                cell.store(value, Ordering::Relaxed);
                value
            }
        }
    }
}

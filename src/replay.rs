//! In-memory replay event model.
//!
//! A [`ReplayEvent`] is the normalized, immutable unit the pipeline consumes
//! in order; a [`Replay`] is the vector of them produced in a single pass
//! from the external CSV source (see `io.rs`) and consumed exactly once.
//! Capacity is bounded by the configured `max_msgs` to preclude unbounded
//! growth while loading.

use serde::{Deserialize, Serialize};

/// Kind of replay event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A new resting order arrives.
    Add,
    /// An existing resting order is withdrawn.
    Cancel,
    /// A resting order is executed (hit/lifted).
    Exec,
}

/// One normalized, immutable replay row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReplayEvent {
    /// Nanoseconds since the start of the replay.
    pub ts_ns: u64,
    /// Add / Cancel / Exec.
    pub kind: EventKind,
    /// Synthetic order id. `0` is reserved — see `book.rs`.
    pub order_id: u32,
    /// True for buy, false for sell.
    pub is_buy: bool,
    /// Price in integer ticks.
    pub px: i32,
    /// Quantity, always > 0 for Add/Exec rows (Cancel rows carry `0`).
    pub qty: i32,
}

/// An in-memory, single-pass-consumed sequence of replay events.
#[derive(Debug, Default)]
pub struct Replay {
    events: Vec<ReplayEvent>,
}

impl Replay {
    /// Wrap an already-parsed, ordered vector of events.
    pub fn new(events: Vec<ReplayEvent>) -> Self {
        Self { events }
    }

    /// Number of events in the replay.
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the replay is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate events in their defined total order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, ReplayEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a Replay {
    type Item = &'a ReplayEvent;
    type IntoIter = std::slice::Iter<'a, ReplayEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

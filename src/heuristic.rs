//! Queue-reactive heuristic market-maker.
//!
//! A tiny base-spread-plus-inventory-skew quoter, stateful only across
//! `recent_execs`/`recent_cancels` counters (saturating at `window = 128`)
//! and `last_mid` — the book itself carries no memory of quoting history.

use crate::book::OrderBook;

/// Candidate two-sided quote with quantities, produced by either quoter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Bid price in ticks.
    pub bid_px: i32,
    /// Ask price in ticks.
    pub ask_px: i32,
    /// Bid quantity.
    pub bid_qty: i32,
    /// Ask quantity.
    pub ask_qty: i32,
}

const WINDOW: u32 = 128;

/// Queue-reactive heuristic quoter with bounded execution/cancellation
/// counters and inventory-proportional spread widening and skew.
pub struct Heuristic {
    last_mid: i32,
    recent_execs: u32,
    recent_cancels: u32,
}

impl Default for Heuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic {
    /// A fresh quoter: zeroed counters, `last_mid = 0`.
    pub fn new() -> Self {
        Self {
            last_mid: 0,
            recent_execs: 0,
            recent_cancels: 0,
        }
    }

    /// Notify that an execution occurred. Saturates at `window = 128`.
    #[inline]
    pub fn on_exec(&mut self) {
        if self.recent_execs < WINDOW {
            self.recent_execs += 1;
        }
    }

    /// Notify that a cancel occurred. Saturates at `window = 128`.
    #[inline]
    pub fn on_cancel(&mut self) {
        if self.recent_cancels < WINDOW {
            self.recent_cancels += 1;
        }
    }

    /// Decay both counters by one, if non-zero.
    #[inline]
    pub fn decay(&mut self) {
        if self.recent_execs > 0 {
            self.recent_execs -= 1;
        }
        if self.recent_cancels > 0 {
            self.recent_cancels -= 1;
        }
    }

    /// Produce a candidate quote for the current book state and inventory.
    ///
    /// `q_alpha` widens the base spread proportionally to `|inv|`; `skew`
    /// scales the inventory-proportional price skew. Uses `last_mid` (or
    /// `0` on the very first call) when the book is one-sided.
    pub fn quote(&mut self, book: &OrderBook, q_alpha: f64, skew: f64, inv: i32, inv_cap: i32) -> Quote {
        let mid = match (book.best_bid(), book.best_ask()) {
            (Some(bb), Some(aa)) => (bb + aa) / 2,
            _ => self.last_mid,
        };
        self.last_mid = mid;

        let mut base = 2 + if self.recent_execs > self.recent_cancels { 2 } else { 0 };
        base += (q_alpha * inv.unsigned_abs() as f64) as i32;

        let skew_px = (skew * inv as f64 / inv_cap.max(1) as f64) as i32;

        Quote {
            bid_px: mid - base - skew_px,
            ask_px: mid + base - skew_px,
            bid_qty: 1,
            ask_qty: 1,
        }
    }
}

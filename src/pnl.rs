//! Inventory and PnL tracking, updated only on executions.
//!
//! Kept as its own small type rather than orchestrator-local state, so
//! `pipeline.rs` stays focused on stage sequencing.

/// Running inventory and mark-to-trade PnL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnlState {
    /// Signed inventory (positive = long).
    pub inv: i32,
    /// Realized PnL from executions.
    pub pnl: f64,
}

impl PnlState {
    /// Apply one execution: `inv += is_buy ? qty : -qty`; `pnl += (is_buy ?
    /// -1 : 1) * px * qty`. The pipeline calls this with the *inverted*
    /// side of an `Exec` event — the event's side is the passive side
    /// being hit, so the fill the passive order receives is on the
    /// opposite side of the book.
    #[inline]
    pub fn on_exec(&mut self, px: i32, qty: i32, is_buy: bool) {
        self.inv += if is_buy { qty } else { -qty };
        let sign = if is_buy { -1.0 } else { 1.0 };
        self.pnl += sign * px as f64 * qty as f64;
    }
}

//! Risk gate: inventory / notional / throttle / kill-switch.
//!
//! Gates a candidate quote against inventory imbalance and a per-millisecond
//! send throttle. The notional cap is accepted into the configuration
//! surface but intentionally unenforced — plumbed-but-not-wired until a
//! concrete notional-limiting policy is decided.

use crate::heuristic::Quote;

/// Risk gate state, mutated only by the orchestrator on the risk stage of
/// each event.
pub struct RiskGate {
    inv_cap: i32,
    #[allow(dead_code)] // accepted, not enforced — see module docs
    notional_cap: f64,
    throttle_per_ms: u32,
    cur_ms: u64,
    sent_in_ms: u32,
    killed: bool,
}

impl RiskGate {
    /// Construct a gate with the given inventory cap, notional cap
    /// (unenforced), and per-millisecond send throttle.
    pub fn new(inv_cap: i32, notional_cap: f64, throttle_per_ms: u32) -> Self {
        Self {
            inv_cap,
            notional_cap,
            throttle_per_ms,
            cur_ms: 0,
            sent_in_ms: 0,
            killed: false,
        }
    }

    /// One-way kill switch: once tripped, every subsequent `allow` call
    /// denies, but processing otherwise continues — killing the gate does
    /// not halt the pipeline.
    #[inline]
    pub fn kill(&mut self) {
        self.killed = true;
    }

    /// Whether the kill switch has been tripped.
    #[inline]
    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Gate `quote` given current inventory `inv` and the event's
    /// `ts_ns`. Returns `true` if the quote may be emitted.
    pub fn allow(&mut self, quote: &Quote, inv: i32, ts_ns: u64) -> bool {
        if self.killed {
            return false;
        }

        if inv > self.inv_cap && quote.bid_qty > 0 {
            return false; // would worsen long imbalance
        }
        if -inv > self.inv_cap && quote.ask_qty > 0 {
            return false; // would worsen short imbalance
        }

        let ms = ts_ns / 1_000_000;
        if ms != self.cur_ms {
            self.cur_ms = ms;
            self.sent_in_ms = 0;
        }
        if self.sent_in_ms >= self.throttle_per_ms {
            return false;
        }
        self.sent_in_ms += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn quote() -> Quote {
        Quote { bid_px: 99, ask_px: 101, bid_qty: 1, ask_qty: 1 }
    }

    #[test]
    fn throttle_admits_up_to_limit_then_denies_within_the_same_ms() {
        let mut rg = RiskGate::new(100, 1e12, 3);
        let q = quote();
        assert!(rg.allow(&q, 0, 1_000_000));
        assert!(rg.allow(&q, 0, 1_000_100));
        assert!(rg.allow(&q, 0, 1_000_200));
        assert!(!rg.allow(&q, 0, 1_000_300));
    }

    #[test]
    fn throttle_resets_on_new_millisecond() {
        let mut rg = RiskGate::new(100, 1e12, 1);
        let q = quote();
        assert!(rg.allow(&q, 0, 1_000_000));
        assert!(!rg.allow(&q, 0, 1_000_500));
        assert!(rg.allow(&q, 0, 2_000_000));
    }

    #[test]
    fn long_inventory_beyond_cap_blocks_bid_leg() {
        let mut rg = RiskGate::new(5, 1e9, 1000);
        let q = quote();
        assert!(!rg.allow(&q, 6, 2_000_000));
    }

    #[test]
    fn short_inventory_beyond_cap_blocks_ask_leg() {
        let mut rg = RiskGate::new(5, 1e9, 1000);
        let q = quote();
        assert!(!rg.allow(&q, -6, 2_000_000));
    }

    #[test]
    fn kill_switch_denies_everything_thereafter() {
        let mut rg = RiskGate::new(100, 1e12, 1000);
        let q = quote();
        assert!(rg.allow(&q, 0, 1_000_000));
        rg.kill();
        assert!(!rg.allow(&q, 0, 1_000_001));
        assert!(!rg.allow(&q, 0, 5_000_000));
    }

    #[test]
    fn zero_quantity_leg_is_not_blocked_by_inventory_cap() {
        let mut rg = RiskGate::new(5, 1e9, 1000);
        let one_sided = Quote { bid_px: 99, ask_px: 101, bid_qty: 0, ask_qty: 1 };
        // inv beyond cap but the quote has no bid leg to worsen it
        assert!(rg.allow(&one_sided, 6, 2_000_000));
    }

    #[rstest]
    #[case(5, 5, true)] // exactly at cap: not beyond it, still admitted
    #[case(5, 6, false)] // one past cap: blocked
    #[case(5, -5, true)] // symmetric case on the short side, still within cap
    #[case(5, -6, false)] // one past cap on the short side: blocked
    #[case(0, 1, false)] // zero cap: any imbalance at all blocks
    fn inventory_cap_threshold_is_exclusive(#[case] inv_cap: i32, #[case] inv: i32, #[case] expect_admitted: bool) {
        let mut rg = RiskGate::new(inv_cap, 1e12, 1000);
        let q = quote();
        assert_eq!(rg.allow(&q, inv, 1_000_000), expect_admitted);
    }
}

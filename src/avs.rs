//! Avellaneda-Stoikov closed-form quoter.
//!
//! Computes a reservation price and half-spread from the latest mid,
//! current inventory, an OU parameter estimate, and the strategy's risk
//! aversion / order-arrival parameters, then floors both legs to integer
//! ticks.

use crate::ou::OuParams;

/// Avellaneda-Stoikov strategy parameters.
#[derive(Debug, Clone, Copy)]
pub struct AvsParams {
    /// Risk aversion.
    pub gamma: f64,
    /// Order arrival intensity decay.
    pub k: f64,
    /// Remaining horizon, in seconds.
    pub horizon_s: f64,
}

/// A two-sided quote in integer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePx {
    /// Bid price in ticks.
    pub bid_px: i32,
    /// Ask price in ticks.
    pub ask_px: i32,
}

/// Compute the Avellaneda-Stoikov quote for mid `s`, inventory `q`, given OU
/// and strategy parameters.
///
/// ```text
/// sig2T = sigma^2 * horizon_s
/// r     = s - q * gamma * sig2T                         (reservation price)
/// delta = (1/k) * ln(1 + gamma/k) + 0.5 * gamma * sig2T  (half-spread)
/// bid   = floor(r - delta)
/// ask   = floor(r + delta)
/// ```
pub fn avellaneda_stoikov(s: f64, q: i32, ou: &OuParams, avs: &AvsParams) -> QuotePx {
    let sig2_t = ou.sigma * ou.sigma * avs.horizon_s;
    let r = s - (q as f64) * avs.gamma * sig2_t;
    let delta = (1.0 / avs.k) * (1.0 + avs.gamma / avs.k).ln() + 0.5 * avs.gamma * sig2_t;
    QuotePx {
        bid_px: (r - delta).floor() as i32,
        ask_px: (r + delta).floor() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ou(sigma: f64) -> OuParams {
        OuParams { kappa: 1.0, theta: 100.0, sigma }
    }

    #[test]
    fn wider_sigma_yields_non_decreasing_integer_spread() {
        let avs = AvsParams { gamma: 1e-3, k: 0.05, horizon_s: 200.0 };
        let q_lo = avellaneda_stoikov(100.0, 0, &ou(2.0), &avs);
        let q_hi = avellaneda_stoikov(100.0, 0, &ou(4.0), &avs);
        let spread_lo = q_lo.ask_px - q_lo.bid_px;
        let spread_hi = q_hi.ask_px - q_hi.bid_px;
        assert!(spread_hi > spread_lo, "lo={spread_lo} hi={spread_hi}");
    }

    #[test]
    fn positive_inventory_shifts_both_legs_down() {
        let avs = AvsParams { gamma: 1e-3, k: 0.05, horizon_s: 200.0 };
        let flat = avellaneda_stoikov(100.0, 0, &ou(2.0), &avs);
        let long = avellaneda_stoikov(100.0, 10, &ou(2.0), &avs);
        assert!(long.bid_px <= flat.bid_px);
        assert!(long.ask_px <= flat.ask_px);
    }

    #[test]
    fn negative_inventory_shifts_both_legs_up() {
        let avs = AvsParams { gamma: 1e-3, k: 0.05, horizon_s: 200.0 };
        let flat = avellaneda_stoikov(100.0, 0, &ou(2.0), &avs);
        let short = avellaneda_stoikov(100.0, -10, &ou(2.0), &avs);
        assert!(short.bid_px >= flat.bid_px);
        assert!(short.ask_px >= flat.ask_px);
    }

    #[test]
    fn bid_strictly_below_ask_for_reasonable_params() {
        let avs = AvsParams { gamma: 1e-6, k: 0.1, horizon_s: 10.0 };
        let q = avellaneda_stoikov(100.0, 0, &ou(2.0), &avs);
        assert!(q.bid_px <= q.ask_px);
    }
}

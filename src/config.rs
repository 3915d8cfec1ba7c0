//! Backtest configuration surface.
//!
//! `Config` is the library-facing settings struct; `main.rs` builds one from
//! a `clap::Parser` CLI struct. Kept separate from the CLI type so the
//! library can be driven programmatically (e.g. from tests) without going
//! through argument parsing.

use std::path::PathBuf;

/// Which quoter the pipeline's signal stage invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoterMode {
    /// Queue-reactive heuristic quoter.
    Heuristic,
    /// Avellaneda-Stoikov analytic quoter, with OU-based fallback to
    /// heuristic until enough mid samples have accumulated or the OU fit
    /// degenerates.
    Avs,
}

impl std::str::FromStr for QuoterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(QuoterMode::Heuristic),
            "avs" => Ok(QuoterMode::Avs),
            other => Err(format!("unknown mode '{other}' (expected heuristic|avs)")),
        }
    }
}

/// Full backtest configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the replay input CSV (required).
    pub replay: PathBuf,
    /// Path to the admitted-quote results CSV.
    pub results: PathBuf,
    /// Optional path for the per-stage latency dump CSV.
    pub latency: Option<PathBuf>,
    /// Optional path for the per-stage histogram dump CSV.
    pub histo: Option<PathBuf>,
    /// Best-effort core to pin the process to.
    pub pinner: Option<usize>,
    /// Number of leading events excluded from timing/allocation constraints.
    pub warmup: usize,
    /// Hard cap on replay rows loaded.
    pub max_msgs: usize,
    /// Inventory cap passed to the risk gate.
    pub inv_cap: i32,
    /// Notional cap — plumbed into the risk gate, currently unenforced.
    pub notional_cap: f64,
    /// Per-millisecond send throttle.
    pub throttle: u32,
    /// Quoter mode.
    pub mode: QuoterMode,
    /// Avellaneda-Stoikov risk aversion.
    pub avs_gamma: f64,
    /// Avellaneda-Stoikov order-arrival decay.
    pub avs_k: f64,
    /// Avellaneda-Stoikov horizon, in seconds.
    pub avs_horizon_s: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replay: PathBuf::new(),
            results: PathBuf::from("out.csv"),
            latency: None,
            histo: None,
            pinner: None,
            warmup: 200,
            max_msgs: 1_000_000,
            inv_cap: 100,
            notional_cap: 1e12,
            throttle: 200,
            mode: QuoterMode::Heuristic,
            avs_gamma: 1e-6,
            avs_k: 0.1,
            avs_horizon_s: 10.0,
        }
    }
}

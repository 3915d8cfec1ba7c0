//! `mm-backtest` — deterministic backtesting CLI for a queue-reactive /
//! Avellaneda-Stoikov market maker.
//!
//! Thin binary: parses arguments, installs the allocation tripwire as the
//! process-wide global allocator, loads the replay, drives
//! [`mm_backtest::pipeline::run`] to completion, and writes the optional
//! latency/histogram dumps. Exit codes: `0` success, `2` usage, `3` replay
//! load failure, `4` output sink failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mm_backtest::alloc_guard::GuardedAlloc;
use mm_backtest::config::{Config, QuoterMode};
use mm_backtest::error::BacktestError;
use mm_backtest::{affinity, io, pipeline};

#[global_allocator]
static ALLOCATOR: GuardedAlloc = GuardedAlloc;

/// Deterministic backtest harness for a replayed synthetic ITCH feed.
#[derive(Parser, Debug)]
#[command(name = "mm-backtest", about = "Deterministic market-making backtest harness")]
struct Cli {
    /// Path to the replay input CSV.
    #[arg(long)]
    replay: PathBuf,

    /// Path to the admitted-quote results CSV.
    #[arg(long, default_value = "out.csv")]
    results: PathBuf,

    /// Optional path for the per-stage latency dump CSV.
    #[arg(long)]
    latency: Option<PathBuf>,

    /// Optional path for the per-stage histogram dump CSV.
    #[arg(long)]
    histo: Option<PathBuf>,

    /// Best-effort core to pin this process to.
    #[arg(long)]
    pinner: Option<usize>,

    /// Number of leading events excluded from timing/allocation constraints.
    #[arg(long, default_value_t = 200)]
    warmup: usize,

    /// Hard cap on replay rows loaded.
    #[arg(long = "max-msgs", default_value_t = 1_000_000)]
    max_msgs: usize,

    /// Inventory cap passed to the risk gate.
    #[arg(long = "inv-cap", default_value_t = 100)]
    inv_cap: i32,

    /// Per-millisecond send throttle.
    #[arg(long, default_value_t = 200)]
    throttle: u32,

    /// Quoter mode: `heuristic` or `avs`.
    #[arg(long, default_value = "heuristic")]
    mode: String,

    /// Avellaneda-Stoikov risk aversion.
    #[arg(long = "avs-gamma", default_value_t = 1e-6)]
    avs_gamma: f64,

    /// Avellaneda-Stoikov order-arrival decay.
    #[arg(long = "avs-k", default_value_t = 0.1)]
    avs_k: f64,

    /// Avellaneda-Stoikov horizon, in seconds.
    #[arg(long = "avs-horizon", default_value_t = 10.0)]
    avs_horizon: f64,
}

impl Cli {
    fn into_config(self) -> Result<Config, BacktestError> {
        let mode = self
            .mode
            .parse::<QuoterMode>()
            .map_err(BacktestError::Config)?;
        Ok(Config {
            replay: self.replay,
            results: self.results,
            latency: self.latency,
            histo: self.histo,
            pinner: self.pinner,
            warmup: self.warmup,
            max_msgs: self.max_msgs,
            inv_cap: self.inv_cap,
            notional_cap: Config::default().notional_cap,
            throttle: self.throttle,
            mode,
            avs_gamma: self.avs_gamma,
            avs_k: self.avs_k,
            avs_horizon_s: self.avs_horizon,
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match Cli::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    if let Some(core) = cfg.pinner {
        affinity::pin_to_core(core);
    }

    let replay = match io::load_replay(&cfg.replay, cfg.max_msgs) {
        Ok(r) => r,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(3);
        }
    };
    info!(events = replay.len(), warmup = cfg.warmup, mode = ?cfg.mode, "loaded replay");

    let mut writer = match io::ResultsWriter::create(&cfg.results) {
        Ok(w) => w,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(4);
        }
    };

    let report = match pipeline::run(&cfg, &replay, &mut writer) {
        Ok(r) => r,
        Err(e) => {
            error!("results write error: {e}");
            return ExitCode::from(4);
        }
    };
    if let Err(e) = writer.flush() {
        error!("results flush error: {e}");
        return ExitCode::from(4);
    }

    if let Some(path) = &cfg.latency {
        if let Err(e) = io::write_latency_csv(path, &report.timers, cfg.warmup, report.processed) {
            error!("{e}");
            return ExitCode::from(4);
        }
    }
    if let Some(path) = &cfg.histo {
        let hist = pipeline::build_histograms(&report, cfg.warmup);
        if let Err(e) = io::write_histogram_csv(path, &hist) {
            error!("{e}");
            return ExitCode::from(4);
        }
    }

    let summary = mm_backtest::latency::summarize(report.timers.e2e.as_slice(), cfg.warmup, report.processed);
    info!(
        p50_us = summary.p50_us,
        p99_us = summary.p99_us,
        inv = report.inv,
        pnl = report.pnl,
        "run complete"
    );
    if report.processed < replay.len() {
        warn!(processed = report.processed, total = replay.len(), "fewer events processed than loaded");
    }

    ExitCode::SUCCESS
}

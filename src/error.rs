//! Crate-wide error taxonomy.
//!
//! The hot path never returns `Result` — it communicates failure through
//! booleans or sentinel values, keeping error propagation off the
//! measured path entirely. `BacktestError` exists only at the I/O and
//! configuration boundary: replay loading, output sink creation, and CLI
//! argument validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced at the boundary of the backtest harness.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Missing required flag or unrecognized flag (exit code 2).
    #[error("configuration error: {0}")]
    Config(String),

    /// Replay file could not be opened or a row failed to parse (exit code 3).
    #[error("replay load error: {0}")]
    ReplayLoad(String),

    /// An output sink (results, latency, or histogram CSV) could not be opened (exit code 4).
    #[error("failed to open output file {path:?}: {source}")]
    OutputOpen {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

// Pool, level-array, and fixed-map exhaustion are fatal assertions on the hot
// path rather than recoverable `Result`s — see the `assert!`s in `book.rs`
// and `fixed_map.rs`. Capacities are dimensioned above any realistic replay
// size, so these should never fire outside of a sizing bug.

/// Convenience alias used throughout the I/O and configuration layers.
pub type Result<T> = std::result::Result<T, BacktestError>;

//! Stage sample buffers, scoped timers, and percentile summarization.
//!
//! Each pipeline stage owns a pre-sized buffer of per-event durations in
//! nanoseconds. [`ScopedTimer`] records a monotonic timestamp at
//! construction and writes the elapsed duration to its buffer at scope
//! exit; writes past the buffer's capacity are silently dropped rather than
//! growing the backing storage, preserving the no-allocation invariant once
//! the tripwire (`alloc_guard`) is armed.

use std::time::Instant;

/// A pre-sized, append-only buffer of nanosecond samples.
///
/// Capacity is fixed at construction (dimensioned to the replay length by
/// the orchestrator). `push` beyond capacity is a silent no-op — the
/// insertion counter still advances so callers can distinguish "recorded"
/// from "dropped" counts if needed, but no reallocation ever happens.
pub struct SampleBuffer {
    ns: Vec<u64>,
    len: usize,
}

impl SampleBuffer {
    /// Allocate a buffer for up to `capacity` samples. This allocation
    /// happens once, before warmup completes, and is the buffer's only
    /// allocation for its entire lifetime.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ns: vec![0u64; capacity],
            len: 0,
        }
    }

    /// Append one sample, dropping it silently if the buffer is full.
    #[inline]
    pub fn push(&mut self, value_ns: u64) {
        if self.len < self.ns.len() {
            self.ns[self.len] = value_ns;
            self.len += 1;
        }
    }

    /// Number of samples actually recorded (<= capacity).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no samples have been recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer capacity (the pre-sized upper bound).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ns.len()
    }

    /// Recorded samples in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.ns[..self.len]
    }
}

/// RAII scoped timer: records `Instant::now()` at construction, writes the
/// elapsed nanoseconds to `buf` when dropped.
pub struct ScopedTimer<'a> {
    buf: &'a mut SampleBuffer,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    /// Begin timing a scope whose duration will be appended to `buf`.
    #[inline]
    pub fn start(buf: &'a mut SampleBuffer) -> Self {
        Self {
            buf,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    #[inline]
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_nanos() as u64;
        self.buf.push(elapsed);
    }
}

/// Canonical percentiles reported by the harness.
pub const CANONICAL_QUANTILES: [f64; 4] = [0.5, 0.9, 0.99, 0.999];

/// Select the `q`-quantile (in microseconds) of `ns[warmup..min(total,
/// len)]` using a partial selection (average-linear, i.e. `nth_element`
/// style). Returns `0.0` if the windowed slice has fewer than two samples.
pub fn quantile(ns: &[u64], warmup: usize, total: usize, q: f64) -> f64 {
    let start = warmup.min(ns.len());
    let end = total.min(ns.len());
    if end <= start + 1 {
        return 0.0;
    }
    let mut window: Vec<u64> = ns[start..end].to_vec();
    let n = window.len();
    let k = (((n - 1) as f64) * q).floor() as usize;
    let (_, kth, _) = window.select_nth_unstable(k);
    *kth as f64 / 1000.0
}

/// Summary of the canonical percentiles for one stage, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    /// 50th percentile latency in microseconds.
    pub p50_us: f64,
    /// 90th percentile latency in microseconds.
    pub p90_us: f64,
    /// 99th percentile latency in microseconds.
    pub p99_us: f64,
    /// 99.9th percentile latency in microseconds.
    pub p999_us: f64,
}

/// Summarize a stage's post-warmup samples into the canonical percentiles.
pub fn summarize(ns: &[u64], warmup: usize, total: usize) -> Summary {
    Summary {
        p50_us: quantile(ns, warmup, total, 0.50),
        p90_us: quantile(ns, warmup, total, 0.90),
        p99_us: quantile(ns, warmup, total, 0.99),
        p999_us: quantile(ns, warmup, total, 0.999),
    }
}

/// The five stage sample buffers: `parse`, `lob`, `sig`, `risk`, `e2e`.
pub struct StageTimers {
    /// Event parsing stage (trivial — events arrive pre-parsed from the
    /// in-memory replay vector, but the stage is still timed for symmetry
    /// with the external CSV-parsing contract it stands in for).
    pub parse: SampleBuffer,
    /// Limit order book update stage.
    pub lob: SampleBuffer,
    /// Signal (quoter) stage.
    pub sig: SampleBuffer,
    /// Risk gate stage.
    pub risk: SampleBuffer,
    /// End-to-end per-event stage.
    pub e2e: SampleBuffer,
}

impl StageTimers {
    /// Pre-size all five stage buffers to `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parse: SampleBuffer::with_capacity(capacity),
            lob: SampleBuffer::with_capacity(capacity),
            sig: SampleBuffer::with_capacity(capacity),
            risk: SampleBuffer::with_capacity(capacity),
            e2e: SampleBuffer::with_capacity(capacity),
        }
    }
}

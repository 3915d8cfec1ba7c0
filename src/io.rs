//! CSV replay loading and output writing.
//!
//! Thin glue, deliberately: header-sniffing and column semantics are kept
//! simple and explicit, expressed with the `csv` crate the way the rest of
//! the pack's market-data services do. None of this runs after the
//! allocation tripwire is armed — the replay is fully loaded and every
//! output writer is opened before the pipeline's warmup transition, and
//! writers are only flushed after the run completes.

use std::io::Write as _;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::BacktestError;
use crate::histogram::StageHistograms;
use crate::latency::StageTimers;
use crate::replay::{EventKind, Replay, ReplayEvent};

const HEADER_FIELDS: [&str; 6] = ["ts_ns", "type", "order_id", "side", "px", "qty"];

fn parse_side(field: &str) -> Option<bool> {
    match field {
        "1" | "B" | "b" => Some(true),
        "0" | "S" | "s" => Some(false),
        _ => None,
    }
}

fn parse_kind(field: &str) -> Option<EventKind> {
    match field {
        "A" => Some(EventKind::Add),
        "C" => Some(EventKind::Cancel),
        "E" => Some(EventKind::Exec),
        _ => None,
    }
}

fn looks_like_header(record: &StringRecord) -> bool {
    record.iter().eq(HEADER_FIELDS.iter().copied())
}

fn parse_record(record: &StringRecord) -> Option<ReplayEvent> {
    if record.len() != 6 {
        return None;
    }
    let ts_ns: u64 = record.get(0)?.trim().parse().ok()?;
    let kind = parse_kind(record.get(1)?.trim())?;
    let order_id: u32 = record.get(2)?.trim().parse().ok()?;
    let is_buy = parse_side(record.get(3)?.trim())?;
    let px: i32 = record.get(4)?.trim().parse().ok()?;
    let qty: i32 = record.get(5)?.trim().parse().ok()?;
    Some(ReplayEvent { ts_ns, kind, order_id, is_buy, px, qty })
}

/// Load a replay CSV from `path`, capping the number of rows read at
/// `max_msgs` (`0` means unbounded). If the first line does not match the
/// expected header, it is treated as a data row instead of being skipped.
pub fn load_replay(path: &Path, max_msgs: usize) -> Result<Replay, BacktestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| BacktestError::ReplayLoad(format!("cannot open {}: {e}", path.display())))?;

    let mut events = Vec::with_capacity(if max_msgs > 0 { max_msgs } else { 1024 });
    let mut first = true;
    let mut record = StringRecord::new();

    loop {
        if max_msgs > 0 && events.len() >= max_msgs {
            break;
        }
        let more = reader
            .read_record(&mut record)
            .map_err(|e| BacktestError::ReplayLoad(format!("{e}")))?;
        if !more {
            break;
        }
        if first && looks_like_header(&record) {
            first = false;
            continue;
        }
        first = false;
        match parse_record(&record) {
            Some(ev) => events.push(ev),
            None => {
                let joined: Vec<&str> = record.iter().collect();
                return Err(BacktestError::ReplayLoad(joined.join(",")));
            }
        }
    }

    Ok(Replay::new(events))
}

/// One admitted-quote output row for the results CSV.
pub struct ResultRow {
    /// Event timestamp, nanoseconds.
    pub ts_ns: u64,
    /// Single-character event kind: 'A' / 'C' / 'E'.
    pub event: char,
    /// Originating order id.
    pub order_id: u32,
    /// 0 (sell) / 1 (buy) — the *event's* side, not the quote's.
    pub side: u8,
    /// Admitted bid price (ticks).
    pub px: i32,
    /// Admitted bid quantity.
    pub qty: i32,
    /// Inventory after this event.
    pub inv_after: i32,
    /// PnL after this event, printed with 6 fractional digits.
    pub notional_after: f64,
}

/// Buffered writer for the results CSV, opened once before the hot loop.
///
/// Deliberately does *not* go through `csv::Writer` for [`write_row`] —
/// `Writer::serialize` grows internal field buffers and would trip the
/// allocation tripwire once armed. Row formatting instead goes straight
/// through `write!` into the pre-allocated `BufWriter`, keeping the output
/// path allocation-free after warmup. The `csv` crate is still used for the
/// header row and for every writer that only runs after teardown.
pub struct ResultsWriter {
    w: std::io::BufWriter<std::fs::File>,
}

impl ResultsWriter {
    /// Open `path` for writing, truncating any existing file, and emit the
    /// header row immediately.
    pub fn create(path: &Path) -> Result<Self, BacktestError> {
        let file = std::fs::File::create(path).map_err(|source| BacktestError::OutputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut w = std::io::BufWriter::with_capacity(8 * 1024 * 1024, file);
        writeln!(w, "ts_ns,event,order_id,side,px,qty,inv_after,notional_after")
            .map_err(|source| BacktestError::OutputOpen { path: path.to_path_buf(), source })?;
        Ok(Self { w })
    }

    /// Append one admitted row. Formats directly into the buffered writer;
    /// allocates nothing on its own.
    #[inline]
    pub fn write_row(&mut self, row: &ResultRow) -> std::io::Result<()> {
        writeln!(
            self.w,
            "{},{},{},{},{},{},{},{:.6}",
            row.ts_ns, row.event, row.order_id, row.side, row.px, row.qty, row.inv_after, row.notional_after
        )
    }

    /// Flush buffered output to disk.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.w.flush()
    }
}

/// Write the latency dump CSV (`stage,ns`), one row per post-warmup sample
/// per stage, in `parse,lob,sig,risk,e2e` order.
pub fn write_latency_csv(path: &Path, st: &StageTimers, warmup: usize, total: usize) -> Result<(), BacktestError> {
    let file = std::fs::File::create(path).map_err(|source| BacktestError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut w = WriterBuilder::new().has_headers(false).from_writer(file);
    w.write_record(["stage", "ns"])
        .map_err(|e| BacktestError::ReplayLoad(format!("{e}")))?;
    for (name, buf) in [
        ("parse", &st.parse),
        ("lob", &st.lob),
        ("sig", &st.sig),
        ("risk", &st.risk),
        ("e2e", &st.e2e),
    ] {
        let samples = buf.as_slice();
        let start = warmup.min(samples.len());
        let end = total.min(samples.len());
        for &ns in &samples[start..end] {
            w.write_record([name, &ns.to_string()])
                .map_err(|e| BacktestError::ReplayLoad(format!("{e}")))?;
        }
    }
    w.flush().map_err(|source| BacktestError::OutputOpen { path: path.to_path_buf(), source })
}

/// Write the histogram dump CSV (`stage,bucket_us,count`), one row per
/// (stage, edge) pair in edge order.
pub fn write_histogram_csv(path: &Path, hist: &StageHistograms) -> Result<(), BacktestError> {
    let file = std::fs::File::create(path).map_err(|source| BacktestError::OutputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut w = WriterBuilder::new().has_headers(false).from_writer(file);
    w.write_record(["stage", "bucket_us", "count"])
        .map_err(|e| BacktestError::ReplayLoad(format!("{e}")))?;
    for (name, h) in hist.stages() {
        for (edge, count) in h.buckets() {
            w.write_record([name, &edge.to_string(), &count.to_string()])
                .map_err(|e| BacktestError::ReplayLoad(format!("{e}")))?;
        }
    }
    w.flush().map_err(|source| BacktestError::OutputOpen { path: path.to_path_buf(), source })
}

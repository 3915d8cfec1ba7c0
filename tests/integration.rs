//! End-to-end scenarios against the full pipeline: a tiny determinism
//! feed, byte-identical repeated runs, and the Avellaneda-Stoikov branch
//! warming up once enough mid samples have accumulated.

use mm_backtest::config::{Config, QuoterMode};
use mm_backtest::io::ResultsWriter;
use mm_backtest::pipeline;
use mm_backtest::replay::{EventKind, Replay, ReplayEvent};

fn cfg(warmup: usize, mode: QuoterMode) -> Config {
    Config { replay: Default::default(), warmup, mode, ..Config::default() }
}

fn tiny_determinism_feed() -> Replay {
    Replay::new(vec![
        ReplayEvent { ts_ns: 1, kind: EventKind::Add, order_id: 1, is_buy: true, px: 100, qty: 2 },
        ReplayEvent { ts_ns: 2, kind: EventKind::Add, order_id: 2, is_buy: false, px: 101, qty: 3 },
        ReplayEvent { ts_ns: 3, kind: EventKind::Exec, order_id: 1, is_buy: true, px: 100, qty: 1 },
        ReplayEvent { ts_ns: 4, kind: EventKind::Cancel, order_id: 2, is_buy: false, px: 0, qty: 0 },
        ReplayEvent { ts_ns: 5, kind: EventKind::Add, order_id: 3, is_buy: true, px: 101, qty: 1 },
    ])
}

/// Final inventory is `-1` — a single Exec on the buy-side order inverts
/// to a sell-side PnL update.
#[test]
fn tiny_determinism_feed_yields_final_inventory_of_minus_one() {
    let replay = tiny_determinism_feed();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut writer = ResultsWriter::create(&path).unwrap();
    let report = pipeline::run(&cfg(0, QuoterMode::Heuristic), &replay, &mut writer).unwrap();
    writer.flush().unwrap();
    assert_eq!(report.inv, -1);
    assert_eq!(report.pnl, 100.0);
}

/// Three back-to-back runs over the same replay produce byte-identical
/// output streams.
#[test]
fn three_runs_over_the_same_replay_are_byte_identical() {
    let replay = tiny_determinism_feed();
    let dir = tempfile::tempdir().unwrap();

    let mut outputs = Vec::new();
    for i in 0..3 {
        let path = dir.path().join(format!("run{i}.csv"));
        let mut writer = ResultsWriter::create(&path).unwrap();
        pipeline::run(&cfg(0, QuoterMode::Heuristic), &replay, &mut writer).unwrap();
        writer.flush().unwrap();
        outputs.push(std::fs::read(&path).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
}

/// Run through the full AvS pipeline path rather than `ou::fit_ou`
/// directly: a long, slowly-varying synthetic mid series drives the
/// quoter through its `|mids| >= 64` AvS branch without degenerating.
#[test]
fn avs_mode_stays_on_the_avs_branch_once_enough_mids_accumulate() {
    let mut events = Vec::new();
    let mut px = 1000i32;
    for t in 0..200u64 {
        // A slow oscillation keeps best bid/ask both populated every tick
        // without ever crossing, so every event contributes a mid sample.
        px += if t % 2 == 0 { 1 } else { -1 };
        events.push(ReplayEvent {
            ts_ns: t * 1_000_000,
            kind: EventKind::Add,
            order_id: (2 * t + 1) as u32,
            is_buy: true,
            px: px - 1,
            qty: 1,
        });
        events.push(ReplayEvent {
            ts_ns: t * 1_000_000 + 500_000,
            kind: EventKind::Add,
            order_id: (2 * t + 2) as u32,
            is_buy: false,
            px: px + 1,
            qty: 1,
        });
    }
    let replay = Replay::new(events);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let mut writer = ResultsWriter::create(&path).unwrap();
    let report = pipeline::run(&cfg(0, QuoterMode::Avs), &replay, &mut writer).unwrap();
    writer.flush().unwrap();
    assert_eq!(report.processed, replay.len());
}

//! Price-time priority limit order book.
//!
//! Pooled, index-linked storage: every order lives in one per-side arena of
//! `MAX_ORDERS` nodes, every price level in one per-side array of
//! `MAX_LEVELS` slots. All cross-references — the FIFO chain within a
//! level, a node's owning level, the free list threading unused pool slots
//! — are plain array indices, never pointers or `Rc`/`Box`. This avoids
//! cyclic ownership entirely; it is also what lets `add`/`cancel` run in
//! O(1) with zero heap traffic once the arenas are built.

use crate::fixed_map::FixedMap;

/// Per-side pool capacity, set at 2,000,000 — far above any realistic
/// single-symbol working set.
pub const MAX_ORDERS: usize = 2_000_000;

/// Per-side price-level capacity.
pub const MAX_LEVELS: usize = 8192;

const PX_MAP_CAPACITY: usize = 16384; // power of two, >= 2x MAX_LEVELS
const ID_MAP_CAPACITY: usize = 1 << 22; // power of two, >= 2x MAX_ORDERS peak occupancy

/// Which side of the book an order or quote leg belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Buy side (bids).
    Buy,
    /// Sell side (asks).
    Sell,
}

/// One inbound order, as produced by the replay model.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    /// Caller-assigned order id. `0` is reserved as the fixed map's sentinel
    /// key and must not appear in replay data.
    pub id: u32,
    /// Price in integer ticks.
    pub px: i32,
    /// Quantity, always > 0.
    pub qty: i32,
    /// Arrival timestamp in nanoseconds.
    pub ts: u64,
    /// Side of the book this order rests on.
    pub side: Side,
}

/// A single top-of-book fill produced by [`OrderBook::match_top`].
#[derive(Debug, Clone, Copy)]
pub struct Exec {
    /// Timestamp of the later (aggressor) order, i.e. the time of the match.
    pub ts: u64,
    /// Id of the earlier-arriving (passive) order.
    pub id: u32,
    /// Execution price: the price of the later (aggressor) order.
    pub px: i32,
    /// Matched quantity: min of the two head orders' remaining quantities.
    pub qty: i32,
}

#[derive(Clone, Copy)]
struct OrderNode {
    id: u32,
    px: i32,
    qty: i32,
    ts: u64,
    next: i32,
    prev: i32,
    level: i32,
    active: bool,
}

impl Default for OrderNode {
    fn default() -> Self {
        Self {
            id: 0,
            px: 0,
            qty: 0,
            ts: 0,
            next: -1,
            prev: -1,
            level: -1,
            active: false,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct PriceLevel {
    px: i32,
    head: i32,
    tail: i32,
    total_qty: i32,
    active: bool,
}

struct BookSide {
    pool: Vec<OrderNode>,
    levels: Vec<PriceLevel>,
    px_to_level: FixedMap<i32>,
    id_to_order: FixedMap<u32>,
    best_level: i32,
    is_buy: bool,
    free_head: i32,
}

impl BookSide {
    fn new(is_buy: bool) -> Self {
        let mut pool = vec![OrderNode::default(); MAX_ORDERS];
        for i in 0..MAX_ORDERS {
            pool[i].next = if i + 1 < MAX_ORDERS { (i + 1) as i32 } else { -1 };
        }
        Self {
            pool,
            levels: vec![PriceLevel::default(); MAX_LEVELS],
            px_to_level: FixedMap::new(PX_MAP_CAPACITY, i32::MIN),
            id_to_order: FixedMap::new(ID_MAP_CAPACITY, 0),
            best_level: -1,
            is_buy,
            free_head: 0,
        }
    }

    #[inline]
    fn alloc_node(&mut self) -> i32 {
        let idx = self.free_head;
        assert!(idx >= 0, "order pool exhausted (MAX_ORDERS={MAX_ORDERS})");
        let sidx = idx as usize;
        self.free_head = self.pool[sidx].next;
        self.pool[sidx].next = -1;
        self.pool[sidx].prev = -1;
        self.pool[sidx].active = true;
        idx
    }

    #[inline]
    fn free_node(&mut self, idx: i32) {
        if idx < 0 {
            return;
        }
        let sidx = idx as usize;
        let n = &mut self.pool[sidx];
        n.active = false;
        n.level = -1;
        n.qty = 0;
        n.prev = -1;
        n.next = self.free_head;
        self.free_head = idx;
    }

    /// Beats the current best: strictly greater for bids, strictly lesser
    /// for asks (or no best exists yet).
    #[inline]
    fn beats_best(&self, px: i32) -> bool {
        if self.best_level < 0 {
            return true;
        }
        let bp = self.levels[self.best_level as usize].px;
        if self.is_buy {
            px > bp
        } else {
            px < bp
        }
    }

    fn ensure_level(&mut self, px: i32) -> i32 {
        let existing = self.px_to_level.get(px);
        if existing >= 0 {
            return existing;
        }
        for i in 0..MAX_LEVELS {
            if !self.levels[i].active {
                self.levels[i] = PriceLevel {
                    px,
                    head: -1,
                    tail: -1,
                    total_qty: 0,
                    active: true,
                };
                self.px_to_level.put(px, i as i32);
                if self.beats_best(px) {
                    self.best_level = i as i32;
                }
                return i as i32;
            }
        }
        panic!("no free price level (MAX_LEVELS={MAX_LEVELS})");
    }

    fn enqueue(&mut self, o: Order) {
        let lvl = self.ensure_level(o.px);
        let idx = self.alloc_node();
        {
            let n = &mut self.pool[idx as usize];
            n.id = o.id;
            n.px = o.px;
            n.qty = o.qty;
            n.ts = o.ts;
            n.level = lvl;
        }
        let slvl = lvl as usize;
        let tail = self.levels[slvl].tail;
        self.pool[idx as usize].prev = tail;
        self.pool[idx as usize].next = -1;
        if tail >= 0 {
            self.pool[tail as usize].next = idx;
        } else {
            self.levels[slvl].head = idx;
        }
        self.levels[slvl].tail = idx;
        self.levels[slvl].total_qty += o.qty;

        self.id_to_order.put(o.id, idx);

        if self.beats_best(o.px) {
            self.best_level = lvl;
        }
    }

    fn rescan_best(&mut self) {
        self.best_level = -1;
        for i in 0..MAX_LEVELS {
            if !self.levels[i].active {
                continue;
            }
            if self.best_level < 0 {
                self.best_level = i as i32;
            } else {
                let cur = self.levels[self.best_level as usize].px;
                let challenger = self.levels[i].px;
                let wins = if self.is_buy {
                    challenger > cur
                } else {
                    challenger < cur
                };
                if wins {
                    self.best_level = i as i32;
                }
            }
        }
    }

    fn remove_idx(&mut self, idx: i32) {
        if idx < 0 {
            return;
        }
        let sidx = idx as usize;
        if !self.pool[sidx].active {
            return;
        }
        let lvl_idx = self.pool[sidx].level;
        let (prev, next) = (self.pool[sidx].prev, self.pool[sidx].next);
        let slvl = lvl_idx as usize;

        if prev >= 0 {
            self.pool[prev as usize].next = next;
        } else {
            self.levels[slvl].head = next;
        }
        if next >= 0 {
            self.pool[next as usize].prev = prev;
        } else {
            self.levels[slvl].tail = prev;
        }

        self.levels[slvl].total_qty -= self.pool[sidx].qty;
        let id = self.pool[sidx].id;
        self.id_to_order.erase(id);
        self.free_node(idx);

        if self.levels[slvl].total_qty <= 0 {
            let px = self.levels[slvl].px;
            self.px_to_level.erase(px);
            self.levels[slvl] = PriceLevel::default();
            if self.best_level == lvl_idx {
                self.rescan_best();
            }
        }
    }

    #[inline]
    fn best_px(&self) -> Option<i32> {
        if self.best_level < 0 {
            None
        } else {
            Some(self.levels[self.best_level as usize].px)
        }
    }
}

/// The two-sided limit order book.
pub struct OrderBook {
    bid: BookSide,
    ask: BookSide,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Construct an empty book. Allocates both sides' pools/levels/maps
    /// once; no further allocation happens on any subsequent operation.
    pub fn new() -> Self {
        Self {
            bid: BookSide::new(true),
            ask: BookSide::new(false),
        }
    }

    /// Add a new order to the book. O(1) amortized; no allocation.
    pub fn add(&mut self, order: Order) {
        match order.side {
            Side::Buy => self.bid.enqueue(order),
            Side::Sell => self.ask.enqueue(order),
        }
    }

    /// Cancel an order by id. Idempotent: cancelling an unknown or
    /// already-removed id is a silent no-op.
    pub fn cancel(&mut self, id: u32) {
        let bid_idx = self.bid.id_to_order.get(id);
        if bid_idx >= 0 {
            self.bid.remove_idx(bid_idx);
            return;
        }
        let ask_idx = self.ask.id_to_order.get(id);
        if ask_idx >= 0 {
            self.ask.remove_idx(ask_idx);
        }
    }

    /// Best (highest) active bid price, or `None` if the bid side is empty.
    /// Callers that need a numeric `-inf` sentinel instead use
    /// [`OrderBook::best_bid_ticks`].
    #[inline]
    pub fn best_bid(&self) -> Option<i32> {
        self.bid.best_px()
    }

    /// Best (lowest) active ask price, or `None` if the ask side is empty.
    #[inline]
    pub fn best_ask(&self) -> Option<i32> {
        self.ask.best_px()
    }

    /// `best_bid()` widened to `i32::MIN` when no bids exist — the `-inf`
    /// sentinel.
    #[inline]
    pub fn best_bid_ticks(&self) -> i32 {
        self.best_bid().unwrap_or(i32::MIN)
    }

    /// `best_ask()` widened to `i32::MAX` when no asks exist — the `+inf`
    /// sentinel.
    #[inline]
    pub fn best_ask_ticks(&self) -> i32 {
        self.best_ask().unwrap_or(i32::MAX)
    }

    /// Attempt one top-of-book fill. Requires both sides non-empty and
    /// crossed (`best_bid >= best_ask`); produces at most one execution per
    /// call — callers wanting to fully drain a cross must call repeatedly.
    pub fn match_top(&mut self) -> Option<Exec> {
        let (bi, ai) = (self.bid.best_level, self.ask.best_level);
        if bi < 0 || ai < 0 {
            return None;
        }
        let (bpx, apx) = (
            self.bid.levels[bi as usize].px,
            self.ask.levels[ai as usize].px,
        );
        if bpx < apx {
            return None; // not crossed
        }

        let bidx = self.bid.levels[bi as usize].head;
        let aidx = self.ask.levels[ai as usize].head;
        if bidx < 0 || aidx < 0 {
            return None;
        }

        let (b_qty, b_ts, b_id, b_px) = {
            let n = &self.bid.pool[bidx as usize];
            (n.qty, n.ts, n.id, n.px)
        };
        let (a_qty, a_ts, a_id, a_px) = {
            let n = &self.ask.pool[aidx as usize];
            (n.qty, n.ts, n.id, n.px)
        };

        let qty = b_qty.min(a_qty);
        let px = if b_ts <= a_ts { a_px } else { b_px };
        let exec = Exec {
            ts: b_ts.max(a_ts),
            id: if b_ts < a_ts { b_id } else { a_id },
            px,
            qty,
        };

        self.bid.pool[bidx as usize].qty -= qty;
        self.ask.pool[aidx as usize].qty -= qty;
        self.bid.levels[bi as usize].total_qty -= qty;
        self.ask.levels[ai as usize].total_qty -= qty;

        if self.bid.pool[bidx as usize].qty == 0 {
            self.bid.remove_idx(bidx);
        }
        if self.ask.pool[aidx as usize].qty == 0 {
            self.ask.remove_idx(aidx);
        }

        Some(exec)
    }
}

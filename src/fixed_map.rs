//! Open-addressed fixed-capacity integer map.
//!
//! Power-of-two capacity, linear probing, a user-supplied sentinel "empty
//! key". No rehashing and no allocation after construction — the backing
//! `Vec` is sized once and never grows. Tombstones are not needed because
//! the book never probes a deleted slot across a full table: capacities are
//! chosen at least 2x peak occupancy (`MAX_ORDERS`/`MAX_LEVELS` vs. the
//! table sizes picked in `book.rs`).

/// A slot in the table: `key == empty_key` marks it unoccupied.
#[derive(Clone, Copy)]
struct Slot<K> {
    key: K,
    val: i32,
}

/// Fixed-capacity open-addressed map from an integer key to an `i32` value.
///
/// `get` returns `-1` for a missing key rather than `Option<i32>`, so call
/// sites that treat `-1` as a sentinel index stay branch-free in the same
/// way the pooled-order index arithmetic does elsewhere in the book.
pub struct FixedMap<K> {
    table: Vec<Slot<K>>,
    mask: usize,
    empty_key: K,
}

/// Keys usable with `FixedMap` must be copyable, comparable, and mixable
/// into a 64-bit hash via `as u64` (true for all integer key types used
/// here: `i32` prices and `u32` order ids).
pub trait MapKey: Copy + Eq {
    /// Widen the key to `u64` for XOR-mixing against the hash constant.
    fn to_mix(self) -> u64;
}

impl MapKey for i32 {
    #[inline]
    fn to_mix(self) -> u64 {
        self as i64 as u64
    }
}

impl MapKey for u32 {
    #[inline]
    fn to_mix(self) -> u64 {
        self as u64
    }
}

/// FNV-offset-basis-derived mixing constant, matching the original
/// implementation's fixed 64-bit constant.
const MIX_CONST: u64 = 1469598103934665603;

impl<K: MapKey> FixedMap<K> {
    /// Create a table of `capacity_pow2` slots (must be a power of two),
    /// all initialized to `empty_key`.
    pub fn new(capacity_pow2: usize, empty_key: K) -> Self {
        assert!(
            capacity_pow2.is_power_of_two(),
            "FixedMap capacity must be a power of two"
        );
        Self {
            table: vec![
                Slot {
                    key: empty_key,
                    val: -1
                };
                capacity_pow2
            ],
            mask: capacity_pow2 - 1,
            empty_key,
        }
    }

    #[inline]
    fn start(&self, key: K) -> usize {
        (MIX_CONST ^ key.to_mix()) as usize & self.mask
    }

    /// Look up `key`, returning its associated value or `-1` if absent.
    #[inline]
    pub fn get(&self, key: K) -> i32 {
        let mut p = self.start(key);
        for _ in 0..self.table.len() {
            let slot = &self.table[p];
            if slot.key == key {
                return slot.val;
            }
            if slot.key == self.empty_key {
                return -1;
            }
            p = (p + 1) & self.mask;
        }
        -1
    }

    /// Insert or update `key -> val`.
    #[inline]
    pub fn put(&mut self, key: K, val: i32) {
        let mut p = self.start(key);
        for _ in 0..self.table.len() {
            let slot = &mut self.table[p];
            if slot.key == self.empty_key || slot.key == key {
                slot.key = key;
                slot.val = val;
                return;
            }
            p = (p + 1) & self.mask;
        }
        unreachable!("FixedMap full — capacity must exceed peak occupancy");
    }

    /// Mark `key`'s slot empty in place. No-op if `key` is absent.
    #[inline]
    pub fn erase(&mut self, key: K) {
        let mut p = self.start(key);
        for _ in 0..self.table.len() {
            let slot = &mut self.table[p];
            if slot.key == key {
                slot.key = self.empty_key;
                slot.val = -1;
                return;
            }
            if slot.key == self.empty_key {
                return;
            }
            p = (p + 1) & self.mask;
        }
    }

    /// Reset every slot back to empty, without reallocating.
    pub fn clear(&mut self) {
        for slot in &mut self.table {
            slot.key = self.empty_key;
            slot.val = -1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_erase_roundtrip() {
        let mut m: FixedMap<i32> = FixedMap::new(16384, i32::MIN);
        assert_eq!(m.get(100), -1);
        m.put(100, 7);
        assert_eq!(m.get(100), 7);
        m.put(100, 8);
        assert_eq!(m.get(100), 8);
        m.erase(100);
        assert_eq!(m.get(100), -1);
        // erase of an absent key is a silent no-op
        m.erase(100);
        assert_eq!(m.get(100), -1);
    }

    #[test]
    fn distinct_keys_do_not_collide_in_value() {
        let mut m: FixedMap<u32> = FixedMap::new(1 << 12, 0);
        for i in 1..2000u32 {
            m.put(i, i as i32 * 2);
        }
        for i in 1..2000u32 {
            assert_eq!(m.get(i), i as i32 * 2);
        }
    }

    #[test]
    fn clear_resets_all_slots() {
        let mut m: FixedMap<i32> = FixedMap::new(1024, i32::MIN);
        for i in 0..100 {
            m.put(i, i);
        }
        m.clear();
        for i in 0..100 {
            assert_eq!(m.get(i), -1);
        }
    }

    #[test]
    #[should_panic]
    fn non_power_of_two_capacity_panics() {
        let _: FixedMap<i32> = FixedMap::new(100, i32::MIN);
    }

    /// Every key in a put sequence is retrievable with its *last* value
    /// afterward, regardless of insertion order or duplicate keys.
    #[quickcheck_macros::quickcheck]
    fn last_put_wins_for_every_key(keys: Vec<u32>) -> quickcheck::TestResult {
        let keys: Vec<u32> = keys.into_iter().filter(|&k| k != 0).take(500).collect();
        if keys.is_empty() {
            return quickcheck::TestResult::discard();
        }
        let mut m: FixedMap<u32> = FixedMap::new(4096, 0);
        let mut last = std::collections::HashMap::new();
        for (i, &k) in keys.iter().enumerate() {
            m.put(k, i as i32);
            last.insert(k, i as i32);
        }
        for (&k, &v) in &last {
            if m.get(k) != v {
                return quickcheck::TestResult::failed();
            }
        }
        quickcheck::TestResult::passed()
    }
}

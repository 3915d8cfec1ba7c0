//! Fixed-edge microsecond histogram aggregator.
//!
//! Operates only on post-warmup samples; the orchestrator is responsible
//! for slicing stage buffers to `[warmup..processed]` before feeding them
//! in. Edges are a user-supplied, ascending set of microsecond upper
//! bounds; the canonical set matches the external histogram dump format.

/// Canonical microsecond bucket upper bounds.
pub const CANONICAL_EDGES_US: [u32; 11] = [1, 2, 5, 10, 20, 50, 80, 100, 200, 500, 1000];

/// A single stage's fixed-edge histogram.
pub struct Histogram {
    edges_us: Vec<u32>,
    counts: Vec<u64>,
}

impl Histogram {
    /// Build a histogram with the given ascending microsecond edges.
    pub fn new(edges_us: Vec<u32>) -> Self {
        let counts = vec![0u64; edges_us.len()];
        Self { edges_us, counts }
    }

    /// Convert `ns` to microseconds and increment the first bucket whose
    /// edge is `>= us`; if none match (value exceeds every edge), increment
    /// the last bucket.
    #[inline]
    pub fn add_ns(&mut self, ns: u64) {
        let us = (ns / 1000) as u32;
        for (i, &edge) in self.edges_us.iter().enumerate() {
            if us <= edge {
                self.counts[i] += 1;
                return;
            }
        }
        if let Some(last) = self.counts.last_mut() {
            *last += 1;
        }
    }

    /// Iterate `(edge_us, count)` pairs in edge order.
    pub fn buckets(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.edges_us.iter().copied().zip(self.counts.iter().copied())
    }
}

/// The five stage histograms: `parse`, `lob`, `sig`, `risk`, `e2e`.
pub struct StageHistograms {
    /// Parse stage histogram.
    pub parse: Histogram,
    /// LOB stage histogram.
    pub lob: Histogram,
    /// Signal stage histogram.
    pub sig: Histogram,
    /// Risk stage histogram.
    pub risk: Histogram,
    /// End-to-end stage histogram.
    pub e2e: Histogram,
}

impl StageHistograms {
    /// Build all five stage histograms sharing the same edge set.
    pub fn new(edges_us: &[u32]) -> Self {
        Self {
            parse: Histogram::new(edges_us.to_vec()),
            lob: Histogram::new(edges_us.to_vec()),
            sig: Histogram::new(edges_us.to_vec()),
            risk: Histogram::new(edges_us.to_vec()),
            e2e: Histogram::new(edges_us.to_vec()),
        }
    }

    /// Iterate `(stage_name, histogram)` pairs in the canonical dump order.
    pub fn stages(&self) -> [(&'static str, &Histogram); 5] {
        [
            ("parse", &self.parse),
            ("lob", &self.lob),
            ("sig", &self.sig),
            ("risk", &self.risk),
            ("e2e", &self.e2e),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_into_first_matching_edge() {
        let mut h = Histogram::new(CANONICAL_EDGES_US.to_vec());
        h.add_ns(500); // 0us -> bucket edge=1
        h.add_ns(1_500); // 1us -> bucket edge=2
        h.add_ns(3_000); // 3us -> bucket edge=5
        let buckets: Vec<(u32, u64)> = h.buckets().collect();
        assert_eq!(buckets[0], (1, 1));
        assert_eq!(buckets[1], (2, 1));
        assert_eq!(buckets[2], (5, 1));
    }

    #[test]
    fn values_beyond_last_edge_go_to_last_bucket() {
        let mut h = Histogram::new(CANONICAL_EDGES_US.to_vec());
        h.add_ns(5_000_000); // 5ms, far beyond 1000us
        let buckets: Vec<(u32, u64)> = h.buckets().collect();
        assert_eq!(buckets.last().unwrap().1, 1);
        assert!(buckets[..buckets.len() - 1].iter().all(|&(_, c)| c == 0));
    }

    #[test]
    fn boundary_value_is_inclusive() {
        let mut h = Histogram::new(vec![10, 20]);
        h.add_ns(10_000); // exactly 10us -> first bucket (us <= edge)
        let buckets: Vec<(u32, u64)> = h.buckets().collect();
        assert_eq!(buckets[0], (10, 1));
        assert_eq!(buckets[1], (20, 0));
    }
}

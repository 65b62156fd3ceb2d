// Per-search counters, reported in info lines and by the perft tooling.

use std::time::Duration;

#[derive(Debug, Default, Clone, Copy)]
pub struct SearchStats {
    /// Interior nodes visited by the main search.
    pub nodes: u64,
    /// Nodes visited by quiescence.
    pub qnodes: u64,
    /// Transposition-table probes answered with a usable entry.
    pub tt_hits: u64,
    /// Beta cutoffs taken.
    pub cutoffs: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.qnodes
    }

    pub fn nps(&self, elapsed: Duration) -> u64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0;
        }
        (self.total_nodes() as f64 / secs) as u64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

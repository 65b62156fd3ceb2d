// Transposition table: fixed-size, always-replace, owned by one search
// session at a time. Entries carry the full 64-bit key, so an index
// collision can never surface a foreign position's data.

use crate::board::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Score is exact (searched with an open window).
    Exact,
    /// Score is a lower bound (fail-high, beta cutoff).
    Lower,
    /// Score is an upper bound (fail-low, no move raised alpha).
    Upper,
}

#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    pub key: u64,
    pub depth: u8,
    pub score: i16,
    pub bound: Bound,
    pub best: Option<Move>,
}

/// Default table size in entries. At ~32 bytes per slot this is in the
/// tens of megabytes, plenty for a single session.
pub const DEFAULT_CAPACITY: usize = 1 << 20;

pub struct TransTable {
    entries: Vec<Option<TtEntry>>,
}

impl TransTable {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "transposition table needs at least one slot");
        Self {
            entries: vec![None; capacity],
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// Look up `key`. Returns the entry only on a full-key match; depth
    /// sufficiency is the caller's concern (the stored move is a useful
    /// ordering hint even when the depth is too shallow for a cutoff).
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        self.entries[self.index(key)].filter(|e| e.key == key)
    }

    /// Store unconditionally, evicting whatever occupied the slot. A best
    /// move is only meaningful for exact scores and is dropped otherwise.
    pub fn store(&mut self, key: u64, depth: u8, score: i16, bound: Bound, best: Option<Move>) {
        let best = if bound == Bound::Exact { best } else { None };
        let idx = self.index(key);
        self.entries[idx] = Some(TtEntry {
            key,
            depth,
            score,
            bound,
            best,
        });
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|slot| *slot = None);
    }
}

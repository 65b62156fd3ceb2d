// Triangular principal-variation table. Row `ply` holds the best line
// found from that ply; whenever a move improves alpha, the child row is
// copied up behind it, so row 0 always carries the full line of the best
// root move examined so far.

use crate::board::Move;

pub const MAX_PLY: usize = 64;

pub struct PvTable {
    table: Vec<[Option<Move>; MAX_PLY]>,
    len: [usize; MAX_PLY],
}

impl PvTable {
    pub fn new() -> Self {
        Self {
            table: vec![[None; MAX_PLY]; MAX_PLY],
            len: [0; MAX_PLY],
        }
    }

    /// Called on entry to a node; an empty line for this ply until a move
    /// raises alpha.
    #[inline]
    pub fn enter(&mut self, ply: usize) {
        if ply < MAX_PLY {
            self.len[ply] = ply;
        }
    }

    /// Record `mv` as the best at `ply` and append the child's line.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply + 1 >= MAX_PLY {
            return;
        }
        let (head, tail) = self.table.split_at_mut(ply + 1);
        let dst = &mut head[ply];
        let src = &tail[0];
        dst[ply] = Some(mv);
        let child_len = self.len[ply + 1];
        for i in (ply + 1)..child_len {
            dst[i] = src[i];
        }
        self.len[ply] = child_len.max(ply + 1);
    }

    /// The current principal variation from the root.
    pub fn line(&self) -> Vec<Move> {
        self.table[0][..self.len[0]]
            .iter()
            .copied()
            .flatten()
            .collect()
    }

    pub fn best_move(&self) -> Option<Move> {
        self.table[0][0]
    }

    pub fn clear(&mut self) {
        for row in self.table.iter_mut() {
            row.fill(None);
        }
        self.len = [0; MAX_PLY];
    }
}

impl Default for PvTable {
    fn default() -> Self {
        Self::new()
    }
}

// Iterative-deepening negamax with alpha-beta, quiescence, null-move
// pruning, late move reductions, killer moves and a transposition table.
//
// Cancellation is cooperative: when the stop token trips or the time
// budget runs out, the current iteration unwinds with a sentinel score and
// only previously completed iterations count toward the answer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::board::{Board, Move, PieceKind};
use crate::eval::{self, INFINITE, MATE};
use crate::movegen;

use super::params::SearchParams;
use super::pv::{PvTable, MAX_PLY};
use super::stats::SearchStats;
use super::tt::{Bound, TransTable, DEFAULT_CAPACITY};

/// Sentinel bubbled up while an aborted iteration unwinds. Callers check
/// the `aborted` flag before trusting any returned score.
const ABORT: i16 = INFINITE;

/// Null-move depth reduction.
const NULL_MOVE_R: u8 = 2;

/// Extra plies quiescence may extend past the horizon.
const QS_MAX_DEPTH: u8 = 8;

/// Safety margin subtracted from the queen's value in delta pruning.
const DELTA_MARGIN: i16 = 200;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i16,
    pub depth: u8,
    pub pv: Vec<Move>,
    pub nodes: u64,
    pub elapsed: Duration,
}

pub struct Search {
    board: Board,
    tt: TransTable,
    pv: PvTable,
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: [[[i32; 64]; 64]; 2],
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
    stats: SearchStats,
    aborted: bool,
    tick: u32,
}

impl Search {
    pub fn new(board: Board, stop: Arc<AtomicBool>) -> Self {
        Self::with_tt_capacity(board, stop, DEFAULT_CAPACITY)
    }

    pub fn with_tt_capacity(board: Board, stop: Arc<AtomicBool>, capacity: usize) -> Self {
        Self {
            board,
            tt: TransTable::new(capacity),
            pv: PvTable::new(),
            killers: [[None; 2]; MAX_PLY],
            history: [[[0; 64]; 64]; 2],
            stop,
            deadline: None,
            stats: SearchStats::new(),
            aborted: false,
            tick: 0,
        }
    }

    /// Run iterative deepening under `params`, printing an info line per
    /// completed iteration. The result reflects the deepest iteration that
    /// ran to completion.
    pub fn run(&mut self, params: &SearchParams) -> SearchResult {
        if let Some(depth) = params.depth {
            // a zero-depth request is a caller bug, not a degenerate search
            assert!(depth > 0, "search depth must be at least 1");
        }
        let start = Instant::now();
        self.deadline = crate::time::allocate(params, self.board.side).map(|d| start + d);
        self.stats.reset();
        self.aborted = false;

        let max_depth = params.depth.unwrap_or(MAX_PLY as u8 - 1).min(MAX_PLY as u8 - 1);
        let mut result = SearchResult {
            best_move: None,
            score: 0,
            depth: 0,
            pv: Vec::new(),
            nodes: 0,
            elapsed: Duration::ZERO,
        };

        for depth in 1..=max_depth {
            let score = self.negamax(depth, 0, -INFINITE, INFINITE, true);
            if self.aborted {
                debug!("iteration {} aborted, keeping depth {}", depth, result.depth);
                break;
            }
            let elapsed = start.elapsed();
            result = SearchResult {
                best_move: self.pv.best_move(),
                score,
                depth,
                pv: self.pv.line(),
                nodes: self.stats.total_nodes(),
                elapsed,
            };
            self.print_info(&result);
            if score.abs() >= MATE - MAX_PLY as i16 {
                // a forced mate was found; deeper iterations cannot improve it
                break;
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
        }

        // never leave the caller without a move when one exists
        if result.best_move.is_none() {
            result.best_move = movegen::legal_moves(&self.board).into_iter().next();
        }
        result.elapsed = start.elapsed();
        result
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    fn print_info(&self, result: &SearchResult) {
        let score = if result.score.abs() >= MATE - MAX_PLY as i16 {
            let plies = MATE - result.score.abs();
            let moves = (plies + 1) / 2;
            format!("mate {}", if result.score > 0 { moves } else { -moves })
        } else {
            format!("cp {}", result.score)
        };
        let pv: Vec<String> = result.pv.iter().map(|mv| mv.to_uci()).collect();
        println!(
            "info depth {} score {} nodes {} nps {} time {} pv {}",
            result.depth,
            score,
            result.nodes,
            self.stats.nps(result.elapsed),
            result.elapsed.as_millis(),
            pv.join(" ")
        );
    }

    /// Stop-token and deadline check; the clock is only consulted every
    /// 1024 calls.
    fn should_stop(&mut self) -> bool {
        if self.aborted || self.stop.load(Ordering::Relaxed) {
            return true;
        }
        self.tick = self.tick.wrapping_add(1);
        if self.tick & 1023 == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return true;
                }
            }
        }
        false
    }

    fn negamax(
        &mut self,
        depth: u8,
        ply: usize,
        mut alpha: i16,
        mut beta: i16,
        allow_null: bool,
    ) -> i16 {
        if self.should_stop() {
            self.aborted = true;
            return ABORT;
        }
        self.pv.enter(ply);

        if ply > 0 && self.board.is_draw() {
            return 0;
        }
        if depth == 0 || ply >= MAX_PLY - 1 {
            return self.quiescence(alpha, beta, ply, QS_MAX_DEPTH);
        }
        self.stats.nodes += 1;

        let key = self.board.zobrist;
        let in_check = self.board.in_check();

        // TT: exact entries answer outright; bounds tighten the window and
        // answer once it collapses. The stored move orders first either way.
        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(key) {
            tt_move = entry.best;
            if ply > 0 && entry.depth >= depth {
                match entry.bound {
                    Bound::Exact => {
                        self.stats.tt_hits += 1;
                        return entry.score;
                    }
                    Bound::Lower => alpha = alpha.max(entry.score),
                    Bound::Upper => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    self.stats.tt_hits += 1;
                    return entry.score;
                }
            }
        }

        // Mate and stalemate are settled before any pruning: a stalemated
        // mover must score 0, never a null-move fail-high.
        let mut moves = movegen::legal_moves(&self.board);
        if moves.is_empty() {
            return if in_check { -(MATE - ply as i16) } else { 0 };
        }

        // Null move: hand the opponent a free move and prune on a zero
        // window fail-high. Off in check, in late endgames (zugzwang) and
        // directly after another null move.
        if allow_null && depth > 2 && ply > 0 && !in_check && !self.board.is_late_endgame() {
            let undo = self.board.make_null_move();
            let score =
                -self.negamax(depth - 1 - NULL_MOVE_R, ply + 1, -beta, -beta + 1, false);
            self.board.unmake_null_move(undo);
            if self.aborted {
                return ABORT;
            }
            if score >= beta {
                return beta;
            }
        }

        self.order_moves(&mut moves, tt_move, ply);

        let original_alpha = alpha;
        let mut best_score = -INFINITE;
        let mut best_move = None;

        for (i, mv) in moves.iter().copied().enumerate() {
            let undo = self.board.make_move(mv);
            let score = if i == 0 {
                -self.negamax(depth - 1, ply + 1, -beta, -alpha, true)
            } else {
                // late quiet moves get a reduced zero-window probe first
                let reducible = depth >= 3
                    && i >= 3
                    && !in_check
                    && !mv.is_capture()
                    && mv.kind.promotion().is_none()
                    && Some(mv) != self.killers[ply][0]
                    && Some(mv) != self.killers[ply][1];
                let reduced_depth = if reducible {
                    (depth - 1).saturating_sub(lmr_reduction(depth, i))
                } else {
                    depth - 1
                };
                let mut s = -self.negamax(reduced_depth, ply + 1, -alpha - 1, -alpha, true);
                if !self.aborted && s > alpha {
                    s = -self.negamax(depth - 1, ply + 1, -beta, -alpha, true);
                }
                s
            };
            self.board.unmake_move(mv, undo);
            if self.aborted {
                return ABORT;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
                self.pv.update(ply, mv);
            }
            if alpha >= beta {
                self.stats.cutoffs += 1;
                if !mv.is_capture() {
                    self.record_killer(ply, mv);
                    self.update_history(mv, depth, &moves[..i]);
                }
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(key, depth, best_score, bound, best_move);
        best_score
    }

    /// Captures-only search past the horizon, with stand-pat cutoff and
    /// delta pruning.
    fn quiescence(&mut self, mut alpha: i16, beta: i16, ply: usize, depth_left: u8) -> i16 {
        if self.should_stop() {
            self.aborted = true;
            return ABORT;
        }
        self.stats.qnodes += 1;

        if let Some(entry) = self.tt.probe(self.board.zobrist) {
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::Lower => entry.score >= beta,
                Bound::Upper => entry.score <= alpha,
            };
            if usable {
                self.stats.tt_hits += 1;
                return entry.score;
            }
        }

        let mut stand_pat = eval::evaluate(&self.board);
        if stand_pat == -MATE {
            // mated right here; rank it by distance from the root
            stand_pat = -(MATE - ply as i16);
        }
        if depth_left == 0 || ply >= MAX_PLY - 1 {
            return stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        // delta pruning: when not even a queen's worth of material would
        // lift the stand pat to the window, captures are futile here;
        // unreliable in late endgames, so gated off
        if !self.board.is_late_endgame()
            && stand_pat + eval::piece_value(PieceKind::Queen) - DELTA_MARGIN <= alpha
        {
            return alpha;
        }

        let mut captures: Vec<Move> = movegen::legal_moves(&self.board)
            .into_iter()
            .filter(|mv| mv.is_capture())
            .collect();
        captures.sort_by_key(|mv| -mvv_lva(mv));

        for mv in captures {
            let undo = self.board.make_move(mv);
            let score = -self.quiescence(-beta, -alpha, ply + 1, depth_left - 1);
            self.board.unmake_move(mv, undo);
            if self.aborted {
                return ABORT;
            }
            if score >= beta {
                self.stats.cutoffs += 1;
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }

    // Ordering tiers: hash move, captures by MVV-LVA, killers, then the
    // remaining quiets in generation order. The sort is stable, so equal
    // scores keep a deterministic order.
    fn order_moves(&self, moves: &mut [Move], tt_move: Option<Move>, ply: usize) {
        moves.sort_by_key(|mv| {
            let score = if Some(*mv) == tt_move {
                1_000_000
            } else if mv.is_capture() {
                100_000 + mvv_lva(mv)
            } else if Some(*mv) == self.killers[ply][0] {
                90_000
            } else if Some(*mv) == self.killers[ply][1] {
                80_000
            } else {
                0
            };
            -score
        });
    }

    fn record_killer(&mut self, ply: usize, mv: Move) {
        if self.killers[ply][0] != Some(mv) {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = Some(mv);
        }
    }

    // Cutoff quiets earn a depth-squared bonus; the quiets tried before
    // them take the same amount as a penalty.
    fn update_history(&mut self, mv: Move, depth: u8, tried: &[Move]) {
        let color = self.board.side as usize;
        let bonus = (depth as i32) * (depth as i32);
        self.history[color][mv.from_sq()][mv.to_sq()] += bonus;
        for prior in tried.iter().filter(|m| !m.is_capture()) {
            self.history[color][prior.from_sq()][prior.to_sq()] -= bonus;
        }
    }
}

/// Most-valuable-victim / least-valuable-attacker score for a capture.
fn mvv_lva(mv: &Move) -> i32 {
    let victim = mv.kind.captured().map(eval::piece_value).unwrap_or(0) as i32;
    let attacker = eval::piece_value(mv.piece) as i32;
    victim * 10 - attacker
}

fn lmr_reduction(depth: u8, move_index: usize) -> u8 {
    let r = (depth as f32).ln() * (move_index as f32).ln() / 2.0;
    (r as u8).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_fen(fen: &str, depth: u8) -> SearchResult {
        crate::init();
        let mut board = Board::new();
        board.set_from_fen(fen).unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let mut search = Search::with_tt_capacity(board, stop, 1 << 16);
        search.run(&SearchParams::new().depth(depth))
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let result = search_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 4);
        assert_eq!(result.best_move.map(|mv| mv.to_uci()), Some("a1a8".into()));
        assert!(result.score >= MATE - MAX_PLY as i16);
    }

    #[test]
    fn prefers_winning_the_hanging_queen() {
        // white rook can take an undefended queen
        let result = search_fen("3q2k1/8/8/8/8/8/8/3R2K1 w - - 0 1", 4);
        assert_eq!(result.best_move.map(|mv| mv.to_uci()), Some("d1d8".into()));
    }

    #[test]
    fn resolves_the_queen_capture_at_the_horizon() {
        // depth 1 leaves the capture to quiescence
        let result = search_fen("k7/8/8/3q4/8/8/3R4/K7 w - - 0 1", 1);
        assert_eq!(result.best_move.map(|mv| mv.to_uci()), Some("d2d5".into()));
        assert!(result.score >= 300);
    }

    #[test]
    fn finds_the_stalemate_refuge_when_hopelessly_behind() {
        // white's whole army is tangled up: any black king move leaves
        // white with no legal reply and the game drawn, while the capture
        // b3xa2 frees the queen and loses
        let result = search_fen("8/7k/8/1p6/1Pp5/1pPp4/NP1P4/QKB5 b - - 0 1", 4);
        assert_eq!(result.score, 0);
        assert_ne!(result.best_move.map(|mv| mv.to_uci()), Some("b3a2".into()));
    }

    #[test]
    fn fixed_depth_search_is_deterministic() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let a = search_fen(fen, 4);
        let b = search_fen(fen, 4);
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn pv_starts_with_the_best_move() {
        let result = search_fen(crate::board::START_FEN, 4);
        assert_eq!(result.pv.first().copied(), result.best_move);
        assert!(!result.pv.is_empty());
    }

    #[test]
    fn cancelled_search_still_reports_a_legal_move() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let stop = Arc::new(AtomicBool::new(true));
        let mut search = Search::with_tt_capacity(board.clone(), stop, 1 << 10);
        let result = search.run(&SearchParams::new().depth(9));
        let legal = movegen::legal_moves(&board);
        let best = result.best_move.expect("a move must be returned");
        assert!(legal.contains(&best));
        assert_eq!(result.depth, 0);
    }
}

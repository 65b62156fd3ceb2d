// Static evaluation: terminal states first, then material plus mobility,
// reported from the perspective of the side to move.

use crate::board::{Board, Color, PieceKind};
use crate::movegen;
use crate::utils::{self, iter_bits};

/// Sentinel search window bound; no real score reaches it.
pub const INFINITE: i16 = 30000;
/// Checkmate base score. Mates found deeper in the tree score closer to
/// zero, so shorter mates always win the comparison.
pub const MATE: i16 = 29000;

/// Centipawn values indexed by `PieceKind`. The king has no material value;
/// both kings are always on the board.
const PIECE_VALUES: [i16; 6] = [100, 320, 330, 500, 900, 0];

/// Mobility bonus per reachable square, indexed by `PieceKind`. Pawns and
/// kings are not rewarded for mobility.
const MOBILITY_WEIGHTS: [i16; 6] = [0, 4, 4, 2, 1, 0];

#[inline]
pub fn piece_value(kind: PieceKind) -> i16 {
    PIECE_VALUES[kind as usize]
}

/// Evaluate the position for the side to move.
///
/// Draws (fifty-move, threefold repetition, insufficient material,
/// stalemate) score 0; being checkmated scores `-MATE`. Otherwise the score
/// is the material and mobility balance, positive when the mover is ahead.
pub fn evaluate(board: &Board) -> i16 {
    if board.is_draw() {
        return 0;
    }
    if movegen::legal_moves(board).is_empty() {
        return if board.in_check() { -MATE } else { 0 };
    }

    let score = side_score(board, Color::White) - side_score(board, Color::Black);
    match board.side {
        Color::White => score,
        Color::Black => -score,
    }
}

fn side_score(board: &Board, color: Color) -> i16 {
    let occ = board.occ();
    let own = board.occupancy(color);
    let mut score = 0i16;
    for kind in PieceKind::ALL {
        let bb = board.piece_bb(kind, color);
        score += piece_value(kind) * bb.count_ones() as i16;
        let weight = MOBILITY_WEIGHTS[kind as usize];
        if weight == 0 {
            continue;
        }
        for sq in iter_bits(bb) {
            let attacks = match kind {
                PieceKind::Knight => utils::knight_attacks(sq),
                PieceKind::Bishop => utils::bishop_attacks(sq, occ),
                PieceKind::Rook => utils::rook_attacks(sq, occ),
                PieceKind::Queen => utils::queen_attacks(sq, occ),
                _ => 0,
            };
            score += weight * (attacks & !own).count_ones() as i16;
        }
    }
    score
}

/// Non-pawn, non-king material of one side in centipawns.
fn non_pawn_material(board: &Board, color: Color) -> i16 {
    [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ]
    .iter()
    .map(|&kind| piece_value(kind) * board.piece_bb(kind, color).count_ones() as i16)
    .sum()
}

impl Board {
    pub fn is_checkmate(&self) -> bool {
        self.in_check() && movegen::legal_moves(self).is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && movegen::legal_moves(self).is_empty()
    }

    pub fn is_draw_by_fifty(&self) -> bool {
        self.halfmove >= 100
    }

    /// Neither side can deliver mate: no pawns, rooks or queens on the
    /// board, and at most one minor piece in total, or one side has
    /// exactly two knights against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        for color in [Color::White, Color::Black] {
            if self.piece_bb(PieceKind::Pawn, color) != 0
                || self.piece_bb(PieceKind::Rook, color) != 0
                || self.piece_bb(PieceKind::Queen, color) != 0
            {
                return false;
            }
        }
        let knights = |c: Color| self.piece_bb(PieceKind::Knight, c).count_ones();
        let bishops = |c: Color| self.piece_bb(PieceKind::Bishop, c).count_ones();
        let white_minors = knights(Color::White) + bishops(Color::White);
        let black_minors = knights(Color::Black) + bishops(Color::Black);
        if white_minors + black_minors <= 1 {
            return true;
        }
        // two knights cannot force mate against a bare king
        (knights(Color::White) == 2 && white_minors == 2 && black_minors == 0)
            || (knights(Color::Black) == 2 && black_minors == 2 && white_minors == 0)
    }

    pub fn is_draw(&self) -> bool {
        self.is_draw_by_fifty()
            || self.is_insufficient_material()
            || self.is_draw_by_repetition()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_draw() || movegen::legal_moves(self).is_empty()
    }

    /// Late-endgame gate for null-move and delta pruning: the mover has no
    /// queen, or little non-pawn material left.
    pub fn is_late_endgame(&self) -> bool {
        self.piece_bb(PieceKind::Queen, self.side) == 0
            || non_pawn_material(self, self.side) <= 1300
    }
}

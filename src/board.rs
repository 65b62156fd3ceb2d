// Square mapping: A1=0, B1=1, ..., H8=63, used consistently everywhere.

use crate::utils;
use crate::zobrist;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    #[inline]
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// The four pieces a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];
}

// piece_bb array index: white piece = kind as usize; black piece = 6 + kind
fn piece_index(kind: PieceKind, color: Color) -> usize {
    (color as usize) * 6 + (kind as usize)
}

/// Tag distinguishing the sixteen move shapes. Make/unmake switch
/// exhaustively on this tag; special behavior (rook relocation on castling,
/// off-ray pawn removal on en passant, piece substitution on promotion) is
/// never re-derived from the squares after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Quiet,
    DoublePush,
    CastleKing,
    CastleQueen,
    Capture(PieceKind),
    EnPassant,
    Promotion(PieceKind),
    PromotionCapture {
        promo: PieceKind,
        captured: PieceKind,
    },
}

impl MoveKind {
    #[inline]
    pub fn is_capture(self) -> bool {
        matches!(
            self,
            MoveKind::Capture(_) | MoveKind::EnPassant | MoveKind::PromotionCapture { .. }
        )
    }

    #[inline]
    pub fn is_promotion(self) -> bool {
        matches!(
            self,
            MoveKind::Promotion(_) | MoveKind::PromotionCapture { .. }
        )
    }

    /// The piece taken off the board, if any (a pawn for en passant).
    #[inline]
    pub fn captured(self) -> Option<PieceKind> {
        match self {
            MoveKind::Capture(kind) => Some(kind),
            MoveKind::EnPassant => Some(PieceKind::Pawn),
            MoveKind::PromotionCapture { captured, .. } => Some(captured),
            _ => None,
        }
    }

    #[inline]
    pub fn promotion(self) -> Option<PieceKind> {
        match self {
            MoveKind::Promotion(kind) => Some(kind),
            MoveKind::PromotionCapture { promo, .. } => Some(promo),
            _ => None,
        }
    }
}

/// A move with its kind tag. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: PieceKind,
    pub from: u8,
    pub to: u8,
    pub kind: MoveKind,
}

impl Move {
    pub fn new(piece: PieceKind, from: usize, to: usize, kind: MoveKind) -> Self {
        Self {
            piece,
            from: from as u8,
            to: to as u8,
            kind,
        }
    }

    #[inline]
    pub fn from_sq(&self) -> usize {
        self.from as usize
    }

    #[inline]
    pub fn to_sq(&self) -> usize {
        self.to as usize
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.kind.is_capture()
    }

    /// UCI notation, e.g. "e2e4" or "e7e8q".
    pub fn to_uci(&self) -> String {
        let mut s = format!(
            "{}{}",
            square_to_uci(self.from_sq()),
            square_to_uci(self.to_sq())
        );
        if let Some(promo) = self.kind.promotion() {
            s.push(match promo {
                PieceKind::Knight => 'n',
                PieceKind::Bishop => 'b',
                PieceKind::Rook => 'r',
                _ => 'q',
            });
        }
        s
    }
}

/// Convert a square index (0-63) to UCI notation (0 -> "a1", 63 -> "h8")
pub fn square_to_uci(sq: usize) -> String {
    let file = (b'a' + (sq % 8) as u8) as char;
    let rank = (b'1' + (sq / 8) as u8) as char;
    format!("{}{}", file, rank)
}

/// Convert UCI notation to a square index ("e2" -> 12, "a1" -> 0)
pub fn uci_to_square(uci: &str) -> Result<usize, IllegalMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 2 {
        return Err(IllegalMove::BadSquare);
    }
    let (file, rank) = (bytes[0], bytes[1]);
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(IllegalMove::BadSquare);
    }
    Ok(((rank - b'1') as usize) * 8 + (file - b'a') as usize)
}

/// Parse a UCI move string against the legal moves of `board`.
pub fn parse_uci_move(board: &Board, uci: &str) -> Result<Move, IllegalMove> {
    if uci.len() < 4 || !uci.is_ascii() {
        return Err(IllegalMove::BadSquare);
    }
    let from = uci_to_square(&uci[0..2])?;
    let to = uci_to_square(&uci[2..4])?;
    let promotion = match uci.as_bytes().get(4) {
        None => None,
        Some(b'q') => Some(PieceKind::Queen),
        Some(b'r') => Some(PieceKind::Rook),
        Some(b'b') => Some(PieceKind::Bishop),
        Some(b'n') => Some(PieceKind::Knight),
        Some(_) => return Err(IllegalMove::BadPromotion),
    };

    crate::movegen::legal_moves(board)
        .into_iter()
        .find(|mv| {
            mv.from_sq() == from && mv.to_sq() == to && mv.kind.promotion() == promotion
        })
        .ok_or(IllegalMove::NotLegal)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("invalid square notation")]
    BadSquare,
    #[error("invalid promotion piece")]
    BadPromotion,
    #[error("move is not legal in this position")]
    NotLegal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid piece char '{0}'")]
    InvalidPiece(char),
    #[error("invalid side-to-move field")]
    InvalidSide,
    #[error("invalid castling char '{0}'")]
    InvalidCastling(char),
    #[error("invalid en-passant field")]
    InvalidEnPassant,
    #[error("invalid move counter")]
    InvalidCounter,
    #[error("each side needs exactly one king")]
    BadKingCount,
}

// Castling rights bit layout: bit 3 = K, bit 2 = Q, bit 1 = k, bit 0 = q
pub const CASTLE_WK: u8 = 0b1000;
pub const CASTLE_WQ: u8 = 0b0100;
pub const CASTLE_BK: u8 = 0b0010;
pub const CASTLE_BQ: u8 = 0b0001;

/// Irreversible state saved before a make_move, restored on unmake.
#[derive(Debug, Clone, Copy)]
pub struct Undo {
    pub prev_ep: Option<u8>,
    pub prev_castling: u8,
    pub prev_halfmove: u16,
    pub prev_fullmove: u16,
    pub prev_zobrist: u64,
}

/// Full-state position fingerprint used by the repetition history; compared
/// structurally, never by hash alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    piece_bb: [u64; 12],
    side: Color,
    castling: u8,
    ep: Option<u8>,
}

#[derive(Clone)]
pub struct Board {
    // 12 bitboards: 0-5 = white p,n,b,r,q,k; 6-11 = black p,n,b,r,q,k.
    // Invariant: pairwise disjoint. Occupancy is derived, never stored.
    piece_bb: [u64; 12],
    pub side: Color,
    pub castling: u8,
    pub ep: Option<u8>, // en-passant target square index or None
    pub halfmove: u16,
    pub fullmove: u16,
    pub zobrist: u64,
    // Positions seen on the path from game start through the current search
    // line, keyed by hash; pushed on make, popped on unmake.
    repetitions: HashMap<u64, Vec<Snapshot>>,
}

impl Board {
    /// Empty board to be populated via FEN setup.
    pub fn new() -> Self {
        Self {
            piece_bb: [0; 12],
            side: Color::White,
            castling: 0,
            ep: None,
            halfmove: 0,
            fullmove: 1,
            zobrist: 0,
            repetitions: HashMap::new(),
        }
    }

    pub fn piece_bb(&self, kind: PieceKind, color: Color) -> u64 {
        self.piece_bb[piece_index(kind, color)]
    }

    /// Occupancy of one side, derived from the piece bitboards.
    #[inline]
    pub fn occupancy(&self, color: Color) -> u64 {
        let base = (color as usize) * 6;
        self.piece_bb[base..base + 6].iter().fold(0, |a, b| a | b)
    }

    /// Combined occupancy of both sides.
    #[inline]
    pub fn occ(&self) -> u64 {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    #[inline]
    pub fn is_occupied(&self, sq: usize) -> bool {
        (1u64 << sq) & self.occ() != 0
    }

    /// King square of `side`; exactly one king per side is an invariant,
    /// enforced by the single-bit scan.
    #[inline]
    pub fn king_sq(&self, side: Color) -> usize {
        utils::single_bit_index(self.piece_bb(PieceKind::King, side))
    }

    pub fn piece_on(&self, sq: usize) -> Option<(PieceKind, Color)> {
        let mask = 1u64 << sq;
        for (i, bb) in self.piece_bb.iter().enumerate() {
            if bb & mask != 0 {
                let kind = PieceKind::ALL[i % 6];
                let color = if i < 6 { Color::White } else { Color::Black };
                return Some((kind, color));
            }
        }
        None
    }

    #[inline]
    fn set_piece(&mut self, sq: usize, kind: PieceKind, color: Color) {
        self.piece_bb[piece_index(kind, color)] |= 1u64 << sq;
        self.zobrist ^= zobrist::piece_key(kind, color, sq);
    }

    #[inline]
    fn remove_piece(&mut self, sq: usize, kind: PieceKind, color: Color) {
        self.piece_bb[piece_index(kind, color)] &= !(1u64 << sq);
        self.zobrist ^= zobrist::piece_key(kind, color, sq);
    }

    /// Is `sq` attacked by any piece of `by`, with the given occupancy?
    /// Occupancy is a parameter so callers can probe "what if" positions
    /// (king stepped away, en-passant pawns removed) without cloning.
    pub fn is_square_attacked_occ(&self, sq: usize, by: Color, occ: u64) -> bool {
        // Pawns: a pawn of `by` attacks sq iff sq "attacks back" as a pawn
        // of the defending color.
        let defender_index = by.opposite() as usize;
        if utils::pawn_attacks(defender_index, sq) & self.piece_bb(PieceKind::Pawn, by) != 0 {
            return true;
        }
        if utils::knight_attacks(sq) & self.piece_bb(PieceKind::Knight, by) != 0 {
            return true;
        }
        if utils::king_attacks(sq) & self.piece_bb(PieceKind::King, by) != 0 {
            return true;
        }
        let diag = self.piece_bb(PieceKind::Bishop, by) | self.piece_bb(PieceKind::Queen, by);
        if diag != 0 && utils::bishop_attacks(sq, occ) & diag != 0 {
            return true;
        }
        let ortho = self.piece_bb(PieceKind::Rook, by) | self.piece_bb(PieceKind::Queen, by);
        if ortho != 0 && utils::rook_attacks(sq, occ) & ortho != 0 {
            return true;
        }
        false
    }

    #[inline]
    pub fn is_square_attacked(&self, sq: usize, by: Color) -> bool {
        self.is_square_attacked_occ(sq, by, self.occ())
    }

    /// Is the side to move in check?
    #[inline]
    pub fn in_check(&self) -> bool {
        self.is_square_attacked(self.king_sq(self.side), self.side.opposite())
    }

    pub fn make_move(&mut self, mv: Move) -> Undo {
        let undo = Undo {
            prev_ep: self.ep,
            prev_castling: self.castling,
            prev_halfmove: self.halfmove,
            prev_fullmove: self.fullmove,
            prev_zobrist: self.zobrist,
        };
        let us = self.side;
        let them = us.opposite();
        let from = mv.from_sq();
        let to = mv.to_sq();
        let keys = zobrist::keys();

        // Old castling/ep keys out; the new ones go back in at the end.
        self.zobrist ^= keys.castling[self.castling as usize];
        if let Some(ep_sq) = self.ep {
            self.zobrist ^= keys.ep_file[(ep_sq % 8) as usize];
        }

        match mv.kind {
            MoveKind::Quiet | MoveKind::DoublePush => {
                self.remove_piece(from, mv.piece, us);
                self.set_piece(to, mv.piece, us);
            }
            MoveKind::Capture(captured) => {
                self.remove_piece(to, captured, them);
                self.remove_piece(from, mv.piece, us);
                self.set_piece(to, mv.piece, us);
            }
            MoveKind::EnPassant => {
                // the captured pawn is not on the destination square
                let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
                self.remove_piece(cap_sq, PieceKind::Pawn, them);
                self.remove_piece(from, PieceKind::Pawn, us);
                self.set_piece(to, PieceKind::Pawn, us);
            }
            MoveKind::CastleKing => {
                let (rook_from, rook_to) = if us == Color::White { (7, 5) } else { (63, 61) };
                self.remove_piece(from, PieceKind::King, us);
                self.set_piece(to, PieceKind::King, us);
                self.remove_piece(rook_from, PieceKind::Rook, us);
                self.set_piece(rook_to, PieceKind::Rook, us);
            }
            MoveKind::CastleQueen => {
                let (rook_from, rook_to) = if us == Color::White { (0, 3) } else { (56, 59) };
                self.remove_piece(from, PieceKind::King, us);
                self.set_piece(to, PieceKind::King, us);
                self.remove_piece(rook_from, PieceKind::Rook, us);
                self.set_piece(rook_to, PieceKind::Rook, us);
            }
            MoveKind::Promotion(promo) => {
                self.remove_piece(from, PieceKind::Pawn, us);
                self.set_piece(to, promo, us);
            }
            MoveKind::PromotionCapture { promo, captured } => {
                self.remove_piece(to, captured, them);
                self.remove_piece(from, PieceKind::Pawn, us);
                self.set_piece(to, promo, us);
            }
        }

        self.update_castling_rights(us, mv.piece, from);
        if mv.kind.captured() == Some(PieceKind::Rook) {
            self.clear_castling_on_rook_square(to);
        }

        self.ep = if mv.kind == MoveKind::DoublePush {
            Some(((from + to) / 2) as u8)
        } else {
            None
        };

        self.halfmove = if mv.piece == PieceKind::Pawn || mv.kind.is_capture() {
            0
        } else {
            self.halfmove + 1
        };
        self.side = them;
        if self.side == Color::White {
            self.fullmove += 1;
        }

        self.zobrist ^= keys.castling[self.castling as usize];
        if let Some(ep_sq) = self.ep {
            self.zobrist ^= keys.ep_file[(ep_sq % 8) as usize];
        }
        self.zobrist ^= keys.side;

        self.push_repetition();
        undo
    }

    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        // pop while the hash still identifies the position being left
        self.pop_repetition();

        let us = self.side.opposite(); // the side that made the move
        let them = self.side;
        let from = mv.from_sq();
        let to = mv.to_sq();

        match mv.kind {
            MoveKind::Quiet | MoveKind::DoublePush => {
                self.remove_piece(to, mv.piece, us);
                self.set_piece(from, mv.piece, us);
            }
            MoveKind::Capture(captured) => {
                self.remove_piece(to, mv.piece, us);
                self.set_piece(from, mv.piece, us);
                self.set_piece(to, captured, them);
            }
            MoveKind::EnPassant => {
                let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
                self.remove_piece(to, PieceKind::Pawn, us);
                self.set_piece(from, PieceKind::Pawn, us);
                self.set_piece(cap_sq, PieceKind::Pawn, them);
            }
            MoveKind::CastleKing => {
                let (rook_from, rook_to) = if us == Color::White { (7, 5) } else { (63, 61) };
                self.remove_piece(to, PieceKind::King, us);
                self.set_piece(from, PieceKind::King, us);
                self.remove_piece(rook_to, PieceKind::Rook, us);
                self.set_piece(rook_from, PieceKind::Rook, us);
            }
            MoveKind::CastleQueen => {
                let (rook_from, rook_to) = if us == Color::White { (0, 3) } else { (56, 59) };
                self.remove_piece(to, PieceKind::King, us);
                self.set_piece(from, PieceKind::King, us);
                self.remove_piece(rook_to, PieceKind::Rook, us);
                self.set_piece(rook_from, PieceKind::Rook, us);
            }
            MoveKind::Promotion(promo) => {
                self.remove_piece(to, promo, us);
                self.set_piece(from, PieceKind::Pawn, us);
            }
            MoveKind::PromotionCapture { promo, captured } => {
                self.remove_piece(to, promo, us);
                self.set_piece(from, PieceKind::Pawn, us);
                self.set_piece(to, captured, them);
            }
        }

        self.side = us;
        self.ep = undo.prev_ep;
        self.castling = undo.prev_castling;
        self.halfmove = undo.prev_halfmove;
        self.fullmove = undo.prev_fullmove;
        self.zobrist = undo.prev_zobrist;
    }

    /// Null move for null-move pruning: flip the side, clear en passant.
    pub fn make_null_move(&mut self) -> Undo {
        let undo = Undo {
            prev_ep: self.ep,
            prev_castling: self.castling,
            prev_halfmove: self.halfmove,
            prev_fullmove: self.fullmove,
            prev_zobrist: self.zobrist,
        };
        let keys = zobrist::keys();
        if let Some(ep_sq) = self.ep {
            self.zobrist ^= keys.ep_file[(ep_sq % 8) as usize];
        }
        self.ep = None;
        self.zobrist ^= keys.side;
        self.side = self.side.opposite();
        self.push_repetition();
        undo
    }

    pub fn unmake_null_move(&mut self, undo: Undo) {
        self.pop_repetition();
        self.side = self.side.opposite();
        self.ep = undo.prev_ep;
        self.castling = undo.prev_castling;
        self.halfmove = undo.prev_halfmove;
        self.fullmove = undo.prev_fullmove;
        self.zobrist = undo.prev_zobrist;
    }

    // Castling rights are cleared when the king or an unmoved rook leaves
    // its origin square.
    fn update_castling_rights(&mut self, side: Color, piece: PieceKind, from: usize) {
        if piece == PieceKind::King {
            match side {
                Color::White => self.castling &= !(CASTLE_WK | CASTLE_WQ),
                Color::Black => self.castling &= !(CASTLE_BK | CASTLE_BQ),
            }
        }
        if piece == PieceKind::Rook {
            self.clear_castling_on_rook_square(from);
        }
    }

    // Shared between "own rook moved" and "rook captured on origin square".
    fn clear_castling_on_rook_square(&mut self, sq: usize) {
        match sq {
            7 => self.castling &= !CASTLE_WK,
            0 => self.castling &= !CASTLE_WQ,
            63 => self.castling &= !CASTLE_BK,
            56 => self.castling &= !CASTLE_BQ,
            _ => {}
        }
    }

    pub fn recalc_zobrist(&self) -> u64 {
        zobrist::recalc_zobrist_full(self)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            piece_bb: self.piece_bb,
            side: self.side,
            castling: self.castling,
            ep: self.ep,
        }
    }

    fn push_repetition(&mut self) {
        let snap = self.snapshot();
        self.repetitions.entry(self.zobrist).or_default().push(snap);
    }

    fn pop_repetition(&mut self) {
        if let Some(bucket) = self.repetitions.get_mut(&self.zobrist) {
            bucket.pop();
            if bucket.is_empty() {
                self.repetitions.remove(&self.zobrist);
            }
        }
    }

    /// Draw by repetition: the current position matches two prior entries
    /// in its bucket, by full-state comparison rather than hash equality.
    pub fn is_draw_by_repetition(&self) -> bool {
        let current = self.snapshot();
        self.repetitions
            .get(&self.zobrist)
            .map(|bucket| bucket.iter().filter(|s| **s == current).count() >= 3)
            .unwrap_or(false)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// FEN parsing/setter
impl Board {
    /// Replace the position from a FEN string. Parsing happens on a scratch
    /// board: malformed input reports an error and leaves `self` untouched.
    pub fn set_from_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let mut fresh = Board::new();
        fresh.parse_fen(fen)?;
        fresh.zobrist = fresh.recalc_zobrist();
        // the starting position itself counts toward repetition
        fresh.push_repetition();
        *self = fresh;
        Ok(())
    }

    pub fn set_startpos(&mut self) {
        self.set_from_fen(START_FEN)
            .expect("standard starting FEN is valid");
    }

    fn parse_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let mut parts = fen.trim().split_whitespace();
        let piece_part = parts.next().ok_or(FenError::MissingField("pieces"))?;
        let side_part = parts.next().ok_or(FenError::MissingField("side"))?;
        let castle_part = parts.next().ok_or(FenError::MissingField("castling"))?;
        let ep_part = parts.next().ok_or(FenError::MissingField("en-passant"))?;
        let halfmove_part = parts.next().ok_or(FenError::MissingField("halfmove"))?;
        let fullmove_part = parts.next().ok_or(FenError::MissingField("fullmove"))?;

        // Piece placement: rank 8 down to rank 1
        let mut rank = 7i32;
        for rank_part in piece_part.split('/') {
            let mut file = 0usize;
            for ch in rank_part.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as usize;
                } else {
                    let (kind, color) = match ch {
                        'P' => (PieceKind::Pawn, Color::White),
                        'N' => (PieceKind::Knight, Color::White),
                        'B' => (PieceKind::Bishop, Color::White),
                        'R' => (PieceKind::Rook, Color::White),
                        'Q' => (PieceKind::Queen, Color::White),
                        'K' => (PieceKind::King, Color::White),
                        'p' => (PieceKind::Pawn, Color::Black),
                        'n' => (PieceKind::Knight, Color::Black),
                        'b' => (PieceKind::Bishop, Color::Black),
                        'r' => (PieceKind::Rook, Color::Black),
                        'q' => (PieceKind::Queen, Color::Black),
                        'k' => (PieceKind::King, Color::Black),
                        _ => return Err(FenError::InvalidPiece(ch)),
                    };
                    if rank < 0 || file > 7 {
                        return Err(FenError::InvalidPiece(ch));
                    }
                    let sq = rank as usize * 8 + file;
                    self.piece_bb[piece_index(kind, color)] |= 1u64 << sq;
                    file += 1;
                }
            }
            rank -= 1;
        }

        self.side = match side_part {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::InvalidSide),
        };

        self.castling = 0;
        for ch in castle_part.chars() {
            match ch {
                'K' => self.castling |= CASTLE_WK,
                'Q' => self.castling |= CASTLE_WQ,
                'k' => self.castling |= CASTLE_BK,
                'q' => self.castling |= CASTLE_BQ,
                '-' => {}
                _ => return Err(FenError::InvalidCastling(ch)),
            }
        }

        self.ep = match ep_part {
            "-" => None,
            s => {
                let bytes = s.as_bytes();
                if bytes.len() != 2 {
                    return Err(FenError::InvalidEnPassant);
                }
                let file = match bytes[0] {
                    f @ b'a'..=b'h' => (f - b'a') as usize,
                    _ => return Err(FenError::InvalidEnPassant),
                };
                let rank = match bytes[1] {
                    r @ (b'3' | b'6') => (r - b'1') as usize,
                    _ => return Err(FenError::InvalidEnPassant),
                };
                Some((rank * 8 + file) as u8)
            }
        };

        self.halfmove = halfmove_part.parse().map_err(|_| FenError::InvalidCounter)?;
        self.fullmove = fullmove_part.parse().map_err(|_| FenError::InvalidCounter)?;

        // the rest of the engine assumes both kings exist and are unique
        for color in [Color::White, Color::Black] {
            if self.piece_bb[piece_index(PieceKind::King, color)].count_ones() != 1 {
                return Err(FenError::BadKingCount);
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = rank * 8 + file;
                if let Some((p, c)) = self.piece_on(sq) {
                    let ch = match (c, p) {
                        (Color::White, PieceKind::Pawn) => 'P',
                        (Color::White, PieceKind::Knight) => 'N',
                        (Color::White, PieceKind::Bishop) => 'B',
                        (Color::White, PieceKind::Rook) => 'R',
                        (Color::White, PieceKind::Queen) => 'Q',
                        (Color::White, PieceKind::King) => 'K',
                        (Color::Black, PieceKind::Pawn) => 'p',
                        (Color::Black, PieceKind::Knight) => 'n',
                        (Color::Black, PieceKind::Bishop) => 'b',
                        (Color::Black, PieceKind::Rook) => 'r',
                        (Color::Black, PieceKind::Queen) => 'q',
                        (Color::Black, PieceKind::King) => 'k',
                    };
                    write!(f, "{} ", ch)?;
                } else {
                    write!(f, ". ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen;

    #[test]
    fn make_unmake_restores_state_bit_for_bit() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let original_hash = board.zobrist;
        let original_bb = board.piece_bb;
        for mv in movegen::legal_moves(&board) {
            let undo = board.make_move(mv);
            board.unmake_move(mv, undo);
            assert_eq!(board.zobrist, original_hash, "hash mismatch after {:?}", mv);
            assert_eq!(board.piece_bb, original_bb, "bitboards differ after {:?}", mv);
            assert_eq!(board.halfmove, 0);
            assert_eq!(board.ep, None);
            assert_eq!(board.castling, 0b1111);
        }
    }

    #[test]
    fn incremental_hash_matches_full_recompute() {
        crate::init();
        let mut board = Board::new();
        board
            .set_from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
        for mv in movegen::legal_moves(&board.clone()) {
            let undo = board.make_move(mv);
            assert_eq!(
                board.zobrist,
                board.recalc_zobrist(),
                "incremental hash diverged after {:?}",
                mv
            );
            board.unmake_move(mv, undo);
        }
    }

    #[test]
    fn double_push_sets_ep_target() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let mv = parse_uci_move(&board, "e2e4").unwrap();
        assert_eq!(mv.kind, MoveKind::DoublePush);
        board.make_move(mv);
        assert_eq!(board.ep, Some(20)); // e3
        // a quiet reply clears it
        let reply = parse_uci_move(&board, "g8f6").unwrap();
        board.make_move(reply);
        assert_eq!(board.ep, None);
    }

    #[test]
    fn rook_capture_clears_opponent_castling_right() {
        crate::init();
        let mut board = Board::new();
        board
            .set_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .unwrap();
        // Ra1xa8 removes black's queen-side right
        let mv = parse_uci_move(&board, "a1a8").unwrap();
        board.make_move(mv);
        assert_eq!(board.castling & CASTLE_BQ, 0);
        assert_ne!(board.castling & CASTLE_BK, 0);
        // white queen-side right went with the rook leaving a1
        assert_eq!(board.castling & CASTLE_WQ, 0);
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_moves_and_captures() {
        crate::init();
        let mut board = Board::new();
        board
            .set_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 12 7")
            .unwrap();
        let knight = parse_uci_move(&board, "g1f3").unwrap();
        board.make_move(knight);
        assert_eq!(board.halfmove, 13);
        let pawn = parse_uci_move(&board, "e7e5").unwrap();
        board.make_move(pawn);
        assert_eq!(board.halfmove, 0);
    }

    #[test]
    fn malformed_fen_leaves_board_unchanged() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let before = board.zobrist;
        assert!(board.set_from_fen("not a fen").is_err());
        assert!(board.set_from_fen("rnbqkbnr/pppppppp/8/8 w KQkq - 0").is_err());
        assert!(board
            .set_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1")
            .is_err());
        assert_eq!(board.zobrist, before);
    }

    #[test]
    fn fen_without_both_kings_is_rejected() {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        let before = board.zobrist;
        // empty board, missing one king, doubled king
        for fen in [
            "8/8/8/8/8/8/8/8 w - - 0 1",
            "8/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/2K1K3 w - - 0 1",
        ] {
            assert_eq!(board.set_from_fen(fen), Err(FenError::BadKingCount));
        }
        assert_eq!(board.zobrist, before);
    }

    #[test]
    fn en_passant_round_trip() {
        crate::init();
        let mut board = Board::new();
        board
            .set_from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3")
            .unwrap();
        let before = board.clone();
        let mv = parse_uci_move(&board, "d4e3").unwrap();
        assert_eq!(mv.kind, MoveKind::EnPassant);
        let undo = board.make_move(mv);
        // the captured pawn vanished from e4, not from e3
        assert_eq!(board.piece_on(28), None);
        assert_eq!(board.piece_on(20), Some((PieceKind::Pawn, Color::Black)));
        board.unmake_move(mv, undo);
        assert_eq!(board.piece_bb, before.piece_bb);
        assert_eq!(board.zobrist, before.zobrist);
    }
}

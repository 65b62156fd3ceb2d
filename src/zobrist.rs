// Zobrist hashing with precomputed key tables.
//
// Every board feature (piece on square, side to move, castling rights,
// en-passant file) gets an independent pseudorandom 64-bit key; a position
// hash is the XOR of the keys of its features, which makes incremental
// update on make/unmake a handful of XORs.

use crate::board::{Board, Color, PieceKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

/// Fixed seed so hashes are reproducible across runs and processes.
const KEY_SEED: u64 = 0x5cacc1_157a;

pub struct ZobristKeys {
    /// [piece_index][square]
    pub piece: [[u64; 64]; 12],
    pub side: u64,
    /// Indexed by the 4-bit castling rights mask.
    pub castling: [u64; 16],
    /// Indexed by en-passant file.
    pub ep_file: [u64; 8],
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

fn generate_keys() -> ZobristKeys {
    let mut rng = StdRng::seed_from_u64(KEY_SEED);
    let mut piece = [[0u64; 64]; 12];
    for row in piece.iter_mut() {
        for key in row.iter_mut() {
            *key = rng.gen();
        }
    }
    let side = rng.gen();
    let mut castling = [0u64; 16];
    for key in castling.iter_mut() {
        *key = rng.gen();
    }
    let mut ep_file = [0u64; 8];
    for key in ep_file.iter_mut() {
        *key = rng.gen();
    }
    ZobristKeys {
        piece,
        side,
        castling,
        ep_file,
    }
}

#[inline]
pub fn keys() -> &'static ZobristKeys {
    KEYS.get_or_init(generate_keys)
}

pub fn init_zobrist() {
    keys();
}

fn piece_index(kind: PieceKind, color: Color) -> usize {
    (color as usize) * 6 + (kind as usize)
}

#[inline]
pub fn piece_key(kind: PieceKind, color: Color, sq: usize) -> u64 {
    keys().piece[piece_index(kind, color)][sq]
}

/// Recompute the hash of a position from scratch. Used at FEN setup and by
/// tests to cross-check the incremental updates in make/unmake.
pub fn recalc_zobrist_full(board: &Board) -> u64 {
    let keys = keys();
    let mut h = 0u64;
    for kind in PieceKind::ALL {
        for color in [Color::White, Color::Black] {
            let mut bb = board.piece_bb(kind, color);
            while let Some(sq) = crate::utils::pop_lsb(&mut bb) {
                h ^= keys.piece[piece_index(kind, color)][sq];
            }
        }
    }
    if board.side == Color::Black {
        h ^= keys.side;
    }
    h ^= keys.castling[board.castling as usize];
    if let Some(ep_sq) = board.ep {
        h ^= keys.ep_file[(ep_sq % 8) as usize];
    }
    h
}

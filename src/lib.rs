//! A UCI chess engine: bitboard position, fully legal move generation,
//! material-and-mobility evaluation and an iterative-deepening alpha-beta
//! search with a transposition table.

pub mod board;
pub mod eval;
pub mod movegen;
pub mod search;
pub mod time;
pub mod uci;
pub mod utils;
pub mod zobrist;

pub use board::{Board, Color, Move, MoveKind, PieceKind, START_FEN};
pub use search::{Search, SearchParams, SearchResult};

/// Initialize the precomputed tables. Idempotent and cheap after the first
/// call; the UCI entry point and every test front door go through here.
pub fn init() {
    utils::init_attack_tables();
    zobrist::init_zobrist();
}

// Known-good perft totals for the standard validation positions, plus a
// shakmaty cross-check so any divergence points at our generator.

use alfiere::board::Board;
use alfiere::movegen;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn perft(fen: &str, depth: u8) -> u64 {
    alfiere::init();
    let mut board = Board::new();
    board.set_from_fen(fen).unwrap();
    movegen::perft(&mut board, depth)
}

fn shakmaty_perft(fen: &str, depth: u8) -> u64 {
    let parsed: Fen = fen.parse().unwrap();
    let position: Chess = parsed.into_position(CastlingMode::Standard).unwrap();
    count_nodes(&position, depth)
}

fn count_nodes(pos: &Chess, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for m in pos.legal_moves() {
        let mut next = pos.clone();
        next.play_unchecked(&m);
        nodes += count_nodes(&next, depth - 1);
    }
    nodes
}

#[test]
fn startpos_node_counts() {
    assert_eq!(perft(alfiere::START_FEN, 1), 20);
    assert_eq!(perft(alfiere::START_FEN, 2), 400);
    assert_eq!(perft(alfiere::START_FEN, 3), 8_902);
    assert_eq!(perft(alfiere::START_FEN, 4), 197_281);
}

#[test]
fn kiwipete_node_counts() {
    // castling, pins, ep and promotions all in play
    assert_eq!(perft(KIWIPETE, 1), 48);
    assert_eq!(perft(KIWIPETE, 2), 2_039);
    assert_eq!(perft(KIWIPETE, 3), 97_862);
}

#[test]
fn endgame_with_en_passant_node_counts() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    assert_eq!(perft(fen, 1), 14);
    assert_eq!(perft(fen, 2), 191);
    assert_eq!(perft(fen, 3), 2_812);
    assert_eq!(perft(fen, 4), 43_238);
}

#[test]
fn promotion_heavy_position_node_counts() {
    let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    assert_eq!(perft(fen, 1), 6);
    assert_eq!(perft(fen, 2), 264);
    assert_eq!(perft(fen, 3), 9_467);
}

#[test]
fn middlegame_position_node_counts() {
    let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    assert_eq!(perft(fen, 1), 44);
    assert_eq!(perft(fen, 2), 1_486);
    assert_eq!(perft(fen, 3), 62_379);
}

#[test]
fn agrees_with_shakmaty_on_assorted_positions() {
    let fens = [
        alfiere::START_FEN,
        KIWIPETE,
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        "4k3/8/8/8/8/8/8/4K2R w K - 0 1",
        "8/8/8/8/k2Pp2Q/8/8/4K3 b - d3 0 1",
    ];
    for fen in fens {
        for depth in 1..=3 {
            assert_eq!(
                perft(fen, depth),
                shakmaty_perft(fen, depth),
                "divergence at depth {} from {}",
                depth,
                fen
            );
        }
    }
}

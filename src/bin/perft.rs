// Perft driver: counts legal move tree nodes, optionally per root move,
// and cross-checks the totals against shakmaty.

use std::time::Instant;

use clap::Parser;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position};

use alfiere::board::Board;
use alfiere::movegen;

#[derive(Parser)]
#[command(name = "perft", about = "Count legal chess move tree nodes")]
struct Args {
    /// Root position as FEN
    #[arg(short, long, default_value_t = String::from(alfiere::START_FEN))]
    fen: String,

    /// Tree depth in plies
    #[arg(short, long, default_value_t = 5)]
    depth: u8,

    /// Print per-root-move subtotals
    #[arg(long)]
    divide: bool,

    /// Cross-check the total against shakmaty
    #[arg(long)]
    check: bool,
}

fn main() {
    env_logger::init();
    alfiere::init();
    let args = Args::parse();

    let mut board = Board::new();
    if let Err(err) = board.set_from_fen(&args.fen) {
        eprintln!("bad fen '{}': {}", args.fen, err);
        std::process::exit(1);
    }

    if args.divide {
        for (mv, nodes) in movegen::perft_divide(&mut board, args.depth) {
            println!("{}: {}", mv.to_uci(), nodes);
        }
    }

    let started = Instant::now();
    let nodes = movegen::perft(&mut board, args.depth);
    let elapsed = started.elapsed();
    let nps = (nodes as f64 / elapsed.as_secs_f64().max(1e-9)) as u64;
    println!(
        "perft({}) = {} in {} ms ({} nps)",
        args.depth,
        nodes,
        elapsed.as_millis(),
        nps
    );

    if args.check {
        let expected = shakmaty_nodes(&args.fen, args.depth);
        if nodes == expected {
            println!("shakmaty agrees: {}", expected);
        } else {
            eprintln!("MISMATCH: shakmaty says {}", expected);
            std::process::exit(1);
        }
    }
}

fn shakmaty_nodes(fen: &str, depth: u8) -> u64 {
    let parsed: Fen = match fen.parse() {
        Ok(f) => f,
        Err(err) => {
            eprintln!("shakmaty rejected fen: {}", err);
            std::process::exit(1);
        }
    };
    let position: Chess = match parsed.into_position(CastlingMode::Standard) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("shakmaty rejected position: {}", err);
            std::process::exit(1);
        }
    };
    perft_shakmaty(&position, depth)
}

fn perft_shakmaty(pos: &Chess, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for m in pos.legal_moves() {
        let mut next = pos.clone();
        next.play_unchecked(&m);
        nodes += perft_shakmaty(&next, depth - 1);
    }
    nodes
}

// Engine state machine behind the line protocol.
//
// The loop thread owns the authoritative position and never blocks on a
// running search: `go` hands a copy of the board to a background worker,
// which prints its own info and bestmove lines. Everything else is
// answered synchronously as a list of reply lines.

use std::io::{BufRead, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};

use crate::board::{parse_uci_move, Board, START_FEN};
use crate::movegen;
use crate::search::{SearchParams, SearchWorker};

use super::parser::{self, UciCommand};

const ENGINE_NAME: &str = concat!("alfiere ", env!("CARGO_PKG_VERSION"));

pub struct UciEngine {
    board: Board,
    worker: Option<SearchWorker>,
    stop: Arc<AtomicBool>,
}

impl UciEngine {
    pub fn new() -> Self {
        crate::init();
        let mut board = Board::new();
        board.set_startpos();
        Self {
            board,
            worker: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle one command and return the reply lines to print. Search
    /// output is not among them; the worker writes those itself.
    pub fn handle_command(&mut self, cmd: UciCommand) -> Vec<String> {
        match cmd {
            UciCommand::Uci => vec![
                format!("id name {}", ENGINE_NAME),
                "id author the alfiere authors".to_string(),
                "uciok".to_string(),
            ],
            UciCommand::IsReady => vec!["readyok".to_string()],
            UciCommand::UciNewGame => {
                self.abort_search();
                self.board.set_startpos();
                Vec::new()
            }
            UciCommand::Position { fen, moves } => {
                if let Err(err) = self.set_position(fen.as_deref(), &moves) {
                    warn!("position rejected: {}", err);
                    return vec![format!("info string position rejected: {}", err)];
                }
                Vec::new()
            }
            UciCommand::Go(params) => {
                self.start_search(params);
                Vec::new()
            }
            UciCommand::Stop => {
                self.abort_search();
                Vec::new()
            }
            UciCommand::Quit => Vec::new(),
            UciCommand::SetOption { name, value } => {
                // no configurable options; acknowledged by ignoring
                debug!("ignoring option {} = {:?}", name, value);
                Vec::new()
            }
            UciCommand::Display => vec![format!("{}", self.board)],
            UciCommand::Perft(depth) => {
                let mut scratch = self.board.clone();
                let started = Instant::now();
                let nodes = movegen::perft(&mut scratch, depth);
                vec![format!(
                    "perft {} nodes {} time {} ms",
                    depth,
                    nodes,
                    started.elapsed().as_millis()
                )]
            }
            UciCommand::Unknown(line) => {
                if !line.is_empty() {
                    warn!("unknown command: {}", line);
                }
                Vec::new()
            }
        }
    }

    /// Rebuild the position on a scratch board and swap it in only when
    /// the FEN and every move check out; bad input leaves the current
    /// position untouched.
    fn set_position(&mut self, fen: Option<&str>, moves: &[String]) -> Result<(), String> {
        let mut scratch = Board::new();
        scratch
            .set_from_fen(fen.unwrap_or(START_FEN))
            .map_err(|e| e.to_string())?;
        for mv_str in moves {
            let mv = parse_uci_move(&scratch, mv_str)
                .map_err(|e| format!("move {}: {}", mv_str, e))?;
            scratch.make_move(mv);
        }
        self.abort_search();
        self.board = scratch;
        Ok(())
    }

    /// Validate a single user move against the current position and apply
    /// it. The board is untouched when the move is not legal.
    pub fn try_user_move(&mut self, uci: &str) -> Result<(), crate::board::IllegalMove> {
        let mv = parse_uci_move(&self.board, uci)?;
        self.abort_search();
        self.board.make_move(mv);
        Ok(())
    }

    fn start_search(&mut self, params: SearchParams) {
        self.abort_search();
        self.worker = Some(SearchWorker::spawn(
            self.board.clone(),
            params,
            self.stop.clone(),
        ));
    }

    /// Stop any running worker and wait for its bestmove.
    fn abort_search(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }

    pub fn shutdown(&mut self) {
        self.abort_search();
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Read commands from stdin until quit, flushing after every reply.
pub fn run_uci_loop() {
    let mut engine = UciEngine::new();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        let cmd = parser::parse(&line);
        if cmd == UciCommand::Quit {
            engine.shutdown();
            break;
        }
        for reply in engine.handle_command(cmd) {
            println!("{}", reply);
        }
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uci_handshake_identifies_and_acknowledges() {
        let mut engine = UciEngine::new();
        let replies = engine.handle_command(parser::parse("uci"));
        assert!(replies.first().unwrap().starts_with("id name alfiere"));
        assert_eq!(replies.last().unwrap(), "uciok");
        assert_eq!(
            engine.handle_command(parser::parse("isready")),
            vec!["readyok"]
        );
    }

    #[test]
    fn position_with_moves_is_applied() {
        let mut engine = UciEngine::new();
        engine.handle_command(parser::parse("position startpos moves e2e4 e7e5"));
        // white pawn now on e4
        let e4 = crate::board::uci_to_square("e4").unwrap();
        assert!(engine.board.piece_on(e4).is_some());
        assert_eq!(engine.board.fullmove, 2);
    }

    #[test]
    fn bad_position_keeps_the_previous_one() {
        let mut engine = UciEngine::new();
        engine.handle_command(parser::parse("position startpos moves e2e4"));
        let hash = engine.board.zobrist;
        engine.handle_command(parser::parse("position startpos moves e2e5"));
        assert_eq!(engine.board.zobrist, hash, "illegal move must not apply");
        engine.handle_command(parser::parse("position fen not a fen"));
        assert_eq!(engine.board.zobrist, hash, "bad fen must not apply");
    }

    #[test]
    fn try_user_move_applies_only_legal_moves() {
        let mut engine = UciEngine::new();
        assert!(engine.try_user_move("e2e4").is_ok());
        let hash = engine.board.zobrist;
        assert!(engine.try_user_move("e2e4").is_err());
        assert!(engine.try_user_move("zz99").is_err());
        assert_eq!(engine.board.zobrist, hash);
    }

    #[test]
    fn setoption_is_acknowledged_by_ignoring() {
        let mut engine = UciEngine::new();
        let replies = engine.handle_command(parser::parse("setoption name Hash value 64"));
        assert!(replies.is_empty());
    }

    #[test]
    fn perft_command_reports_node_counts() {
        let mut engine = UciEngine::new();
        let replies = engine.handle_command(parser::parse("perft 2"));
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("nodes 400"));
    }
}

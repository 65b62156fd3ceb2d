// Single background search worker.
//
// The UCI loop hands the worker a copy of the position and a shared stop
// token, then goes back to reading stdin. The worker owns its own search
// session (transposition table included) and prints the bestmove line
// itself when the search winds down.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::debug;

use crate::board::Board;

use super::params::SearchParams;
use super::search::Search;

pub struct SearchWorker {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl SearchWorker {
    /// Start a search on its own thread. The token is shared with the
    /// caller so `stop` can interrupt from the protocol loop.
    pub fn spawn(board: Board, params: SearchParams, stop: Arc<AtomicBool>) -> Self {
        stop.store(false, Ordering::Relaxed);
        let token = stop.clone();
        let handle = std::thread::spawn(move || {
            let mut search = Search::new(board, token);
            let result = search.run(&params);
            debug!(
                "search finished: depth {} nodes {} in {:?}",
                result.depth, result.nodes, result.elapsed
            );
            match result.best_move {
                Some(mv) => println!("bestmove {}", mv.to_uci()),
                // no legal move to report (mate or stalemate on the board)
                None => println!("bestmove 0000"),
            }
            let _ = std::io::stdout().flush();
        });
        Self {
            handle: Some(handle),
            stop,
        }
    }

    /// Signal the worker to stop and wait for its bestmove.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.join();
    }

    /// Wait for the worker without signalling it.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.join();
    }
}

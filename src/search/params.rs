// Search limits assembled from a `go` command.

use std::time::Duration;

/// Everything a `go` command may constrain. Fields left `None` do not
/// limit the search; `infinite` overrides the clock fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub depth: Option<u8>,
    pub movetime: Option<Duration>,
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub infinite: bool,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(mut self, depth: u8) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn movetime(mut self, ms: u64) -> Self {
        self.movetime = Some(Duration::from_millis(ms));
        self
    }

    pub fn wtime(mut self, ms: u64) -> Self {
        self.wtime = Some(Duration::from_millis(ms));
        self
    }

    pub fn btime(mut self, ms: u64) -> Self {
        self.btime = Some(Duration::from_millis(ms));
        self
    }

    pub fn winc(mut self, ms: u64) -> Self {
        self.winc = Some(Duration::from_millis(ms));
        self
    }

    pub fn binc(mut self, ms: u64) -> Self {
        self.binc = Some(Duration::from_millis(ms));
        self
    }

    pub fn infinite(mut self) -> Self {
        self.infinite = true;
        self
    }
}

// Per-move time allocation from the `go` clock fields.

use crate::board::Color;
use crate::search::params::SearchParams;
use std::time::Duration;

/// Never allocate less than this, so a move always gets searched.
const MIN_BUDGET: Duration = Duration::from_millis(5);

/// Compute the soft time budget for this move, or `None` when the search
/// is unbounded (`infinite`, or depth-limited with no clock).
pub fn allocate(params: &SearchParams, side: Color) -> Option<Duration> {
    if params.infinite {
        return None;
    }
    if let Some(movetime) = params.movetime {
        return Some(movetime.max(MIN_BUDGET));
    }
    let (remaining, increment) = match side {
        Color::White => (params.wtime, params.winc),
        Color::Black => (params.btime, params.binc),
    };
    // a twentieth of the clock plus half the increment, never scheduling
    // past the clock itself
    remaining.map(|r| {
        let budget = r / 20 + increment.unwrap_or(Duration::ZERO) / 2;
        budget.min(r).max(MIN_BUDGET.min(r))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_wins_over_clock_fields() {
        let params = SearchParams::new().movetime(450).wtime(60_000);
        assert_eq!(
            allocate(&params, Color::White),
            Some(Duration::from_millis(450))
        );
    }

    #[test]
    fn clock_allocation_splits_remaining_time() {
        let params = SearchParams::new().wtime(60_000).winc(1_000);
        // 60000/20 + 1000/2 = 3500ms
        assert_eq!(
            allocate(&params, Color::White),
            Some(Duration::from_millis(3_500))
        );
        // black uses its own clock
        let params = SearchParams::new().wtime(60_000).btime(20_000);
        assert_eq!(
            allocate(&params, Color::Black),
            Some(Duration::from_millis(1_000))
        );
    }

    #[test]
    fn depth_only_and_infinite_searches_are_unbounded() {
        assert_eq!(allocate(&SearchParams::new().depth(6), Color::White), None);
        assert_eq!(
            allocate(&SearchParams::new().infinite().wtime(1_000), Color::White),
            None
        );
    }

    #[test]
    fn tiny_clocks_still_get_the_floor() {
        let params = SearchParams::new().wtime(10);
        assert_eq!(allocate(&params, Color::White), Some(MIN_BUDGET));
    }

    #[test]
    fn budget_never_exceeds_the_remaining_clock() {
        // a huge increment cannot schedule past a nearly flagged clock
        let params = SearchParams::new().wtime(100).winc(60_000);
        assert_eq!(
            allocate(&params, Color::White),
            Some(Duration::from_millis(100))
        );
        // nor can the floor when the clock is below it
        let params = SearchParams::new().wtime(3);
        assert_eq!(
            allocate(&params, Color::White),
            Some(Duration::from_millis(3))
        );
    }
}

// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Time-based termination for local search.
//!
//! `TimeLimitMonitor` records the start of the run in `on_start` and ends the
//! run once the elapsed wall-clock time reaches the limit. By default the clock
//! is read at the top of every iteration, so a run overshoots its limit by at
//! most one iteration. For very cheap iterations the check can be throttled
//! with `with_mask`: the clock is then only read when
//! `iterations & mask == 0`.

use crate::{
    monitor::local_search_monitor::{LocalSearchMonitor, SearchCommand},
    result::LocalSearchTerminationReason,
    state::SearchState,
    stats::LocalSearchStatistics,
};
use std::time::{Duration, Instant};

/// A wall-clock monitor that terminates a local search after a fixed duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLimitMonitor {
    start_time: Instant,
    time_limit: Duration,
    clock_check_mask: u64,
}

impl TimeLimitMonitor {
    /// Creates a new `TimeLimitMonitor` that reads the clock every iteration.
    pub fn new(time_limit: Duration) -> Self {
        Self::with_mask(time_limit, 0)
    }

    /// Creates a new `TimeLimitMonitor` with a custom clock check mask.
    /// Lower mask values check more often; higher values check less often.
    pub fn with_mask(time_limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            time_limit,
            clock_check_mask,
        }
    }

    /// Returns the configured time limit.
    #[inline]
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

impl LocalSearchMonitor for TimeLimitMonitor {
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_start(&mut self, _state: &SearchState) {
        self.start_time = Instant::now();
    }

    fn on_end(
        &mut self,
        _state: &SearchState,
        _statistics: &LocalSearchStatistics,
        _reason: &LocalSearchTerminationReason,
    ) {
    }

    fn on_iteration(&mut self, _state: &SearchState, _statistics: &LocalSearchStatistics) {}

    fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
        if (statistics.iterations & self.clock_check_mask) == 0
            && self.start_time.elapsed() >= self.time_limit
        {
            return SearchCommand::Terminate(LocalSearchTerminationReason::TimeLimit);
        }
        SearchCommand::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_terminates() {
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO);
        assert_eq!(
            monitor.search_command(&LocalSearchStatistics::default()),
            SearchCommand::Terminate(LocalSearchTerminationReason::TimeLimit)
        );
    }

    #[test]
    fn test_long_limit_continues() {
        let mut monitor = TimeLimitMonitor::new(Duration::from_secs(3600));
        assert_eq!(
            monitor.search_command(&LocalSearchStatistics::default()),
            SearchCommand::Continue
        );
    }

    #[test]
    fn test_mask_skips_clock_reads() {
        let mut monitor = TimeLimitMonitor::with_mask(Duration::ZERO, 0xFF);
        let mut stats = LocalSearchStatistics {
            iterations: 1,
            ..Default::default()
        };
        assert_eq!(monitor.search_command(&stats), SearchCommand::Continue);
        stats.iterations = 256;
        assert_eq!(
            monitor.search_command(&stats),
            SearchCommand::Terminate(LocalSearchTerminationReason::TimeLimit)
        );
    }
}

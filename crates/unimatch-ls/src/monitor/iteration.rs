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

use crate::{
    monitor::local_search_monitor::{LocalSearchMonitor, SearchCommand},
    result::LocalSearchTerminationReason,
    state::SearchState,
    stats::LocalSearchStatistics,
};

/// Terminates the search once a fixed number of iterations has been performed.
///
/// Iterations include degenerate proposals, so a limit makes a seeded run
/// fully reproducible regardless of machine speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationLimitMonitor {
    max_iterations: u64,
}

impl IterationLimitMonitor {
    #[inline]
    pub fn new(max_iterations: u64) -> Self {
        Self { max_iterations }
    }

    #[inline]
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }
}

impl LocalSearchMonitor for IterationLimitMonitor {
    fn name(&self) -> &str {
        "IterationLimitMonitor"
    }

    fn on_start(&mut self, _state: &SearchState) {}

    fn on_end(
        &mut self,
        _state: &SearchState,
        _statistics: &LocalSearchStatistics,
        _reason: &LocalSearchTerminationReason,
    ) {
    }

    fn on_iteration(&mut self, _state: &SearchState, _statistics: &LocalSearchStatistics) {}

    #[inline]
    fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
        if statistics.iterations >= self.max_iterations {
            SearchCommand::Terminate(LocalSearchTerminationReason::IterationLimit)
        } else {
            SearchCommand::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminates_at_limit() {
        let mut monitor = IterationLimitMonitor::new(10);
        let mut stats = LocalSearchStatistics {
            iterations: 9,
            ..Default::default()
        };
        assert_eq!(monitor.search_command(&stats), SearchCommand::Continue);
        stats.iterations = 10;
        assert_eq!(
            monitor.search_command(&stats),
            SearchCommand::Terminate(LocalSearchTerminationReason::IterationLimit)
        );
    }
}

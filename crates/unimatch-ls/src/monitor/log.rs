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

//! Progress reporting through `tracing`.
//!
//! `LogMonitor` emits an `info` event when the run starts, a `debug` event for
//! every new best score, an `info` progress event every `log_interval`, and an
//! `info` summary when the run ends. It never requests termination.

use crate::{
    monitor::local_search_monitor::LocalSearchMonitor, result::LocalSearchTerminationReason,
    state::SearchState, stats::LocalSearchStatistics,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A monitor that reports the progress of a run as structured log events.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    policy: String,
    log_interval: Duration,
    clock_check_mask: u64,
    start_time: Instant,
    last_report: Instant,
    initial_score: f64,
}

impl LogMonitor {
    /// Clock reads for the progress line happen every 1024 iterations.
    const DEFAULT_CLOCK_CHECK_MASK: u64 = 0x03FF;

    /// Creates a monitor that labels its events with `policy` and reports
    /// progress every `log_interval`.
    pub fn new<S>(policy: S, log_interval: Duration) -> Self
    where
        S: Into<String>,
    {
        let now = Instant::now();
        Self {
            policy: policy.into(),
            log_interval,
            clock_check_mask: Self::DEFAULT_CLOCK_CHECK_MASK,
            start_time: now,
            last_report: now,
            initial_score: 0.0,
        }
    }

    /// Overrides how often the clock is read for the progress line.
    pub fn with_mask(mut self, clock_check_mask: u64) -> Self {
        self.clock_check_mask = clock_check_mask;
        self
    }
}

impl LocalSearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_start(&mut self, state: &SearchState) {
        self.start_time = Instant::now();
        self.last_report = self.start_time;
        self.initial_score = state.current_score();

        let current = state.current();
        info!(
            policy = %self.policy,
            fpe = current.student,
            fpu = current.university,
            score = current.score,
            "local search started"
        );
    }

    fn on_end(
        &mut self,
        state: &SearchState,
        statistics: &LocalSearchStatistics,
        reason: &LocalSearchTerminationReason,
    ) {
        info!(
            policy = %self.policy,
            %reason,
            iterations = statistics.iterations,
            improvements = statistics.improving_moves,
            worsening_accepted = statistics.worsening_moves,
            degenerate = statistics.degenerate_moves,
            new_bests = statistics.new_bests,
            elapsed = ?statistics.time_total,
            initial_score = self.initial_score,
            best_score = state.best_score(),
            "local search finished"
        );
    }

    fn on_iteration(&mut self, state: &SearchState, statistics: &LocalSearchStatistics) {
        if statistics.iterations & self.clock_check_mask != 0 {
            return;
        }
        let now = Instant::now();
        if now.duration_since(self.last_report) < self.log_interval {
            return;
        }
        self.last_report = now;

        info!(
            iteration = statistics.iterations,
            best_score = state.best_score(),
            current_score = state.current_score(),
            worsening_accepted = statistics.worsening_moves,
            elapsed = ?now.duration_since(self.start_time),
            "progress"
        );
    }

    fn on_new_best(&mut self, state: &SearchState, statistics: &LocalSearchStatistics) {
        debug!(
            iteration = statistics.iterations,
            best_score = state.best_score(),
            gain = state.best_score() - self.initial_score,
            "new best"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{monitor::local_search_monitor::SearchCommand, objective::Objective, testing};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_lifecycle_without_subscriber() {
        let (model, assignment) =
            testing::random_instance(&mut ChaCha8Rng::seed_from_u64(4), 8, 3);
        let state = SearchState::new(&model, &Objective::default(), assignment, true);
        let mut monitor = LogMonitor::new("SimulatedAnnealing", Duration::ZERO).with_mask(0);
        let stats = LocalSearchStatistics::default();

        monitor.on_start(&state);
        monitor.on_iteration(&state, &stats);
        monitor.on_new_best(&state, &stats);
        monitor.on_end(&state, &stats, &LocalSearchTerminationReason::TimeLimit);

        assert_eq!(monitor.initial_score, state.current_score());
        assert_eq!(monitor.search_command(&stats), SearchCommand::Continue);
    }
}

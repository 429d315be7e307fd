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
    eval::SwapDelta, monitor::local_search_monitor::LocalSearchMonitor,
    monitor::local_search_monitor::SearchCommand, operator::Swap,
    result::LocalSearchTerminationReason, state::SearchState, stats::LocalSearchStatistics,
};

/// Forwards every callback to a list of monitors, in insertion order.
#[derive(Default)]
pub struct CompositeLocalSearchMonitor<'a> {
    monitors: Vec<Box<dyn LocalSearchMonitor + 'a>>,
}

impl<'a> CompositeLocalSearchMonitor<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: LocalSearchMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    #[inline]
    pub fn add_boxed_monitor(&mut self, monitor: Box<dyn LocalSearchMonitor + 'a>) {
        self.monitors.push(monitor);
    }

    #[inline]
    pub fn monitors(&self) -> &[Box<dyn LocalSearchMonitor + 'a>] {
        &self.monitors
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl std::fmt::Debug for CompositeLocalSearchMonitor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeLocalSearchMonitor")
            .field("monitors", &self.monitors)
            .finish()
    }
}

impl LocalSearchMonitor for CompositeLocalSearchMonitor<'_> {
    fn name(&self) -> &str {
        "CompositeLocalSearchMonitor"
    }

    fn on_start(&mut self, state: &SearchState) {
        for m in &mut self.monitors {
            m.on_start(state);
        }
    }

    fn on_end(
        &mut self,
        state: &SearchState,
        statistics: &LocalSearchStatistics,
        reason: &LocalSearchTerminationReason,
    ) {
        for m in &mut self.monitors {
            m.on_end(state, statistics, reason);
        }
    }

    fn on_iteration(&mut self, state: &SearchState, statistics: &LocalSearchStatistics) {
        for m in &mut self.monitors {
            m.on_iteration(state, statistics);
        }
    }

    fn on_move_accepted(
        &mut self,
        swap: Swap,
        delta: &SwapDelta,
        state: &SearchState,
        statistics: &LocalSearchStatistics,
    ) {
        for m in &mut self.monitors {
            m.on_move_accepted(swap, delta, state, statistics);
        }
    }

    fn on_move_rejected(
        &mut self,
        swap: Swap,
        delta: &SwapDelta,
        statistics: &LocalSearchStatistics,
    ) {
        for m in &mut self.monitors {
            m.on_move_rejected(swap, delta, statistics);
        }
    }

    fn on_new_best(&mut self, state: &SearchState, statistics: &LocalSearchStatistics) {
        for m in &mut self.monitors {
            m.on_new_best(state, statistics);
        }
    }

    fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
        for m in &mut self.monitors {
            match m.search_command(statistics) {
                SearchCommand::Continue => continue,
                // Return the first terminate request to keep ordering deterministic
                SearchCommand::Terminate(reason) => return SearchCommand::Terminate(reason),
            }
        }
        SearchCommand::Continue
    }
}

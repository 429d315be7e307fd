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

//! Monitoring interface for local search runs.
//!
//! Callbacks cover the lifecycle of a run: start and end, every iteration,
//! accepted and rejected moves, and new best scores. A monitor can end the
//! run by returning `SearchCommand::Terminate` from `search_command`, which
//! the engine polls at the top of every iteration. Only `on_start`, `on_end`
//! and `on_iteration` must be implemented; the rest default to no-ops so that
//! limit monitors stay small.

use crate::{
    eval::SwapDelta, operator::Swap, result::LocalSearchTerminationReason, state::SearchState,
    stats::LocalSearchStatistics,
};

/// The decision of a monitor or metaheuristic between two iterations.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    Terminate(LocalSearchTerminationReason),
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate: {}", reason),
        }
    }
}

/// A monitor for local search runs.
pub trait LocalSearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;

    /// Called at the start of the local search.
    fn on_start(&mut self, state: &SearchState);

    /// Called at the end of the local search.
    fn on_end(
        &mut self,
        state: &SearchState,
        statistics: &LocalSearchStatistics,
        reason: &LocalSearchTerminationReason,
    );

    /// Called at the end of each iteration.
    fn on_iteration(&mut self, state: &SearchState, statistics: &LocalSearchStatistics);

    /// Called after a move was applied to `state`.
    fn on_move_accepted(
        &mut self,
        _swap: Swap,
        _delta: &SwapDelta,
        _state: &SearchState,
        _statistics: &LocalSearchStatistics,
    ) {
    }

    /// Called after a move was rejected.
    fn on_move_rejected(
        &mut self,
        _swap: Swap,
        _delta: &SwapDelta,
        _statistics: &LocalSearchStatistics,
    ) {
    }

    /// Called when the best score improves.
    fn on_new_best(&mut self, _state: &SearchState, _statistics: &LocalSearchStatistics) {}

    /// Determines the command for the next step of the local search.
    fn search_command(&mut self, _statistics: &LocalSearchStatistics) -> SearchCommand {
        SearchCommand::Continue
    }
}

impl std::fmt::Debug for dyn LocalSearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalSearchMonitor {{ name: {} }}", self.name())
    }
}

impl std::fmt::Display for dyn LocalSearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalSearchMonitor: {}", self.name())
    }
}

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

//! Metaheuristic interface for local search control.
//!
//! The trait separates move generation and evaluation from the acceptance
//! decision. A metaheuristic sees the evaluated delta of every non-degenerate
//! move and the current search state, decides whether the move is kept, and
//! may request termination between iterations.

use crate::{eval::SwapDelta, monitor::local_search_monitor::SearchCommand, state::SearchState};

/// A trait governing the acceptance logic and termination of the local search.
pub trait Metaheuristic: Send {
    /// Returns the name of the metaheuristic.
    fn name(&self) -> &str;

    /// Returns `true` if the policy can accept worsening moves, in which case the
    /// engine keeps a snapshot of the best assignment next to the current one.
    fn tracks_best_assignment(&self) -> bool;

    /// Called at the start of the search.
    fn on_start(&mut self, state: &SearchState);

    /// Determines if the search should proceed to the next iteration.
    fn search_command(&mut self, iteration: u64, state: &SearchState) -> SearchCommand;

    /// Decides whether to apply a move with the given `delta` to `state`.
    fn should_accept(&mut self, delta: &SwapDelta, state: &SearchState) -> bool;

    /// Called after a move was applied.
    fn on_accept(&mut self, state: &SearchState);

    /// Called after a move was rejected.
    fn on_reject(&mut self, state: &SearchState);

    /// Called when a new best score is reached.
    fn on_new_best(&mut self, state: &SearchState);
}

impl std::fmt::Debug for dyn Metaheuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metaheuristic {{ name: {} }}", self.name())
    }
}

impl std::fmt::Display for dyn Metaheuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metaheuristic: {}", self.name())
    }
}

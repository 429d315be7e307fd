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

//! Greedy Descent (first-improvement hill climbing).
//!
//! A proposed swap is committed as soon as it strictly increases the score,
//! and every other swap is rejected. Equal-score swaps are not taken, so the
//! search never drifts across plateaus. Since the score never decreases, the
//! current assignment is always the best one and no snapshot is kept.

use crate::{
    eval::SwapDelta, meta::metaheuristic::Metaheuristic,
    monitor::local_search_monitor::SearchCommand, state::SearchState,
};

/// A Greedy Descent metaheuristic.
///
/// # Attributes
/// * **Acceptance:** Strict improvement (`delta > 0`).
/// * **Termination:** Left to the monitors (time, iteration or interrupt).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyDescent;

impl GreedyDescent {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Metaheuristic for GreedyDescent {
    fn name(&self) -> &str {
        "GreedyDescent"
    }

    fn tracks_best_assignment(&self) -> bool {
        false
    }

    fn on_start(&mut self, _state: &SearchState) {}

    fn search_command(&mut self, _iteration: u64, _state: &SearchState) -> SearchCommand {
        SearchCommand::Continue
    }

    #[inline]
    fn should_accept(&mut self, delta: &SwapDelta, _state: &SearchState) -> bool {
        delta.score > 0.0
    }

    fn on_accept(&mut self, _state: &SearchState) {}

    fn on_reject(&mut self, _state: &SearchState) {}

    fn on_new_best(&mut self, _state: &SearchState) {}
}

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

//! Statistics reporting for local search runs.
//!
//! Counters are updated in the hot loop with saturating arithmetic and read
//! by monitors, the outcome and the final summary.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LocalSearchStatistics {
    /// Number of iterations performed, degenerate proposals included.
    pub iterations: u64,

    /// Number of proposals skipped because they could not change the assignment.
    pub degenerate_moves: u64,

    /// Number of proposals that were evaluated and decided.
    pub evaluated_moves: u64,

    /// Number of accepted moves that strictly improved the score.
    pub improving_moves: u64,

    /// Number of accepted moves that did not improve the score.
    pub worsening_moves: u64,

    /// Number of rejected moves.
    pub rejected_moves: u64,

    /// Number of times the best score improved.
    pub new_bests: u64,

    /// Total time taken by the local search.
    pub time_total: Duration,
}

impl LocalSearchStatistics {
    /// Called at each iteration of the local search.
    #[inline]
    pub fn on_iteration(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    /// Called when a proposal is skipped as degenerate.
    #[inline]
    pub fn on_degenerate_move(&mut self) {
        self.degenerate_moves = self.degenerate_moves.saturating_add(1);
    }

    /// Called when a proposal is evaluated.
    #[inline]
    pub fn on_evaluated_move(&mut self) {
        self.evaluated_moves = self.evaluated_moves.saturating_add(1);
    }

    /// Called when a move with score change `delta` is accepted.
    #[inline]
    pub fn on_accepted_move(&mut self, delta: f64) {
        if delta > 0.0 {
            self.improving_moves = self.improving_moves.saturating_add(1);
        } else {
            self.worsening_moves = self.worsening_moves.saturating_add(1);
        }
    }

    /// Called when a move is rejected.
    #[inline]
    pub fn on_rejected_move(&mut self) {
        self.rejected_moves = self.rejected_moves.saturating_add(1);
    }

    /// Called when the best score improves.
    #[inline]
    pub fn on_new_best(&mut self) {
        self.new_bests = self.new_bests.saturating_add(1);
    }

    /// Sets the total time taken by the local search.
    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    /// Returns the number of accepted moves.
    #[inline]
    pub fn accepted_moves(&self) -> u64 {
        self.improving_moves.saturating_add(self.worsening_moves)
    }
}

impl std::fmt::Display for LocalSearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Unimatch Local Search Statistics:")?;
        writeln!(f, "   Iterations:          {}", self.iterations)?;
        writeln!(f, "   Degenerate Moves:    {}", self.degenerate_moves)?;
        writeln!(f, "   Evaluated Moves:     {}", self.evaluated_moves)?;
        writeln!(f, "   Improving Moves:     {}", self.improving_moves)?;
        writeln!(f, "   Worsening Accepted:  {}", self.worsening_moves)?;
        writeln!(f, "   Rejected Moves:      {}", self.rejected_moves)?;
        writeln!(f, "   New Bests:           {}", self.new_bests)?;
        writeln!(f, "   Total Time:          {:?}", self.time_total)?;
        Ok(())
    }
}

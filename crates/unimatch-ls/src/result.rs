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

//! Local search outcome and termination reporting.
//!
//! The `LocalSearchEngineOutcome` bundles the assignment handed over at the
//! end of a run (the best snapshot for policies that keep one, the current
//! assignment otherwise) with its score, the run statistics and the reason
//! the loop stopped.

use crate::stats::LocalSearchStatistics;
use unimatch_model::assignment::Assignment;

/// Why a search run ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSearchTerminationReason {
    /// The wall-clock time limit was reached.
    TimeLimit,

    /// The cancellation flag was raised.
    Interrupted,

    /// The configured number of iterations was performed.
    IterationLimit,

    /// The move generator had no further move to propose.
    MovesExhausted,

    /// The metaheuristic decided to stop the search.
    Metaheuristic(String),
}

impl LocalSearchTerminationReason {
    /// Returns `true` if the run was stopped by an external cancellation.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl std::fmt::Display for LocalSearchTerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimeLimit => write!(f, "Time Limit Reached"),
            Self::Interrupted => write!(f, "Interrupted"),
            Self::IterationLimit => write!(f, "Iteration Limit Reached"),
            Self::MovesExhausted => write!(f, "No Moves Left"),
            Self::Metaheuristic(msg) => write!(f, "Metaheuristic Termination: {}", msg),
        }
    }
}

/// Result of the engine after termination.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSearchEngineOutcome {
    termination_reason: LocalSearchTerminationReason,
    assignment: Assignment,
    initial_score: f64,
    score: f64,
    statistics: LocalSearchStatistics,
}

impl LocalSearchEngineOutcome {
    /// Creates a new outcome.
    #[inline]
    pub fn new(
        termination_reason: LocalSearchTerminationReason,
        assignment: Assignment,
        initial_score: f64,
        score: f64,
        statistics: LocalSearchStatistics,
    ) -> Self {
        Self {
            termination_reason,
            assignment,
            initial_score,
            score,
            statistics,
        }
    }

    /// Returns the termination reason.
    #[inline]
    pub fn termination_reason(&self) -> &LocalSearchTerminationReason {
        &self.termination_reason
    }

    /// Returns the final assignment.
    #[inline]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Consumes the outcome and returns the final assignment.
    #[inline]
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    /// Returns the score of the seed assignment.
    #[inline]
    pub fn initial_score(&self) -> f64 {
        self.initial_score
    }

    /// Returns the incrementally tracked score of the final assignment.
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Returns the statistics.
    #[inline]
    pub fn statistics(&self) -> &LocalSearchStatistics {
        &self.statistics
    }
}

impl std::fmt::Display for LocalSearchEngineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Local Search Outcome")?;
        writeln!(f, "   Termination:    {}", self.termination_reason)?;
        writeln!(f, "   Initial Score:  {:.10}", self.initial_score)?;
        writeln!(f, "   Final Score:    {:.10}", self.score)?;
        write!(f, "{}", self.statistics)
    }
}

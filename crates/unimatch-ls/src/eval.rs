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

//! Constant-time evaluation of swap moves.
//!
//! For a swap of `s1` at `u1` with `s2` at `u2` only four happiness terms and
//! two university terms change:
//!
//! ```raw
//! dFPE   = (1 / N) * [ FE(s1, u2) + FE(s2, u1) - FE(s1, u1) - FE(s2, u2) ]
//! dFPU   = (1 / U) * [ (FU(s2) - FU(s1)) / cap(u1) + (FU(s1) - FU(s2)) / cap(u2) ]
//! dScore = alpha * dFPE + (1 - alpha) * dFPU
//! ```
//!
//! so a move is evaluated without touching the rest of the assignment.
//! Degenerate moves (a student with itself, or two students at the same
//! university) evaluate to the zero delta.

use crate::{
    objective::{Objective, happiness},
    operator::Swap,
    state::SearchState,
};
use unimatch_model::model::Model;

/// The change of the objective caused by a move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwapDelta {
    /// Change of the student component `FPE`.
    pub student: f64,
    /// Change of the university component `FPU`.
    pub university: f64,
    /// Change of the weighted score.
    pub score: f64,
}

impl SwapDelta {
    /// The delta of a move that changes nothing.
    pub const ZERO: Self = Self {
        student: 0.0,
        university: 0.0,
        score: 0.0,
    };

    /// Returns `true` if the move strictly improves the score.
    #[inline(always)]
    pub fn is_improving(&self) -> bool {
        self.score > 0.0
    }
}

impl std::fmt::Display for SwapDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SwapDelta(student: {:e}, university: {:e}, score: {:e})",
            self.student, self.university, self.score
        )
    }
}

/// A trait for computing the objective change of a swap against a search state.
pub trait SwapEvaluator {
    /// Returns the name of the evaluator.
    fn name(&self) -> &str;

    /// Returns the objective this evaluator measures changes of.
    fn objective(&self) -> &Objective;

    /// Computes the exact change of the objective if `swap` were applied to `state`.
    fn evaluate(&self, model: &Model, state: &SearchState, swap: Swap) -> SwapDelta;
}

impl std::fmt::Debug for dyn SwapEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SwapEvaluator {{ name: {} }}", self.name())
    }
}

/// Evaluates swaps under the weighted `alpha * FPE + (1 - alpha) * FPU` objective.
///
/// The reciprocal population sizes are computed once for the model the
/// evaluator was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedObjectiveEvaluator {
    objective: Objective,
    inverse_num_students: f64,
    inverse_num_universities: f64,
}

impl WeightedObjectiveEvaluator {
    /// Creates an evaluator for `model` under `objective`.
    #[inline]
    pub fn new(model: &Model, objective: Objective) -> Self {
        Self {
            objective,
            inverse_num_students: 1.0 / model.num_students() as f64,
            inverse_num_universities: 1.0 / model.num_universities() as f64,
        }
    }
}

impl SwapEvaluator for WeightedObjectiveEvaluator {
    fn name(&self) -> &str {
        "WeightedObjectiveEvaluator"
    }

    #[inline]
    fn objective(&self) -> &Objective {
        &self.objective
    }

    #[inline]
    fn evaluate(&self, model: &Model, state: &SearchState, swap: Swap) -> SwapDelta {
        let Swap { first, second } = swap;
        let assignment = state.assignment();
        let first_university = assignment.university_of(first);
        let second_university = assignment.university_of(second);

        if first == second || first_university == second_university {
            return SwapDelta::ZERO;
        }

        let happiness_before =
            happiness(model, first, first_university) + happiness(model, second, second_university);
        let happiness_after =
            happiness(model, first, second_university) + happiness(model, second, first_university);
        let student = self.inverse_num_students * (happiness_after - happiness_before);

        let merit_change = model.merit_utility(second) - model.merit_utility(first);
        let university = self.inverse_num_universities
            * merit_change
            * (model.inverse_capacity(first_university)
                - model.inverse_capacity(second_university));

        SwapDelta {
            student,
            university,
            score: self.objective.combine(student, university),
        }
    }
}

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

//! The weighted assignment objective.
//!
//! ```raw
//! FE(s, u)   = (51 - p) / 50          if u is at rank p of s's preferences
//!            = UNRANKED_PENALTY        otherwise
//! FPE        = (1 / N) * sum_s FE(s, assignment[s])
//! FPU        = (1 / U) * sum_u (1 / cap(u)) * sum_{s at u} FU(s)
//! Score      = alpha * FPE + (1 - alpha) * FPU
//! ```
//!
//! The functions here compute the objective from scratch. The search keeps an
//! incrementally updated copy (see `state` and `eval`) that must agree with
//! them up to floating-point tolerance.

use unimatch_model::{
    assignment::Assignment,
    index::{StudentIndex, UniversityIndex},
    model::{MAX_PREFERENCES, Model},
};

/// The happiness of a student placed at a university outside their preference list.
pub const UNRANKED_PENALTY: f64 = -2.0;

/// Returns `FE(s, u)`, the happiness of `student_index` placed at `university_index`.
#[inline]
pub fn happiness(
    model: &Model,
    student_index: StudentIndex,
    university_index: UniversityIndex,
) -> f64 {
    match model.preference_rank(student_index, university_index) {
        Some(rank) => (MAX_PREFERENCES as f64 + 1.0 - rank as f64) / MAX_PREFERENCES as f64,
        None => UNRANKED_PENALTY,
    }
}

/// Computes the per-university sum of merit utilities from scratch.
pub fn merit_sums(model: &Model, assignment: &Assignment) -> Vec<f64> {
    let mut sums = vec![0.0; model.num_universities()];
    for (student, university) in assignment.iter() {
        sums[university.get()] += model.merit_utility(student);
    }
    sums
}

/// The value of the objective, split into its two components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObjectiveBreakdown {
    /// The student-side component `FPE`.
    pub student: f64,
    /// The university-side component `FPU`.
    pub university: f64,
    /// The weighted `Score`.
    pub score: f64,
}

impl std::fmt::Display for ObjectiveBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FPE: {:.10}, FPU: {:.10}, Score: {:.10}",
            self.student, self.university, self.score
        )
    }
}

/// The weighted objective `alpha * FPE + (1 - alpha) * FPU`, to be maximized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    alpha: f64,
}

impl Default for Objective {
    fn default() -> Self {
        Self { alpha: 0.5 }
    }
}

impl Objective {
    /// Creates an objective with the given weight on the student component.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not within `[0.0, 1.0]`.
    #[inline]
    pub fn new(alpha: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&alpha),
            "called `Objective::new()` with invalid alpha: {}. Must be in [0.0, 1.0]",
            alpha
        );
        Self { alpha }
    }

    /// Returns the weight of the student component.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Combines the two components into the weighted score.
    #[inline(always)]
    pub fn combine(&self, student: f64, university: f64) -> f64 {
        self.alpha * student + (1.0 - self.alpha) * university
    }

    /// Computes `FPE` from scratch.
    pub fn student_component(&self, model: &Model, assignment: &Assignment) -> f64 {
        let total: f64 = assignment
            .iter()
            .map(|(s, u)| happiness(model, s, u))
            .sum();
        total / model.num_students() as f64
    }

    /// Computes `FPU` from per-university merit sums.
    pub fn university_component(&self, model: &Model, merit_sums: &[f64]) -> f64 {
        debug_assert_eq!(
            merit_sums.len(),
            model.num_universities(),
            "called `Objective::university_component` with {} merit sums for {} universities",
            merit_sums.len(),
            model.num_universities()
        );

        let total: f64 = model
            .universities()
            .map(|u| model.inverse_capacity(u) * merit_sums[u.get()])
            .sum();
        total / model.num_universities() as f64
    }

    /// Computes the full objective from scratch.
    pub fn evaluate(&self, model: &Model, assignment: &Assignment) -> ObjectiveBreakdown {
        let student = self.student_component(model, assignment);
        let university = self.university_component(model, &merit_sums(model, assignment));
        ObjectiveBreakdown {
            student,
            university,
            score: self.combine(student, university),
        }
    }
}

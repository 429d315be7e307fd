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

//! The mutable state of a search run.
//!
//! `SearchState` owns the current assignment together with the running
//! per-university merit sums and the current objective components. All three
//! are updated together by `apply_swap`, so the merit sums always equal what
//! `objective::merit_sums` would recompute, and the current score always
//! equals the initial score plus the accumulated deltas.
//!
//! The best-so-far score is tracked in every run. A copy of the best
//! assignment is only kept when the acceptance policy can move to worse states;
//! for a policy that only ever improves, the current assignment is the best one.

use crate::{
    eval::SwapDelta,
    objective::{self, Objective, ObjectiveBreakdown},
    operator::Swap,
};
use unimatch_model::{assignment::Assignment, index::UniversityIndex, model::Model};

/// Current and best-so-far state of a search.
#[derive(Debug, Clone)]
pub struct SearchState {
    assignment: Assignment,
    merit_sums: Vec<f64>,
    current: ObjectiveBreakdown,
    best_score: f64,
    best_assignment: Option<Assignment>,
}

impl SearchState {
    /// Initializes the state from a seed assignment.
    ///
    /// With `track_best_assignment`, a snapshot of the best assignment is kept
    /// and refreshed on every new best.
    pub fn new(
        model: &Model,
        objective: &Objective,
        assignment: Assignment,
        track_best_assignment: bool,
    ) -> Self {
        debug_assert_eq!(
            assignment.num_students(),
            model.num_students(),
            "called `SearchState::new` with an assignment of {} students for a model of {}",
            assignment.num_students(),
            model.num_students()
        );

        let merit_sums = objective::merit_sums(model, &assignment);
        let student = objective.student_component(model, &assignment);
        let university = objective.university_component(model, &merit_sums);
        let current = ObjectiveBreakdown {
            student,
            university,
            score: objective.combine(student, university),
        };
        let best_assignment = track_best_assignment.then(|| assignment.clone());

        Self {
            assignment,
            merit_sums,
            current,
            best_score: current.score,
            best_assignment,
        }
    }

    /// Returns the current assignment.
    #[inline]
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Returns the running merit sums, indexed by university.
    #[inline]
    pub fn merit_sums(&self) -> &[f64] {
        &self.merit_sums
    }

    /// Returns the running merit sum of one university.
    #[inline]
    pub fn merit_sum(&self, university_index: UniversityIndex) -> f64 {
        self.merit_sums[university_index.get()]
    }

    /// Returns the incrementally maintained objective of the current assignment.
    #[inline]
    pub fn current(&self) -> ObjectiveBreakdown {
        self.current
    }

    /// Returns the current score.
    #[inline]
    pub fn current_score(&self) -> f64 {
        self.current.score
    }

    /// Returns the best score seen so far.
    #[inline]
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    /// Returns `true` if a snapshot of the best assignment is kept.
    #[inline]
    pub fn tracks_best_assignment(&self) -> bool {
        self.best_assignment.is_some()
    }

    /// Returns the best assignment seen so far.
    #[inline]
    pub fn best_assignment(&self) -> &Assignment {
        self.best_assignment.as_ref().unwrap_or(&self.assignment)
    }

    /// Returns `true` if `swap` cannot change the assignment.
    #[inline]
    pub fn is_degenerate(&self, swap: Swap) -> bool {
        swap.is_self_swap()
            || self.assignment.university_of(swap.first)
                == self.assignment.university_of(swap.second)
    }

    /// Applies an accepted swap and its delta.
    pub fn apply_swap(&mut self, model: &Model, swap: Swap, delta: &SwapDelta) {
        debug_assert!(
            !self.is_degenerate(swap),
            "called `SearchState::apply_swap` with degenerate {}",
            swap
        );

        let first_university = self.assignment.university_of(swap.first);
        let second_university = self.assignment.university_of(swap.second);
        let first_merit = model.merit_utility(swap.first);
        let second_merit = model.merit_utility(swap.second);

        self.assignment.swap(swap.first, swap.second);
        self.merit_sums[first_university.get()] += second_merit - first_merit;
        self.merit_sums[second_university.get()] += first_merit - second_merit;

        self.current.student += delta.student;
        self.current.university += delta.university;
        self.current.score += delta.score;
    }

    /// Records the current state as the best one if it is strictly better.
    ///
    /// Returns `true` if the best score changed.
    pub fn update_best(&mut self) -> bool {
        if self.current.score <= self.best_score {
            return false;
        }
        self.best_score = self.current.score;
        if let Some(best) = self.best_assignment.as_mut() {
            best.clone_from(&self.assignment);
        }
        true
    }

    /// Consumes the state and returns the assignment to hand over: the best
    /// snapshot if one is kept, the current assignment otherwise.
    pub fn into_final_assignment(self) -> Assignment {
        self.best_assignment.unwrap_or(self.assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{SwapEvaluator, WeightedObjectiveEvaluator};
    use unimatch_model::{index::StudentIndex, model::ModelBuilder};

    fn scenario() -> (Model, Assignment) {
        let mut b = ModelBuilder::new();
        b.add_university(1, 1).unwrap();
        b.add_university(2, 2).unwrap();
        b.add_student(1, vec![Some(1)]).unwrap();
        b.add_student(2, vec![Some(2)]).unwrap();
        b.add_student(3, vec![Some(2)]).unwrap();
        b.set_merit_rank(1, 1).unwrap();
        b.set_merit_rank(2, 2).unwrap();
        b.set_merit_rank(3, 3).unwrap();
        let model = b.build().unwrap();
        let assignment = Assignment::from_records(&model, vec![(1, 2), (2, 1), (3, 2)]).unwrap();
        (model, assignment)
    }

    fn swap(a: usize, b: usize) -> Swap {
        Swap::new(StudentIndex::new(a), StudentIndex::new(b))
    }

    #[test]
    fn test_new_matches_scratch_objective() {
        let (model, assignment) = scenario();
        let objective = Objective::new(0.3);
        let expected = objective.evaluate(&model, &assignment);
        let state = SearchState::new(&model, &objective, assignment, false);

        assert_eq!(state.current(), expected);
        assert_eq!(state.best_score(), expected.score);
        assert!(!state.tracks_best_assignment());
    }

    #[test]
    fn test_degenerate_swaps() {
        let (model, assignment) = scenario();
        let state = SearchState::new(&model, &Objective::default(), assignment, false);

        assert!(state.is_degenerate(swap(0, 0)));
        // Students 0 and 2 both sit at university 2.
        assert!(state.is_degenerate(swap(0, 2)));
        assert!(!state.is_degenerate(swap(0, 1)));
    }

    #[test]
    fn test_apply_swap_keeps_aggregates_consistent() {
        let (model, assignment) = scenario();
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        let mut state = SearchState::new(&model, &objective, assignment, true);

        let s = swap(0, 1);
        let delta = evaluator.evaluate(&model, &state, s);
        state.apply_swap(&model, s, &delta);

        let expected_sums = objective::merit_sums(&model, state.assignment());
        for (a, b) in state.merit_sums().iter().zip(&expected_sums) {
            assert!((a - b).abs() < 1e-12);
        }
        let scratch = objective.evaluate(&model, state.assignment());
        assert!((state.current_score() - scratch.score).abs() < 1e-12);
        assert!((state.current().student - scratch.student).abs() < 1e-12);
        assert!((state.current().university - scratch.university).abs() < 1e-12);
    }

    #[test]
    fn test_best_snapshot_follows_strict_improvements() {
        let (model, assignment) = scenario();
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        let initial = assignment.clone();
        let mut state = SearchState::new(&model, &objective, assignment, true);

        // Swapping students 0 and 1 puts both at their first choice.
        let improving = swap(0, 1);
        let delta = evaluator.evaluate(&model, &state, improving);
        assert!(delta.score > 0.0);
        state.apply_swap(&model, improving, &delta);
        assert!(state.update_best());
        let best = state.assignment().clone();

        // Undoing it is worse: the best snapshot stays.
        let undo = swap(0, 1);
        let delta = evaluator.evaluate(&model, &state, undo);
        state.apply_swap(&model, undo, &delta);
        assert!(!state.update_best());

        assert_eq!(state.assignment(), &initial);
        assert_eq!(state.best_assignment(), &best);
        assert_eq!(state.into_final_assignment(), best);
    }

    #[test]
    fn test_without_snapshot_final_is_current() {
        let (model, assignment) = scenario();
        let state = SearchState::new(&model, &Objective::default(), assignment.clone(), false);
        assert_eq!(state.best_assignment(), &assignment);
        assert_eq!(state.into_final_assignment(), assignment);
    }
}

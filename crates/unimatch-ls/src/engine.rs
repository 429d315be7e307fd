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

//! Iterative swap search driver.
//!
//! Each iteration polls the monitors (time limit, cancellation, iteration
//! limit) and the metaheuristic for a termination request, draws a swap from
//! the move generator, skips it if it cannot change the assignment, evaluates
//! its delta, asks the metaheuristic for a decision and applies it on
//! acceptance. New best scores are recorded after every accepted move.
//!
//! The loop is single threaded and the search state has exactly one mutator.
//! Termination requests are only observed between iterations, so the state is
//! always consistent when the run ends.

use crate::{
    eval::SwapEvaluator,
    meta::metaheuristic::Metaheuristic,
    monitor::local_search_monitor::{LocalSearchMonitor, SearchCommand},
    operator::MoveGenerator,
    result::{LocalSearchEngineOutcome, LocalSearchTerminationReason},
    state::SearchState,
    stats::LocalSearchStatistics,
};
use std::time::Instant;
use unimatch_model::{assignment::Assignment, model::Model};

/// Local search engine for the student/university assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalSearchEngine;

impl LocalSearchEngine {
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Runs the search from `initial_assignment` until a monitor, the
    /// metaheuristic or the move generator ends it.
    ///
    /// # Parameters:
    /// - `model`: Problem data (preferences, merit utilities, capacities).
    /// - `evaluator`: Computes the objective change of a swap.
    /// - `generator`: Proposes candidate swaps.
    /// - `metaheuristic`: Decides acceptance and whether a best snapshot is kept.
    /// - `monitor`: Observes the run and can request termination.
    /// - `initial_assignment`: The seed; must match `model` in shape.
    ///
    /// The returned outcome holds the best assignment for policies that keep a
    /// snapshot and the current assignment otherwise.
    pub fn run<E, G, M, SM>(
        &mut self,
        model: &Model,
        evaluator: &E,
        generator: &mut G,
        metaheuristic: &mut M,
        monitor: &mut SM,
        initial_assignment: Assignment,
    ) -> LocalSearchEngineOutcome
    where
        E: SwapEvaluator + ?Sized,
        G: MoveGenerator + ?Sized,
        M: Metaheuristic + ?Sized,
        SM: LocalSearchMonitor + ?Sized,
    {
        let start_time = Instant::now();
        let mut stats = LocalSearchStatistics::default();

        debug_assert!(
            initial_assignment.validate_against(model).is_ok(),
            "called `LocalSearchEngine::run` with an initial assignment that does not match the model: {:?}",
            initial_assignment.validate_against(model)
        );

        let mut state = SearchState::new(
            model,
            evaluator.objective(),
            initial_assignment,
            metaheuristic.tracks_best_assignment(),
        );
        let initial_score = state.current_score();

        monitor.on_start(&state);
        metaheuristic.on_start(&state);

        let termination_reason = loop {
            if let SearchCommand::Terminate(reason) = monitor.search_command(&stats) {
                break reason;
            }

            if let SearchCommand::Terminate(reason) =
                metaheuristic.search_command(stats.iterations, &state)
            {
                break reason;
            }

            let Some(swap) = generator.next_swap(model.num_students()) else {
                break LocalSearchTerminationReason::MovesExhausted;
            };

            stats.on_iteration();

            if state.is_degenerate(swap) {
                stats.on_degenerate_move();
                monitor.on_iteration(&state, &stats);
                continue;
            }

            let delta = evaluator.evaluate(model, &state, swap);
            stats.on_evaluated_move();

            if metaheuristic.should_accept(&delta, &state) {
                state.apply_swap(model, swap, &delta);
                stats.on_accepted_move(delta.score);

                metaheuristic.on_accept(&state);
                monitor.on_move_accepted(swap, &delta, &state, &stats);

                if state.update_best() {
                    stats.on_new_best();

                    debug_assert!(
                        state.best_score() >= state.current_score(),
                        "called `LocalSearchEngine::run` with inconsistent best score: best is {}, current is {}",
                        state.best_score(),
                        state.current_score()
                    );

                    metaheuristic.on_new_best(&state);
                    monitor.on_new_best(&state, &stats);
                }
            } else {
                stats.on_rejected_move();
                metaheuristic.on_reject(&state);
                monitor.on_move_rejected(swap, &delta, &stats);
            }

            monitor.on_iteration(&state, &stats);
        };

        stats.set_total_time(start_time.elapsed());
        monitor.on_end(&state, &stats, &termination_reason);

        let score = state.best_score();
        let assignment = state.into_final_assignment();
        LocalSearchEngineOutcome::new(termination_reason, assignment, initial_score, score, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        eval::{SwapDelta, WeightedObjectiveEvaluator},
        meta::{
            greedy_descent::GreedyDescent,
            simulated_annealing::{SimulatedAnnealing, TimeLinearCooling},
        },
        monitor::{
            composite::CompositeLocalSearchMonitor, interrupt::InterruptMonitor,
            iteration::IterationLimitMonitor, time::TimeLimitMonitor,
        },
        objective::{self, Objective},
        operator::{SequenceSwapGenerator, Swap, UniformSwapGenerator},
        testing,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::{sync::atomic::AtomicBool, time::Duration};
    use unimatch_core::num::tolerance::{DELTA_TOLERANCE, approx_eq};
    use unimatch_model::{index::StudentIndex, model::ModelBuilder};

    /// Records every score seen by the monitor callbacks and checks invariants on the fly.
    struct InvariantMonitor<'m> {
        model: &'m Model,
        objective: Objective,
        limit: u64,
        last_best: f64,
        last_current: f64,
        counts: Vec<usize>,
        greedy: bool,
    }

    impl<'m> InvariantMonitor<'m> {
        fn new(model: &'m Model, objective: Objective, limit: u64, greedy: bool) -> Self {
            Self {
                model,
                objective,
                limit,
                last_best: f64::NEG_INFINITY,
                last_current: f64::NEG_INFINITY,
                counts: Vec::new(),
                greedy,
            }
        }
    }

    impl LocalSearchMonitor for InvariantMonitor<'_> {
        fn name(&self) -> &str {
            "InvariantMonitor"
        }

        fn on_start(&mut self, state: &SearchState) {
            self.last_best = state.best_score();
            self.last_current = state.current_score();
            self.counts = state.assignment().counts(self.model.num_universities());
        }

        fn on_end(
            &mut self,
            state: &SearchState,
            _statistics: &LocalSearchStatistics,
            _reason: &LocalSearchTerminationReason,
        ) {
            let scratch = self.objective.evaluate(self.model, state.assignment());
            assert!(approx_eq(scratch.score, state.current_score(), DELTA_TOLERANCE));
        }

        fn on_iteration(&mut self, state: &SearchState, statistics: &LocalSearchStatistics) {
            assert!(state.best_score() >= self.last_best, "best score decreased");
            self.last_best = state.best_score();

            if self.greedy {
                assert!(state.current_score() >= self.last_current, "greedy score decreased");
            }
            self.last_current = state.current_score();

            if statistics.iterations % 97 == 0 {
                assert_eq!(
                    state.assignment().counts(self.model.num_universities()),
                    self.counts,
                    "university cardinalities changed"
                );
                let sums = objective::merit_sums(self.model, state.assignment());
                for (incremental, scratch) in state.merit_sums().iter().zip(&sums) {
                    assert!(
                        approx_eq(*incremental, *scratch, DELTA_TOLERANCE),
                        "merit sums drifted"
                    );
                }
            }
        }

        fn search_command(&mut self, statistics: &LocalSearchStatistics) -> SearchCommand {
            if statistics.iterations >= self.limit {
                SearchCommand::Terminate(LocalSearchTerminationReason::IterationLimit)
            } else {
                SearchCommand::Continue
            }
        }
    }

    fn annealing(seed: u64) -> SimulatedAnnealing<ChaCha8Rng, TimeLinearCooling> {
        SimulatedAnnealing::new(
            TimeLinearCooling::new(1e-3, Duration::from_secs(3600), 1e-10),
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    fn swap(a: usize, b: usize) -> Swap {
        Swap::new(StudentIndex::new(a), StudentIndex::new(b))
    }

    // 3 students, U1 (cap 1) and U2 (cap 2). A prefers U1 but sits at U2,
    // B prefers U2 but sits at U1, C sits at U2.
    fn scenario() -> (Model, Assignment) {
        let mut b = ModelBuilder::new();
        b.add_university(1, 1).unwrap();
        b.add_university(2, 2).unwrap();
        b.add_student(10, vec![Some(1)]).unwrap();
        b.add_student(20, vec![Some(2)]).unwrap();
        b.add_student(30, vec![Some(2)]).unwrap();
        b.set_merit_rank(10, 2).unwrap();
        b.set_merit_rank(20, 1).unwrap();
        b.set_merit_rank(30, 3).unwrap();
        let model = b.build().unwrap();
        let assignment =
            Assignment::from_records(&model, vec![(10, 2), (20, 1), (30, 2)]).unwrap();
        (model, assignment)
    }

    #[test]
    fn test_scenario_swap_accepted_by_greedy() {
        let (model, assignment) = scenario();
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        let mut generator = SequenceSwapGenerator::new(vec![swap(0, 1)]);
        let mut monitor = CompositeLocalSearchMonitor::new();

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut GreedyDescent::new(),
            &mut monitor,
            assignment,
        );

        assert_eq!(outcome.termination_reason(), &LocalSearchTerminationReason::MovesExhausted);
        assert_eq!(outcome.statistics().improving_moves, 1);
        let a = outcome.assignment();
        assert_eq!(a.university_of(StudentIndex::new(0)), model.university_index(1).unwrap());
        assert_eq!(a.university_of(StudentIndex::new(1)), model.university_index(2).unwrap());
        assert!(outcome.score() > outcome.initial_score());
    }

    #[test]
    fn test_scenario_swap_accepted_by_annealing() {
        let (model, assignment) = scenario();
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        let mut generator = SequenceSwapGenerator::new(vec![swap(1, 0)]);
        let mut monitor = CompositeLocalSearchMonitor::new();

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut annealing(1),
            &mut monitor,
            assignment,
        );

        assert_eq!(outcome.statistics().improving_moves, 1);
        assert_eq!(outcome.statistics().new_bests, 1);
        let a = outcome.assignment();
        assert_eq!(a.university_of(StudentIndex::new(0)), model.university_index(1).unwrap());
        assert_eq!(a.university_of(StudentIndex::new(1)), model.university_index(2).unwrap());
    }

    #[test]
    fn test_degenerate_moves_are_skipped_without_mutation() {
        let (model, assignment) = scenario();
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        // Self swap, then A and C who share U2.
        let mut generator = SequenceSwapGenerator::new(vec![swap(1, 1), swap(0, 2)]);
        let mut monitor = CompositeLocalSearchMonitor::new();
        let initial = assignment.clone();

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut annealing(2),
            &mut monitor,
            assignment,
        );

        let stats = outcome.statistics();
        assert_eq!(stats.iterations, 2);
        assert_eq!(stats.degenerate_moves, 2);
        assert_eq!(stats.evaluated_moves, 0);
        assert_eq!(outcome.assignment(), &initial);
        assert_eq!(outcome.score(), outcome.initial_score());
    }

    #[test]
    fn test_greedy_is_monotone_and_ends_locally_optimal() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let (model, assignment) = testing::random_instance(&mut rng, 40, 6);
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(18));
        let mut monitor = InvariantMonitor::new(&model, objective, 200_000, true);

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut GreedyDescent::new(),
            &mut monitor,
            assignment,
        );

        assert_eq!(outcome.statistics().worsening_moves, 0);
        assert!(outcome.score() >= outcome.initial_score());

        // With 40 students there are 780 pairs; 200k random draws cover each one many times.
        let state = SearchState::new(&model, &objective, outcome.assignment().clone(), false);
        for a in 0..model.num_students() {
            for b in (a + 1)..model.num_students() {
                let delta = evaluator.evaluate(&model, &state, swap(a, b));
                assert!(delta.score <= 1e-12, "improving swap ({}, {}) left: {}", a, b, delta);
            }
        }
    }

    #[test]
    fn test_annealing_best_is_monotone_and_best_snapshot_matches_score() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let (model, assignment) = testing::random_instance(&mut rng, 50, 7);
        let objective = Objective::new(0.4);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(24));
        let mut monitor = InvariantMonitor::new(&model, objective, 20_000, false);

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut annealing(25),
            &mut monitor,
            assignment,
        );

        assert!(outcome.statistics().worsening_moves > 0, "temperature too low to explore");
        assert!(outcome.score() >= outcome.initial_score());
        let scratch = objective.evaluate(&model, outcome.assignment());
        assert!(approx_eq(scratch.score, outcome.score(), DELTA_TOLERANCE));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let (model, assignment) = testing::random_instance(&mut rng, 30, 4);
        let objective = Objective::new(0.5);
        let evaluator = WeightedObjectiveEvaluator::new(&model, objective);

        let run = || {
            let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(5));
            let mut monitor = IterationLimitMonitor::new(5_000);
            LocalSearchEngine::new().run(
                &model,
                &evaluator,
                &mut generator,
                &mut annealing(6),
                &mut monitor,
                assignment.clone(),
            )
        };

        let first = run();
        let second = run();
        assert_eq!(first.assignment(), second.assignment());
        assert_eq!(first.score(), second.score());
        assert_eq!(first.termination_reason(), &LocalSearchTerminationReason::IterationLimit);
        assert_eq!(first.statistics().iterations, 5_000);
    }

    #[test]
    fn test_interrupt_before_first_iteration() {
        let (model, assignment) = scenario();
        let evaluator = WeightedObjectiveEvaluator::new(&model, Objective::default());
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(1));
        let flag = AtomicBool::new(true);
        let mut monitor = CompositeLocalSearchMonitor::new();
        monitor.add_monitor(TimeLimitMonitor::new(Duration::from_secs(3600)));
        monitor.add_monitor(InterruptMonitor::new(&flag));
        let initial = assignment.clone();

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut annealing(1),
            &mut monitor,
            assignment,
        );

        assert!(outcome.termination_reason().is_interrupted());
        assert_eq!(outcome.statistics().iterations, 0);
        assert_eq!(outcome.assignment(), &initial);
    }

    #[test]
    fn test_time_limit_is_respected() {
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        let (model, assignment) = testing::random_instance(&mut rng, 200, 10);
        let evaluator = WeightedObjectiveEvaluator::new(&model, Objective::default());
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(42));
        let mut monitor = TimeLimitMonitor::new(Duration::from_millis(50));

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut annealing(43),
            &mut monitor,
            assignment,
        );

        assert_eq!(outcome.termination_reason(), &LocalSearchTerminationReason::TimeLimit);
        let total = outcome.statistics().time_total;
        assert!(total >= Duration::from_millis(50));
        assert!(total < Duration::from_millis(500), "overshot the limit: {:?}", total);
    }

    #[test]
    fn test_single_student_exhausts_immediately() {
        let mut b = ModelBuilder::new();
        b.add_university(1, 1).unwrap();
        b.add_student(1, vec![Some(1)]).unwrap();
        b.set_merit_rank(1, 1).unwrap();
        let model = b.build().unwrap();
        let assignment = Assignment::from_records(&model, vec![(1, 1)]).unwrap();
        let evaluator = WeightedObjectiveEvaluator::new(&model, Objective::default());
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::seed_from_u64(1));
        let mut monitor = CompositeLocalSearchMonitor::new();

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut GreedyDescent::new(),
            &mut monitor,
            assignment,
        );

        assert_eq!(outcome.termination_reason(), &LocalSearchTerminationReason::MovesExhausted);
        assert_eq!(outcome.score(), 1.0 * 0.5 + 1.0 * 0.5);
    }

    #[test]
    fn test_rejected_moves_reach_the_monitor() {
        struct RejectAll;
        impl Metaheuristic for RejectAll {
            fn name(&self) -> &str {
                "RejectAll"
            }
            fn tracks_best_assignment(&self) -> bool {
                false
            }
            fn on_start(&mut self, _state: &SearchState) {}
            fn search_command(&mut self, _iteration: u64, _state: &SearchState) -> SearchCommand {
                SearchCommand::Continue
            }
            fn should_accept(&mut self, _delta: &SwapDelta, _state: &SearchState) -> bool {
                false
            }
            fn on_accept(&mut self, _state: &SearchState) {}
            fn on_reject(&mut self, _state: &SearchState) {}
            fn on_new_best(&mut self, _state: &SearchState) {}
        }

        let (model, assignment) = scenario();
        let evaluator = WeightedObjectiveEvaluator::new(&model, Objective::default());
        let mut generator = SequenceSwapGenerator::new(vec![swap(0, 1), swap(1, 2)]);
        let mut monitor = CompositeLocalSearchMonitor::new();

        let outcome = LocalSearchEngine::new().run(
            &model,
            &evaluator,
            &mut generator,
            &mut RejectAll,
            &mut monitor,
            assignment,
        );
        assert_eq!(outcome.statistics().rejected_moves, 2);
        assert_eq!(outcome.statistics().accepted_moves(), 0);
    }
}

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

//! # Solver
//!
//! Wires a `Model`, a seed `Assignment` and a `SolverConfig` into the local
//! search engine and re-scores the result from scratch.
//!
//! ## Flow
//!
//! 1. Validate the configuration and the seed (shape and capacities).
//! 2. Derive independent random streams for the move generator and the
//!    acceptance policy from a single master seed.
//! 3. Build the monitor stack: time limit, cancellation, progress log and an
//!    optional iteration limit.
//! 4. Run the engine with the configured acceptance policy.
//! 5. Recompute `FPE`, `FPU` and `Score` of the returned assignment and warn
//!    if the incrementally maintained score drifted.
//!
//! ## Cancellation
//!
//! The solver owns an `AtomicBool` stop signal. `stop_signal` hands out a
//! shared handle that may be raised from any thread (a Ctrl-C handler, for
//! instance); the run then finalizes normally and returns its best result.

use crate::{
    config::{AcceptancePolicy, CoolingKind, SolverConfig},
    error::SolverError,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info, warn};
use unimatch_core::num::tolerance::drift;
use unimatch_ls::{
    engine::LocalSearchEngine,
    eval::WeightedObjectiveEvaluator,
    meta::{
        greedy_descent::GreedyDescent,
        metaheuristic::Metaheuristic,
        simulated_annealing::{GeometricCooling, SimulatedAnnealing, TimeLinearCooling},
    },
    monitor::{
        composite::CompositeLocalSearchMonitor, interrupt::InterruptMonitor,
        iteration::IterationLimitMonitor, log::LogMonitor, time::TimeLimitMonitor,
    },
    objective::{Objective, ObjectiveBreakdown},
    operator::UniformSwapGenerator,
    result::LocalSearchEngineOutcome,
};
use unimatch_model::{assignment::Assignment, model::Model};

/// The result of a solve: the engine outcome plus independent re-scoring.
#[derive(Debug, Clone)]
pub struct SolveReport {
    outcome: LocalSearchEngineOutcome,
    initial: ObjectiveBreakdown,
    rescored: ObjectiveBreakdown,
    random_seed: u64,
}

impl SolveReport {
    #[inline]
    pub fn outcome(&self) -> &LocalSearchEngineOutcome {
        &self.outcome
    }

    /// The returned assignment.
    #[inline]
    pub fn assignment(&self) -> &Assignment {
        self.outcome.assignment()
    }

    #[inline]
    pub fn into_assignment(self) -> Assignment {
        self.outcome.into_assignment()
    }

    /// The objective of the seed assignment.
    #[inline]
    pub fn initial(&self) -> ObjectiveBreakdown {
        self.initial
    }

    /// The objective of the returned assignment, recomputed from scratch.
    #[inline]
    pub fn rescored(&self) -> ObjectiveBreakdown {
        self.rescored
    }

    /// The gap between the engine's incremental score and the recomputation.
    #[inline]
    pub fn score_drift(&self) -> f64 {
        drift(self.outcome.score(), self.rescored.score)
    }

    /// The master seed the random streams were derived from.
    #[inline]
    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }
}

impl std::fmt::Display for SolveReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Initial  {}", self.initial)?;
        writeln!(f, "Final    {}", self.rescored)?;
        writeln!(
            f,
            "Improvement: {:.10}",
            self.rescored.score - self.initial.score
        )?;
        write!(f, "{}", self.outcome)
    }
}

/// Runs the assignment search for one configuration.
#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    stop_signal: Arc<AtomicBool>,
}

impl Solver {
    /// Creates a solver after validating `config`.
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self {
            config,
            stop_signal: Arc::new(AtomicBool::new(false)),
        })
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Returns a handle that stops the running search when set to `true`.
    #[inline]
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Raises the stop signal.
    #[inline]
    pub fn request_stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
    }

    /// Improves `seed` and returns the best assignment found.
    ///
    /// Fails before the search starts if the seed does not cover every student
    /// of `model` exactly once or if it exceeds a university's capacity.
    #[tracing::instrument(
        skip_all,
        fields(
            students = model.num_students(),
            universities = model.num_universities(),
            policy = %self.config.acceptance_policy,
        )
    )]
    pub fn solve(&self, model: &Model, seed: Assignment) -> Result<SolveReport, SolverError> {
        let objective = self.config.objective();
        let initial = evaluate_assignment(model, &seed, objective)?;
        info!(
            fpe = initial.student,
            fpu = initial.university,
            score = initial.score,
            "seed assignment verified"
        );

        let random_seed = self.config.random_seed.unwrap_or_else(rand::random);
        debug!(random_seed, "random streams seeded");
        let mut master = ChaCha8Rng::seed_from_u64(random_seed);
        let mut generator = UniformSwapGenerator::new(ChaCha8Rng::from_rng(&mut master));
        let mut metaheuristic = self.build_metaheuristic(ChaCha8Rng::from_rng(&mut master));

        let evaluator = WeightedObjectiveEvaluator::new(model, objective);

        let mut monitor = CompositeLocalSearchMonitor::with_capacity(4);
        monitor.add_monitor(TimeLimitMonitor::new(self.config.time_limit()));
        monitor.add_monitor(InterruptMonitor::new(&self.stop_signal));
        monitor.add_monitor(LogMonitor::new(
            self.config.acceptance_policy.to_string(),
            self.config.log_interval(),
        ));
        if let Some(limit) = self.config.iteration_limit {
            monitor.add_monitor(IterationLimitMonitor::new(limit));
        }

        let outcome = LocalSearchEngine::new().run(
            model,
            &evaluator,
            &mut generator,
            metaheuristic.as_mut(),
            &mut monitor,
            seed,
        );

        let rescored = objective.evaluate(model, outcome.assignment());
        let report = SolveReport {
            outcome,
            initial,
            rescored,
            random_seed,
        };

        let score_drift = report.score_drift();
        if score_drift > self.config.verify_tolerance {
            warn!(
                incremental = report.outcome.score(),
                recomputed = rescored.score,
                drift = score_drift,
                tolerance = self.config.verify_tolerance,
                "incremental score drifted from the recomputed objective"
            );
        }

        debug_assert!(
            report.assignment().check_capacities(model).is_ok(),
            "called `Solver::solve` and the engine returned an assignment that violates capacities"
        );

        info!(
            reason = %report.outcome.termination_reason(),
            initial_score = initial.score,
            final_score = rescored.score,
            fpe = rescored.student,
            fpu = rescored.university,
            "solve finished"
        );

        Ok(report)
    }

    fn build_metaheuristic(&self, rng: ChaCha8Rng) -> Box<dyn Metaheuristic> {
        let config = &self.config;
        match (config.acceptance_policy, config.cooling) {
            (AcceptancePolicy::Greedy, _) => Box::new(GreedyDescent::new()),
            (AcceptancePolicy::Annealing, CoolingKind::LinearTime) => {
                Box::new(SimulatedAnnealing::new(
                    TimeLinearCooling::new(
                        config.initial_temperature,
                        config.time_limit(),
                        config.min_temperature,
                    ),
                    rng,
                ))
            }
            (AcceptancePolicy::Annealing, CoolingKind::Geometric) => {
                Box::new(SimulatedAnnealing::new(
                    GeometricCooling::new(
                        config.initial_temperature,
                        config.cooling_factor,
                        config.min_temperature,
                    ),
                    rng,
                ))
            }
        }
    }
}

/// Checks `assignment` against `model` and computes its objective from scratch.
///
/// This is the independent scorer: it shares no state with the search.
pub fn evaluate_assignment(
    model: &Model,
    assignment: &Assignment,
    objective: Objective,
) -> Result<ObjectiveBreakdown, SolverError> {
    assignment.validate_against(model)?;
    assignment.check_capacities(model)?;
    Ok(objective.evaluate(model, assignment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use unimatch_ls::result::LocalSearchTerminationReason;
    use unimatch_model::loading::InstanceLoader;

    const STUDENTS: &str = "student_id,pref_1,pref_2,pref_3\n\
        1,10,20,30\n\
        2,10,30,\n\
        3,20,10,\n\
        4,30,20,10\n\
        5,10,,\n\
        6,20,30,\n";
    const UNIVERSITIES: &str = "university_id,cap\n10,2\n20,2\n30,3\n";
    const MERIT: &str = "student_id,merit_rank\n1,3\n2,1\n3,6\n4,2\n5,4\n6,5\n";
    // Deliberately poor: nobody sits at their first choice.
    const SEED: &str = "student_id,university_id\n1,30\n2,20\n3,30\n4,10\n5,20\n6,10\n";

    fn instance() -> (Model, Assignment) {
        let loader = InstanceLoader::new();
        let model = loader
            .load_model_from_str(STUDENTS, UNIVERSITIES, MERIT)
            .expect("model should load");
        let seed = loader
            .load_assignment_from_str(&model, SEED)
            .expect("seed should load");
        (model, seed)
    }

    fn config(policy: AcceptancePolicy) -> SolverConfig {
        SolverConfig {
            acceptance_policy: policy,
            iteration_limit: Some(20_000),
            time_limit_secs: 30.0,
            random_seed: Some(7),
            ..SolverConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Solver::new(SolverConfig {
            alpha: 2.0,
            ..SolverConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, SolverError::Config(_)));
    }

    #[test]
    fn test_greedy_improves_and_rescoring_agrees() {
        let (model, seed) = instance();
        let counts_before = seed.counts(model.num_universities());

        let solver = Solver::new(config(AcceptancePolicy::Greedy)).unwrap();
        let report = solver.solve(&model, seed).unwrap();

        assert!(report.rescored().score > report.initial().score);
        assert!(report.score_drift() <= 1e-9);
        assert_eq!(
            report.assignment().counts(model.num_universities()),
            counts_before
        );
        assert_eq!(
            report.outcome().termination_reason(),
            &LocalSearchTerminationReason::IterationLimit
        );
    }

    #[test]
    fn test_annealing_is_reproducible_with_fixed_seed() {
        let (model, seed) = instance();
        let solver = Solver::new(config(AcceptancePolicy::Annealing)).unwrap();

        let first = solver.solve(&model, seed.clone()).unwrap();
        let second = solver.solve(&model, seed).unwrap();

        assert_eq!(first.random_seed(), 7);
        assert_eq!(first.assignment(), second.assignment());
        assert_eq!(first.rescored(), second.rescored());
        assert!(first.rescored().score >= first.initial().score);
    }

    #[test]
    fn test_geometric_cooling_runs() {
        let (model, seed) = instance();
        let solver = Solver::new(SolverConfig {
            cooling: CoolingKind::Geometric,
            cooling_factor: 0.99,
            ..config(AcceptancePolicy::Annealing)
        })
        .unwrap();

        let report = solver.solve(&model, seed).unwrap();
        assert!(report.rescored().score >= report.initial().score);
        assert!(report.assignment().check_capacities(&model).is_ok());
    }

    #[test]
    fn test_stop_signal_returns_seed_untouched() {
        let (model, seed) = instance();
        let solver = Solver::new(config(AcceptancePolicy::Annealing)).unwrap();
        solver.request_stop();
        assert!(solver.stop_signal().load(Ordering::Relaxed));

        let report = solver.solve(&model, seed.clone()).unwrap();
        assert!(report.outcome().termination_reason().is_interrupted());
        assert_eq!(report.assignment(), &seed);
        assert_eq!(report.rescored(), report.initial());
    }

    #[test]
    fn test_seed_over_capacity_is_rejected() {
        let (model, _) = instance();
        let seed = InstanceLoader::new()
            .load_assignment_from_str(
                &model,
                "student_id,university_id\n1,10\n2,10\n3,10\n4,20\n5,30\n6,30\n",
            )
            .unwrap();

        let solver = Solver::new(config(AcceptancePolicy::Greedy)).unwrap();
        match solver.solve(&model, seed) {
            Err(SolverError::Capacity(violation)) => {
                assert_eq!(violation.university, 10);
                assert_eq!(violation.assigned, 3);
                assert_eq!(violation.capacity, 2);
            }
            other => panic!("expected a capacity error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_evaluate_assignment_matches_objective() {
        let (model, seed) = instance();
        let objective = Objective::new(0.3);
        let breakdown = evaluate_assignment(&model, &seed, objective).unwrap();
        assert_eq!(breakdown, objective.evaluate(&model, &seed));
        let weighted = 0.3 * breakdown.student + 0.7 * breakdown.university;
        assert!((breakdown.score - weighted).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_assignment_rejects_wrong_length() {
        let (model, _) = instance();
        let short = Assignment::new(Vec::new());
        assert!(matches!(
            evaluate_assignment(&model, &short, Objective::default()),
            Err(SolverError::Assignment(_))
        ));
    }
}

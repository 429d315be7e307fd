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

//! Simulated Annealing metaheuristic.
//!
//! Improving swaps are always taken. A swap that does not improve the score
//! is accepted with the Metropolis probability `exp(delta / T)`, where `delta`
//! is the (non-positive) score change of the swap and `T` the current
//! temperature. Since the objective is maximized, larger losses and lower
//! temperatures both make acceptance less likely. An equal-score swap has
//! probability one and is always taken while the schedule is not frozen.
//!
//! The temperature is owned by a `CoolingSchedule`. The default schedule,
//! `TimeLinearCooling`, ties the temperature to the wall clock so that it
//! falls linearly from its initial value to a small floor exactly at the time
//! limit. `GeometricCooling` multiplies the temperature by a constant factor
//! after every decided move and freezes below a minimum temperature, after
//! which the policy degenerates to strict hill climbing.
//!
//! Probabilities that are not finite (a `NaN` delta, a non-positive
//! temperature) lead to rejection. Probabilities that underflow to zero are
//! rejected by the draw itself.

use crate::{
    eval::SwapDelta, meta::metaheuristic::Metaheuristic,
    monitor::local_search_monitor::SearchCommand, state::SearchState,
};
use rand::Rng;
use std::time::{Duration, Instant};

/// Defines the temperature of the annealing process over time.
pub trait CoolingSchedule: Send + std::fmt::Debug {
    /// Resets the temperature to its initial state.
    /// Called once at the start of the search.
    fn on_start(&mut self);

    /// Updates the temperature for the next iteration.
    /// Called after every decided move (accepted or rejected).
    fn update(&mut self);

    /// Brings the temperature up to date right before an acceptance decision.
    /// Schedules driven by move counts keep the default no-op.
    #[inline]
    fn refresh(&mut self) {}

    /// Returns the current temperature ($T$).
    fn current(&self) -> f64;

    /// Returns `true` if the temperature is low enough to stop accepting non-improving moves.
    fn is_frozen(&self) -> bool;
}

/// A wall-clock schedule: $T(t) = \max(T_{min}, T_0 (1 - t / t_{limit}))$.
///
/// The floor keeps the temperature positive, so the Metropolis criterion stays
/// defined until the very end of the run and the schedule never freezes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeLinearCooling {
    initial: f64,
    min_temp: f64,
    time_limit: Duration,
    start_time: Instant,
    current: f64,
}

impl TimeLinearCooling {
    /// Creates a new time-linear cooling schedule.
    ///
    /// # Panics
    ///
    /// Panics if `min_temp` is not strictly positive.
    #[inline]
    pub fn new(initial: f64, time_limit: Duration, min_temp: f64) -> Self {
        assert!(
            min_temp > 0.0,
            "called `TimeLinearCooling::new()` with invalid min_temp: {}. Must be positive",
            min_temp
        );
        Self {
            initial,
            min_temp,
            time_limit,
            start_time: Instant::now(),
            current: initial.max(min_temp),
        }
    }

    /// Returns the temperature after `elapsed` time.
    #[inline]
    pub fn temperature_at(&self, elapsed: Duration) -> f64 {
        let limit = self.time_limit.as_secs_f64();
        if limit <= 0.0 {
            return self.min_temp;
        }
        let remaining = (1.0 - elapsed.as_secs_f64() / limit).max(0.0);
        (self.initial * remaining).max(self.min_temp)
    }
}

impl CoolingSchedule for TimeLinearCooling {
    #[inline]
    fn on_start(&mut self) {
        self.start_time = Instant::now();
        self.current = self.temperature_at(Duration::ZERO);
    }

    /// The clock drives this schedule; see `refresh`.
    #[inline]
    fn update(&mut self) {}

    #[inline]
    fn refresh(&mut self) {
        self.current = self.temperature_at(self.start_time.elapsed());
    }

    #[inline]
    fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    fn is_frozen(&self) -> bool {
        false
    }
}

/// A geometric cooling schedule: $T_{k+1} = T_k \times \alpha$.
///
/// It cools rapidly at first and then slows down as it approaches zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricCooling {
    initial: f64,
    current: f64,
    alpha: f64, // The decay rate (e.g., 0.999999)
    min_temp: f64,
}

impl GeometricCooling {
    /// Creates a new geometric cooling schedule.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not strictly between `0.0` and `1.0`.
    #[inline]
    pub fn new(initial: f64, alpha: f64, min_temp: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "called `GeometricCooling::new()` with invalid alpha: {}. Must be in (0.0, 1.0)",
            alpha
        );
        Self {
            initial,
            current: initial,
            alpha,
            min_temp,
        }
    }
}

impl CoolingSchedule for GeometricCooling {
    #[inline]
    fn on_start(&mut self) {
        self.current = self.initial;
    }

    #[inline]
    fn update(&mut self) {
        self.current *= self.alpha;
    }

    #[inline]
    fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    fn is_frozen(&self) -> bool {
        self.current <= self.min_temp
    }
}

/// A Simulated Annealing metaheuristic powered by a pluggable `CoolingSchedule`.
///
/// It uses the **Metropolis Criterion** to decide whether to accept a move:
/// $$ P(\text{accept}) = \min\left(1, \exp\left(\frac{\Delta}{T}\right)\right) $$
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing<R, C> {
    cooling_schedule: C,
    rng: R,
}

impl<R, C> SimulatedAnnealing<R, C>
where
    R: Rng,
    C: CoolingSchedule,
{
    /// Creates a new Simulated Annealing instance.
    ///
    /// # Arguments
    /// * `cooling_schedule`: The strategy for temperature decay (e.g., `TimeLinearCooling`).
    /// * `rng`: The random number generator used for the probabilistic acceptance check.
    #[inline]
    pub fn new(cooling_schedule: C, rng: R) -> Self {
        Self {
            cooling_schedule,
            rng,
        }
    }

    /// Returns the current temperature.
    #[inline]
    pub fn temperature(&self) -> f64 {
        self.cooling_schedule.current()
    }

    /// Returns the cooling schedule.
    #[inline]
    pub fn cooling_schedule(&self) -> &C {
        &self.cooling_schedule
    }
}

impl<R, C> Metaheuristic for SimulatedAnnealing<R, C>
where
    R: Rng + Send,
    C: CoolingSchedule,
{
    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }

    fn tracks_best_assignment(&self) -> bool {
        true
    }

    fn on_start(&mut self, _state: &SearchState) {
        self.cooling_schedule.on_start();
    }

    fn search_command(&mut self, _iteration: u64, _state: &SearchState) -> SearchCommand {
        SearchCommand::Continue
    }

    fn should_accept(&mut self, delta: &SwapDelta, _state: &SearchState) -> bool {
        if delta.score > 0.0 {
            return true;
        }

        self.cooling_schedule.refresh();
        if self.cooling_schedule.is_frozen() {
            return false;
        }

        let temperature = self.cooling_schedule.current();
        if !temperature.is_finite() || temperature <= 0.0 {
            return false;
        }

        let acceptance_probability = (delta.score / temperature).exp();
        if !acceptance_probability.is_finite() {
            return false;
        }

        self.rng.random::<f64>() < acceptance_probability
    }

    fn on_accept(&mut self, _state: &SearchState) {
        self.cooling_schedule.update();
    }

    fn on_reject(&mut self, _state: &SearchState) {
        // Temperature decays regardless of outcome.
        self.cooling_schedule.update();
    }

    fn on_new_best(&mut self, _state: &SearchState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{objective::Objective, testing};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn delta(score: f64) -> SwapDelta {
        SwapDelta {
            student: 0.0,
            university: 0.0,
            score,
        }
    }

    fn state() -> SearchState {
        let (model, assignment) = testing::random_instance(&mut ChaCha8Rng::seed_from_u64(3), 6, 2);
        SearchState::new(&model, &Objective::default(), assignment, true)
    }

    fn hour() -> Duration {
        Duration::from_secs(3600)
    }

    #[test]
    fn test_name_and_tracking() {
        let sa = SimulatedAnnealing::new(
            TimeLinearCooling::new(1e-7, hour(), 1e-10),
            ChaCha8Rng::seed_from_u64(42),
        );
        assert_eq!(sa.name(), "SimulatedAnnealing");
        assert!(sa.tracks_best_assignment());
    }

    #[test]
    fn test_time_linear_temperature_profile() {
        let cooling = TimeLinearCooling::new(1.0, Duration::from_secs(100), 1e-10);
        assert!((cooling.temperature_at(Duration::ZERO) - 1.0).abs() < 1e-12);
        assert!((cooling.temperature_at(Duration::from_secs(50)) - 0.5).abs() < 1e-12);
        assert_eq!(cooling.temperature_at(Duration::from_secs(100)), 1e-10);
        assert_eq!(cooling.temperature_at(Duration::from_secs(500)), 1e-10);
    }

    #[test]
    fn test_time_linear_zero_limit_is_floor() {
        let mut cooling = TimeLinearCooling::new(1.0, Duration::ZERO, 1e-10);
        cooling.on_start();
        assert_eq!(cooling.current(), 1e-10);
        assert!(!cooling.is_frozen());
    }

    #[test]
    fn test_geometric_cooling_freezes() {
        let mut cooling = GeometricCooling::new(1.0, 0.5, 0.2);
        cooling.on_start();
        assert!(!cooling.is_frozen());
        cooling.update();
        cooling.update();
        assert!((cooling.current() - 0.25).abs() < 1e-12);
        assert!(!cooling.is_frozen());
        cooling.update();
        assert!(cooling.is_frozen());
        cooling.on_start();
        assert_eq!(cooling.current(), 1.0);
    }

    #[test]
    fn test_should_accept_strict_improvement_even_when_frozen() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            GeometricCooling::new(1.0, 0.99, 1.0),
            ChaCha8Rng::seed_from_u64(42),
        );
        sa.on_start(&state);
        assert!(sa.should_accept(&delta(1e-15), &state));
    }

    #[test]
    fn test_frozen_rejects_equal_and_worse() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            GeometricCooling::new(1.0, 0.99, 1.0),
            ChaCha8Rng::seed_from_u64(42),
        );
        sa.on_start(&state);
        assert!(!sa.should_accept(&delta(0.0), &state));
        assert!(!sa.should_accept(&delta(-1e-9), &state));
    }

    #[test]
    fn test_equal_score_accepted_with_certainty() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            TimeLinearCooling::new(1e-7, hour(), 1e-10),
            ChaCha8Rng::seed_from_u64(42),
        );
        sa.on_start(&state);
        for _ in 0..1000 {
            assert!(sa.should_accept(&delta(0.0), &state));
        }
    }

    #[test]
    fn test_metropolis_frequency() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            TimeLinearCooling::new(1e-7, hour(), 1e-10),
            ChaCha8Rng::seed_from_u64(7),
        );
        sa.on_start(&state);

        // delta = -T gives exp(-1) ~ 0.368 at the start of a long run.
        let trials = 20_000;
        let accepted = (0..trials)
            .filter(|_| sa.should_accept(&delta(-1e-7), &state))
            .count();
        let rate = accepted as f64 / trials as f64;
        assert!((0.34..0.40).contains(&rate), "acceptance rate {}", rate);
    }

    #[test]
    fn test_underflow_and_nan_reject() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            TimeLinearCooling::new(1e-7, hour(), 1e-10),
            ChaCha8Rng::seed_from_u64(42),
        );
        sa.on_start(&state);
        for _ in 0..1000 {
            assert!(!sa.should_accept(&delta(-1.0), &state));
            assert!(!sa.should_accept(&delta(f64::NAN), &state));
            assert!(!sa.should_accept(&delta(f64::NEG_INFINITY), &state));
        }
    }

    #[test]
    fn test_time_linear_temperature_read_at_decision_time() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            TimeLinearCooling::new(1.0, Duration::from_millis(30), 1e-10),
            ChaCha8Rng::seed_from_u64(42),
        );
        sa.on_start(&state);
        assert_eq!(sa.temperature(), 1.0);

        std::thread::sleep(Duration::from_millis(60));

        // At T = 1 this delta is accepted ~99.9% of the time; at the floor never.
        for _ in 0..100 {
            assert!(!sa.should_accept(&delta(-1e-3), &state));
        }
        assert_eq!(sa.temperature(), 1e-10);
    }

    #[test]
    fn test_geometric_refresh_does_not_cool() {
        let mut cooling = GeometricCooling::new(1.0, 0.5, 0.0);
        cooling.on_start();
        cooling.refresh();
        cooling.refresh();
        assert_eq!(cooling.current(), 1.0);
    }

    #[test]
    fn test_hooks_advance_schedule() {
        let state = state();
        let mut sa = SimulatedAnnealing::new(
            GeometricCooling::new(1.0, 0.5, 0.0),
            ChaCha8Rng::seed_from_u64(42),
        );
        sa.on_start(&state);
        sa.on_accept(&state);
        sa.on_reject(&state);
        sa.on_new_best(&state);
        assert!((sa.temperature() - 0.25).abs() < 1e-12);
        assert_eq!(sa.search_command(0, &state), SearchCommand::Continue);
    }
}

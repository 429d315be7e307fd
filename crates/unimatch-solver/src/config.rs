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

//! Solver configuration.
//!
//! A `SolverConfig` is assembled from three layers, lowest precedence first:
//! the built-in defaults, an optional JSON file, and explicit overrides (the
//! command line). Missing JSON fields fall back to the defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr, time::Duration};
use unimatch_ls::objective::Objective;

/// How the search decides whether a proposed swap is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptancePolicy {
    /// Keep strictly improving swaps only.
    Greedy,
    /// Metropolis acceptance under a decreasing temperature.
    #[default]
    Annealing,
}

impl std::fmt::Display for AcceptancePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Annealing => write!(f, "annealing"),
        }
    }
}

impl FromStr for AcceptancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "annealing" | "sa" => Ok(Self::Annealing),
            other => Err(format!("unknown acceptance policy '{}'", other)),
        }
    }
}

/// The temperature schedule used by the annealing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolingKind {
    /// Linear decrease from the initial temperature to zero over the time limit.
    #[default]
    LinearTime,
    /// Multiply the temperature by `cooling_factor` after every accepted swap.
    Geometric,
}

impl std::fmt::Display for CoolingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinearTime => write!(f, "linear-time"),
            Self::Geometric => write!(f, "geometric"),
        }
    }
}

impl FromStr for CoolingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "linear-time" | "linear" => Ok(Self::LinearTime),
            "geometric" => Ok(Self::Geometric),
            other => Err(format!("unknown cooling schedule '{}'", other)),
        }
    }
}

/// Parameters of a single solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Weight of the student component in the score.
    pub alpha: f64,
    /// Wall-clock budget of the search in seconds.
    pub time_limit_secs: f64,
    pub acceptance_policy: AcceptancePolicy,
    pub initial_temperature: f64,
    /// Lower bound of the temperature; also the freeze point for geometric cooling.
    pub min_temperature: f64,
    pub cooling: CoolingKind,
    pub cooling_factor: f64,
    /// Seed of all random streams; OS entropy when absent.
    pub random_seed: Option<u64>,
    pub iteration_limit: Option<u64>,
    pub log_interval_secs: f64,
    /// Largest accepted gap between the incremental and the recomputed final score.
    pub verify_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            time_limit_secs: 3600.0,
            acceptance_policy: AcceptancePolicy::Annealing,
            initial_temperature: 1e-7,
            min_temperature: 1e-10,
            cooling: CoolingKind::LinearTime,
            cooling_factor: 0.999_999,
            random_seed: None,
            iteration_limit: None,
            log_interval_secs: 10.0,
            verify_tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    /// Parses a configuration from JSON; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every parameter range. The solver refuses to start otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::AlphaOutOfRange(self.alpha));
        }
        if !(self.time_limit_secs > 0.0) || !self.time_limit_secs.is_finite() {
            return Err(ConfigError::NonPositiveTimeLimit);
        }
        if !(self.log_interval_secs > 0.0) || !self.log_interval_secs.is_finite() {
            return Err(ConfigError::NonPositiveLogInterval);
        }
        if !(self.verify_tolerance >= 0.0) || !self.verify_tolerance.is_finite() {
            return Err(ConfigError::InvalidTolerance(self.verify_tolerance));
        }

        // Temperatures only matter for annealing; greedy runs ignore them.
        if self.acceptance_policy == AcceptancePolicy::Annealing {
            check_temperature("initial_temperature", self.initial_temperature)?;
            check_temperature("min_temperature", self.min_temperature)?;
            if self.min_temperature > self.initial_temperature {
                return Err(ConfigError::TemperatureOrder {
                    initial: self.initial_temperature,
                    min: self.min_temperature,
                });
            }
            if self.cooling == CoolingKind::Geometric
                && !(self.cooling_factor > 0.0 && self.cooling_factor < 1.0)
            {
                return Err(ConfigError::InvalidCoolingFactor(self.cooling_factor));
            }
        }
        Ok(())
    }

    /// Returns the time limit as a `Duration`.
    ///
    /// Only meaningful after `validate` succeeded.
    #[inline]
    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit_secs).unwrap_or(Duration::MAX)
    }

    #[inline]
    pub fn log_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.log_interval_secs).unwrap_or(Duration::MAX)
    }

    /// Returns the weighted objective for `alpha`.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` lies outside `[0, 1]`; call `validate` first.
    #[inline]
    pub fn objective(&self) -> Objective {
        Objective::new(self.alpha)
    }
}

fn check_temperature(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveTemperature { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.time_limit(), Duration::from_secs(3600));
        assert_eq!(config.log_interval(), Duration::from_secs(10));
        assert_eq!(config.acceptance_policy, AcceptancePolicy::Annealing);
        assert_eq!(config.cooling, CoolingKind::LinearTime);
        assert!(config.random_seed.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SolverConfig::from_json_str(
            r#"{ "alpha": 0.25, "acceptance_policy": "greedy", "random_seed": 42 }"#,
        )
        .unwrap();
        assert_eq!(config.alpha, 0.25);
        assert_eq!(config.acceptance_policy, AcceptancePolicy::Greedy);
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.time_limit_secs, 3600.0);
        assert_eq!(config.initial_temperature, 1e-7);
    }

    #[test]
    fn test_json_cooling_variant() {
        let config =
            SolverConfig::from_json_str(r#"{ "cooling": "geometric", "cooling_factor": 0.9 }"#)
                .unwrap();
        assert_eq!(config.cooling, CoolingKind::Geometric);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_unknown_policy_is_rejected() {
        let err = SolverConfig::from_json_str(r#"{ "acceptance_policy": "tabu" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = SolverConfig::from_json_path("/definitely/not/here.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.contains("not/here.json")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_alpha() {
        for alpha in [-0.1, 1.5, f64::NAN] {
            let config = SolverConfig {
                alpha,
                ..SolverConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::AlphaOutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_validate_rejects_bad_time_limit() {
        let config = SolverConfig {
            time_limit_secs: 0.0,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveTimeLimit)
        ));
    }

    #[test]
    fn test_validate_temperatures_only_for_annealing() {
        let mut config = SolverConfig {
            initial_temperature: 0.0,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveTemperature {
                name: "initial_temperature",
                ..
            })
        ));

        config.acceptance_policy = AcceptancePolicy::Greedy;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_temperature_order() {
        let config = SolverConfig {
            initial_temperature: 1e-9,
            min_temperature: 1e-6,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TemperatureOrder { .. })
        ));
    }

    #[test]
    fn test_validate_cooling_factor() {
        let config = SolverConfig {
            cooling: CoolingKind::Geometric,
            cooling_factor: 1.0,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCoolingFactor(_))
        ));
    }

    #[test]
    fn test_policy_and_cooling_from_str() {
        assert_eq!("Greedy".parse(), Ok(AcceptancePolicy::Greedy));
        assert_eq!("annealing".parse(), Ok(AcceptancePolicy::Annealing));
        assert!("tabu".parse::<AcceptancePolicy>().is_err());

        assert_eq!("linear-time".parse(), Ok(CoolingKind::LinearTime));
        assert_eq!("linear_time".parse(), Ok(CoolingKind::LinearTime));
        assert_eq!("geometric".parse(), Ok(CoolingKind::Geometric));
        assert!("cubic".parse::<CoolingKind>().is_err());
    }

    #[test]
    fn test_config_json_round_trip_names() {
        let json = serde_json::to_string(&SolverConfig::default()).unwrap();
        assert!(json.contains("\"acceptance_policy\":\"annealing\""));
        assert!(json.contains("\"cooling\":\"linear_time\""));
    }
}

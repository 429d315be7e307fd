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

//! Error types of the solver front end.

use unimatch_model::assignment::{AssignmentError, CapacityViolation};

/// The error type for an invalid or unreadable `SolverConfig`.
#[derive(Debug)]
pub enum ConfigError {
    /// The weight `alpha` lies outside `[0, 1]` or is not a number.
    AlphaOutOfRange(f64),
    /// The time limit is zero.
    NonPositiveTimeLimit,
    /// A temperature parameter is zero, negative or not finite.
    NonPositiveTemperature { name: &'static str, value: f64 },
    /// The minimum temperature exceeds the initial temperature.
    TemperatureOrder { initial: f64, min: f64 },
    /// The geometric cooling factor lies outside `(0, 1)`.
    InvalidCoolingFactor(f64),
    /// The progress log interval is zero.
    NonPositiveLogInterval,
    /// The drift tolerance is negative or not finite.
    InvalidTolerance(f64),
    /// The configuration file could not be read.
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for a `SolverConfig`.
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlphaOutOfRange(alpha) => {
                write!(f, "alpha must lie in [0, 1], got {}", alpha)
            }
            Self::NonPositiveTimeLimit => write!(f, "time limit must be positive"),
            Self::NonPositiveTemperature { name, value } => {
                write!(f, "{} must be positive and finite, got {}", name, value)
            }
            Self::TemperatureOrder { initial, min } => write!(
                f,
                "min temperature {} exceeds initial temperature {}",
                min, initial
            ),
            Self::InvalidCoolingFactor(factor) => {
                write!(f, "cooling factor must lie in (0, 1), got {}", factor)
            }
            Self::NonPositiveLogInterval => write!(f, "log interval must be positive"),
            Self::InvalidTolerance(tolerance) => write!(
                f,
                "verify tolerance must be non-negative and finite, got {}",
                tolerance
            ),
            Self::Io { path, source } => {
                write!(f, "cannot read config file '{}': {}", path, source)
            }
            Self::Json(e) => write!(f, "invalid config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// The error type for a solve request that cannot start.
#[derive(Debug)]
pub enum SolverError {
    Config(ConfigError),
    /// The seed assignment does not cover the model's students exactly once.
    Assignment(AssignmentError),
    /// The seed assignment exceeds a university's capacity.
    Capacity(CapacityViolation),
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Assignment(e) => write!(f, "Invalid seed assignment: {}", e),
            Self::Capacity(e) => write!(f, "Infeasible seed assignment: {}", e),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Assignment(e) => Some(e),
            Self::Capacity(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SolverError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AssignmentError> for SolverError {
    fn from(e: AssignmentError) -> Self {
        Self::Assignment(e)
    }
}

impl From<CapacityViolation> for SolverError {
    fn from(e: CapacityViolation) -> Self {
        Self::Capacity(e)
    }
}

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

//! # Unimatch Local Search
//!
//! **Swap-based local search and simulated annealing for the student/university assignment.**
//!
//! Starting from a seed assignment, the engine repeatedly proposes to exchange
//! the universities of two students, evaluates the exact objective change in
//! constant time and lets a metaheuristic decide whether the exchange is kept.
//!
//! ## Architecture
//!
//! * **`objective`**: The weighted `FPE`/`FPU` objective, computed from scratch.
//! * **`state`**: The current assignment with its incrementally maintained merit sums and score, plus the best-so-far record.
//! * **`eval`**: The constant-time `SwapEvaluator`.
//! * **`operator`**: `Swap` moves and the `MoveGenerator`s proposing them.
//! * **`meta`**: Acceptance policies (`GreedyDescent`, `SimulatedAnnealing`) and cooling schedules.
//! * **`monitor`**: Time limit, cancellation, iteration limit and progress logging.
//! * **`engine`**: The driver loop.
//! * **`stats`** / **`result`**: Run statistics and the final outcome.

pub mod engine;
pub mod eval;
pub mod meta;
pub mod monitor;
pub mod objective;
pub mod operator;
pub mod result;
pub mod state;
pub mod stats;

#[cfg(test)]
mod testing;

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

//! # Unimatch Model
//!
//! **The problem data for the student/university assignment search.**
//!
//! This crate holds everything the search engine reads but never writes, plus
//! the collaborators that move data in and out of it:
//!
//! * **`index`**: Strongly-typed dense indices (`StudentIndex`, `UniversityIndex`) and the external id types.
//! * **`model`**: The immutable `Model` (preference ranks, merit utilities, capacities) and its validating `ModelBuilder`.
//! * **`assignment`**: The student to university mapping, with seed validation and the capacity pre-flight check.
//! * **`loading`**: The CSV `InstanceLoader` for students, universities, merit ranks and seed assignments.
//! * **`writing`**: The CSV `AssignmentWriter`.
//!
//! ## Design Philosophy
//!
//! 1.  **Type Safety**: Students and universities are addressed through distinct index types.
//! 2.  **Memory Layout**: Per-entity data lives in flat vectors, and the per-student merit utility and per-university reciprocal capacity are precomputed so the delta evaluation is a handful of loads.
//! 3.  **Fail-Fast**: Every inconsistency between the input tables is reported before a search can start.

pub mod assignment;
pub mod index;
pub mod loading;
pub mod model;
pub mod writing;

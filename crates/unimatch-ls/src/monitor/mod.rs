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

//! Monitors observe a search run and decide when it ends.
//!
//! - `local_search_monitor`: the `LocalSearchMonitor` trait and `SearchCommand`.
//! - `composite`: fans every callback out to a list of monitors.
//! - `time`: stops the run at a wall-clock limit.
//! - `interrupt`: stops the run when a shared cancellation flag is raised.
//! - `iteration`: stops the run after a fixed number of iterations.
//! - `log`: structured progress reporting through `tracing`.

pub mod composite;
pub mod interrupt;
pub mod iteration;
pub mod local_search_monitor;
pub mod log;
pub mod time;

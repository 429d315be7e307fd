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

use crate::{
    monitor::local_search_monitor::{LocalSearchMonitor, SearchCommand},
    result::LocalSearchTerminationReason,
    state::SearchState,
    stats::LocalSearchStatistics,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// A monitor that checks an atomic boolean flag to determine
/// whether the search should be interrupted.
///
/// The flag is typically raised from another thread, for example a Ctrl-C
/// handler. It is read once per iteration, so the run always stops between
/// two moves and never in the middle of applying one.
#[derive(Debug, Clone)]
pub struct InterruptMonitor<'a> {
    stop_flag: &'a AtomicBool,
}

impl<'a> InterruptMonitor<'a> {
    /// Creates a new `InterruptMonitor` that monitors the given atomic boolean flag.
    /// The search will be terminated if the flag is set to `true`.
    #[inline(always)]
    pub fn new(stop_flag: &'a AtomicBool) -> Self {
        Self { stop_flag }
    }
}

impl LocalSearchMonitor for InterruptMonitor<'_> {
    fn name(&self) -> &str {
        "InterruptMonitor"
    }

    fn on_start(&mut self, _state: &SearchState) {}

    fn on_end(
        &mut self,
        _state: &SearchState,
        _statistics: &LocalSearchStatistics,
        _reason: &LocalSearchTerminationReason,
    ) {
    }

    fn on_iteration(&mut self, _state: &SearchState, _statistics: &LocalSearchStatistics) {}

    fn search_command(&mut self, _statistics: &LocalSearchStatistics) -> SearchCommand {
        if self.stop_flag.load(Ordering::Relaxed) {
            SearchCommand::Terminate(LocalSearchTerminationReason::Interrupted)
        } else {
            SearchCommand::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_monitor_continues_when_flag_is_clear() {
        let flag = AtomicBool::new(false);
        let mut monitor = InterruptMonitor::new(&flag);

        match monitor.search_command(&LocalSearchStatistics::default()) {
            SearchCommand::Continue => {}
            other => panic!("expected Continue, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_monitor_terminates_when_flag_is_set() {
        let flag = AtomicBool::new(false);
        let mut monitor = InterruptMonitor::new(&flag);

        flag.store(true, Ordering::Relaxed);

        match monitor.search_command(&LocalSearchStatistics::default()) {
            SearchCommand::Terminate(reason) => {
                assert_eq!(reason, LocalSearchTerminationReason::Interrupted);
            }
            other => panic!("expected Terminate, got {:?}", other),
        }
    }
}

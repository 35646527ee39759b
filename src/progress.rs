//! Dispatch progress display.
//!
//! Rewrites a single `Progress: NN%` line on stderr as cells are handed to
//! the workers. Purely cosmetic: correctness never depends on it, and the
//! line is suppressed entirely when stderr is not a terminal.

use std::io::{self, Write};

/// Completion percentage, clamped to whole percent.
fn percent(done: usize, total: usize) -> usize {
    if total == 0 {
        100
    } else {
        done * 100 / total
    }
}

/// Rewrites a progress line for a known amount of work.
#[derive(Debug)]
pub struct ProgressCounter {
    total: usize,
    enabled: bool,
}

impl ProgressCounter {
    /// Counter for `total` work items; silent when stderr is piped.
    pub fn new(total: usize) -> Self {
        Self { total, enabled: atty::is(atty::Stream::Stderr) }
    }

    /// Rewrite the progress line to reflect `done` completed items.
    pub fn update(&mut self, done: usize) {
        if !self.enabled {
            return;
        }
        eprint!("\rProgress: {}%", percent(done, self.total));
        io::stderr().flush().ok();
    }

    /// Terminate the progress line so following output starts clean.
    pub fn finish(&mut self) {
        if self.enabled {
            eprintln!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_whole_steps() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(3, 4), 75);
        assert_eq!(percent(4, 4), 100);
    }

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
    }

    #[test]
    fn test_percent_empty_total_is_complete() {
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_counter_is_silent_safe() {
        // No terminal in the test harness: update/finish must be no-ops
        let mut counter = ProgressCounter::new(10);
        counter.update(3);
        counter.finish();
    }
}

use serde::{Deserialize, Serialize};

/// Pomodoros per long-break group.
pub const CYCLES_PER_LONG_BREAK: u32 = 4;

/// Pomodoro cycle counter.
///
/// `0` means no Pomodoro session is in progress. Otherwise the count runs
/// 1..=4 and wraps back to 1 after the long break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTracker {
    count: u32,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Begin counting. A count carried over from an earlier start is kept.
    pub fn start(&mut self) -> u32 {
        if self.count == 0 {
            self.count = 1;
        }
        self.count
    }

    /// Record one finished (completed or skipped) break.
    pub fn advance(&mut self) -> u32 {
        self.count = if self.count >= CYCLES_PER_LONG_BREAK {
            1
        } else {
            self.count + 1
        };
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

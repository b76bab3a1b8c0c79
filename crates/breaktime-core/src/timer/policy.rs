//! Duration policy: which work interval and break length apply.
//!
//! Pure functions of the technique and the Pomodoro cycle number.

use chrono::Duration;

use super::cycle::CYCLES_PER_LONG_BREAK;
use super::technique::Technique;

pub const TWENTY_WORK_SECS: i64 = 20 * 60;
pub const TWENTY_BREAK_SECS: i64 = 20;
pub const POMODORO_WORK_SECS: i64 = 25 * 60;
pub const POMODORO_SHORT_BREAK_SECS: i64 = 5 * 60;
pub const POMODORO_LONG_BREAK_SECS: i64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub work: Duration,
    pub break_duration: Duration,
}

pub struct DurationPolicy;

impl DurationPolicy {
    pub fn durations(technique: &Technique, cycle: u32) -> Durations {
        Durations {
            work: Self::work(technique),
            break_duration: Self::break_duration(technique, cycle),
        }
    }

    pub fn work(technique: &Technique) -> Duration {
        match technique {
            Technique::TwentyTwentyTwenty => Duration::seconds(TWENTY_WORK_SECS),
            Technique::Pomodoro => Duration::seconds(POMODORO_WORK_SECS),
            Technique::Custom(rule) => rule.interval(),
        }
    }

    pub fn break_duration(technique: &Technique, cycle: u32) -> Duration {
        match technique {
            Technique::TwentyTwentyTwenty => Duration::seconds(TWENTY_BREAK_SECS),
            Technique::Pomodoro if Self::is_long_break(technique, cycle) => {
                Duration::seconds(POMODORO_LONG_BREAK_SECS)
            }
            Technique::Pomodoro => Duration::seconds(POMODORO_SHORT_BREAK_SECS),
            Technique::Custom(rule) => rule.break_duration(),
        }
    }

    /// The break that closes the fourth Pomodoro is the long one.
    pub fn is_long_break(technique: &Technique, cycle: u32) -> bool {
        technique.counts_cycles() && cycle >= CYCLES_PER_LONG_BREAK
    }
}

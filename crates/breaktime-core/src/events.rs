use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{PauseOrigin, SessionState, TechniqueKind};

/// How a break came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakOutcome {
    Completed,
    Skipped,
}

/// Every state change in the scheduler produces an Event.
/// Front ends render them; the runtime broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        technique: TechniqueKind,
        cycle: u32,
        work_secs: u64,
        at: DateTime<Utc>,
    },
    /// Periodic progress while the timer runs or a break counts down.
    Tick {
        state: SessionState,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    WarningShown {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    BreakStarted {
        technique: TechniqueKind,
        cycle: u32,
        break_secs: u64,
        long_break: bool,
        at: DateTime<Utc>,
    },
    BreakEnded {
        outcome: BreakOutcome,
        /// Cycle number of the work interval that starts now.
        cycle: u32,
        next_work_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_ms: u64,
        origin: PauseOrigin,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_ms: u64,
        origin: PauseOrigin,
        at: DateTime<Utc>,
    },
    SessionRestarted {
        work_secs: u64,
        at: DateTime<Utc>,
    },
    /// Escape pressed during a break but not yet enough to skip.
    SkipProgress {
        presses: u8,
        remaining: u8,
        at: DateTime<Utc>,
    },
    SkipPromptOpened {
        at: DateTime<Utc>,
    },
    SkipPromptDismissed {
        at: DateTime<Utc>,
    },
    SessionStopped {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        technique: Option<TechniqueKind>,
        cycle: u32,
        remaining_ms: Option<u64>,
        escape_presses: u8,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::Tick { at, .. }
            | Event::WarningShown { at, .. }
            | Event::BreakStarted { at, .. }
            | Event::BreakEnded { at, .. }
            | Event::SessionPaused { at, .. }
            | Event::SessionResumed { at, .. }
            | Event::SessionRestarted { at, .. }
            | Event::SkipProgress { at, .. }
            | Event::SkipPromptOpened { at }
            | Event::SkipPromptDismissed { at }
            | Event::SessionStopped { at }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    /// Ticks fire twice a second; everything else is worth logging.
    pub fn is_tick(&self) -> bool {
        matches!(self, Event::Tick { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let event = Event::BreakEnded {
            outcome: BreakOutcome::Skipped,
            cycle: 2,
            next_work_secs: 1500,
            at,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BreakEnded");
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(event.at(), at);
        assert!(!event.is_tick());
    }
}

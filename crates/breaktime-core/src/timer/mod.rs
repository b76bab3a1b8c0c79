mod cycle;
mod policy;
mod scheduler;
mod skip;
mod technique;

pub use cycle::{CycleTracker, CYCLES_PER_LONG_BREAK};
pub use policy::{DurationPolicy, Durations};
pub use scheduler::{
    BreakScheduler, PauseOrigin, SessionState, TICK_INTERVAL_MS, WARNING_THRESHOLD_SECS,
};
pub use skip::{SkipConfirmation, SkipSignal, ESCAPE_PRESSES_TO_SKIP};
pub use technique::{CustomRule, Technique, TechniqueKind};

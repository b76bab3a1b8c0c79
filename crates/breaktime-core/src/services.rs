//! Collaborators the scheduler calls into.
//!
//! Rendering, audio, settings storage and error display live outside the
//! core. Front ends implement these traits and hand them to
//! [`BreakScheduler::new`](crate::timer::BreakScheduler::new).

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SchedulerError;
use crate::timer::TechniqueKind;

/// What the break screen needs to present a break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakScreen {
    pub technique: TechniqueKind,
    pub cycle: u32,
    pub break_secs: u64,
    pub long_break: bool,
}

/// Overlay windows: the pre-break countdown and the break screen.
///
/// At most one of the two is visible; the scheduler always calls `hide()`
/// before switching from one to the other.
pub trait OverlayPresenter: Send {
    fn show_countdown_warning(&mut self, seconds_remaining: u64);

    fn show_break(&mut self, screen: &BreakScreen);

    fn hide(&mut self);
}

#[derive(Error, Debug)]
#[error("Sound playback failed: {0}")]
pub struct SoundError(pub String);

pub trait SoundPlayer: Send {
    /// Best effort; the scheduler logs and ignores failures.
    fn play_break_start(&mut self) -> Result<(), SoundError>;
}

/// Read-only view of user settings.
pub trait SettingsStore: Send {
    fn custom_interval(&self) -> Option<Duration>;

    fn custom_break_duration(&self) -> Option<Duration>;

    fn is_overlay_enabled(&self) -> bool;

    fn is_sound_enabled(&self) -> bool;
}

pub trait ErrorSink: Send {
    fn report(&mut self, error: &SchedulerError);
}

/// Fixed in-memory settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSettings {
    pub custom_interval_secs: Option<u64>,
    pub custom_break_secs: Option<u64>,
    pub overlay_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            custom_interval_secs: None,
            custom_break_secs: None,
            overlay_enabled: true,
            sound_enabled: true,
        }
    }
}

impl StaticSettings {
    pub fn with_custom(mut self, interval_secs: Option<u64>, break_secs: Option<u64>) -> Self {
        self.custom_interval_secs = interval_secs;
        self.custom_break_secs = break_secs;
        self
    }
}

pub(crate) fn secs_to_duration(secs: Option<u64>) -> Option<Duration> {
    secs.and_then(|s| i64::try_from(s).ok())
        .and_then(Duration::try_seconds)
}

impl SettingsStore for StaticSettings {
    fn custom_interval(&self) -> Option<Duration> {
        secs_to_duration(self.custom_interval_secs)
    }

    fn custom_break_duration(&self) -> Option<Duration> {
        secs_to_duration(self.custom_break_secs)
    }

    fn is_overlay_enabled(&self) -> bool {
        self.overlay_enabled
    }

    fn is_sound_enabled(&self) -> bool {
        self.sound_enabled
    }
}

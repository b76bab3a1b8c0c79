//! Status text for menu bars and terminals.

use chrono::Duration;

use crate::events::Event;
use crate::services::BreakScreen;
use crate::timer::{SessionState, TechniqueKind, ESCAPE_PRESSES_TO_SKIP};

/// `"42s"` under a minute, `"m:ss"` otherwise. Negative clamps to zero.
pub fn format_remaining(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let minutes = total / 60;
    let seconds = total % 60;
    if minutes == 0 {
        format!("{seconds}s")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// [`format_remaining`] for a whole-second count.
pub fn format_secs(secs: u64) -> String {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    format_remaining(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
}

/// [`format_remaining`] for a millisecond count.
pub fn format_millis(ms: u64) -> String {
    format_remaining(from_millis(ms))
}

fn from_millis(ms: u64) -> Duration {
    let ms = i64::try_from(ms).unwrap_or(i64::MAX);
    Duration::try_milliseconds(ms).unwrap_or(Duration::MAX)
}

/// One-line status, e.g. `"⏸ 4:59"` while paused or `"break 0:20"`.
pub fn status_line(state: SessionState, remaining: Option<Duration>) -> String {
    let Some(remaining) = remaining else {
        return String::new();
    };
    let time = format_remaining(remaining);
    match state {
        SessionState::Idle => String::new(),
        SessionState::Paused => format!("⏸ {time}"),
        SessionState::OnBreak => format!("break {time}"),
        SessionState::Running | SessionState::CountdownWarning => time,
    }
}

/// Headline and hint shown on the break screen.
pub fn break_message(screen: &BreakScreen) -> (&'static str, &'static str) {
    match screen.technique {
        TechniqueKind::TwentyTwentyTwenty => ("Quick break!", "Look 20 feet away for 20 seconds"),
        TechniqueKind::Pomodoro if screen.long_break => (
            "Long Break!",
            "Great work on completing 4 sessions! Take 30 minutes to recharge",
        ),
        TechniqueKind::Pomodoro => match screen.cycle {
            2 => ("You've Earned It!", "Relax those eyes and take a deep breath."),
            3 => ("Pause & Refresh", "Grab a snack or enjoy a quick stroll!"),
            _ => (
                "Break Time",
                "Take 5 minutes to recharge. Stretch, grab a drink, or just chill for a bit!",
            ),
        },
        TechniqueKind::Custom => ("Break time!", "Take a moment to unwind. You've earned it!"),
    }
}

/// Escape hint under the break countdown.
pub fn skip_hint(presses_remaining: u8) -> String {
    match presses_remaining {
        0 => String::new(),
        1 => "Press esc 1 more time to skip".to_string(),
        n if n < ESCAPE_PRESSES_TO_SKIP => format!("Press esc {n} more times to skip"),
        n => format!("Press esc {n} times to skip"),
    }
}

/// Status line for events that carry a remaining time.
pub fn event_status(event: &Event) -> Option<String> {
    let (state, remaining_ms) = match event {
        Event::Tick {
            state,
            remaining_ms,
            ..
        } => (*state, *remaining_ms),
        Event::SessionPaused { remaining_ms, .. } => (SessionState::Paused, *remaining_ms),
        Event::StateSnapshot {
            state,
            remaining_ms: Some(remaining_ms),
            ..
        } => (*state, *remaining_ms),
        _ => return None,
    };
    Some(status_line(state, Some(from_millis(remaining_ms))))
}

//! Terminal stand-ins for the overlay, chime and error alert.

use std::io::Write;

use breaktime_core::display::{break_message, format_secs, skip_hint};
use breaktime_core::services::SoundError;
use breaktime_core::timer::ESCAPE_PRESSES_TO_SKIP;
use breaktime_core::{BreakScreen, ErrorSink, OverlayPresenter, SchedulerError, SoundPlayer};

/// Prints the warning and break screens to stdout.
pub struct ConsoleOverlay {
    enabled: bool,
}

impl ConsoleOverlay {
    /// `enabled = false` keeps output quiet when events are printed as JSON.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl OverlayPresenter for ConsoleOverlay {
    fn show_countdown_warning(&mut self, seconds: u64) {
        if self.enabled {
            println!("[warning] break in {seconds}s (type `break` to start now)");
        }
    }

    fn show_break(&mut self, screen: &BreakScreen) {
        if !self.enabled {
            return;
        }
        let (title, hint) = break_message(screen);
        let length = format_secs(screen.break_secs);
        println!("[break] {title} {hint} ({length})");
        println!("[break] {}", skip_hint(ESCAPE_PRESSES_TO_SKIP));
    }

    fn hide(&mut self) {}
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play_break_start(&mut self) -> Result<(), SoundError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| SoundError(e.to_string()))
    }
}

/// Writes scheduler failures to stderr.
pub struct StderrAlert;

impl ErrorSink for StderrAlert {
    fn report(&mut self, error: &SchedulerError) {
        eprintln!("error: {error}");
    }
}

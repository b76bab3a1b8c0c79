//! Skip confirmation for an active break.
//!
//! A break is only abandoned early after the user insists: three escape
//! presses, or the skip button followed by "Skip" in its confirm prompt.

use serde::{Deserialize, Serialize};

pub const ESCAPE_PRESSES_TO_SKIP: u8 = 3;

/// Outcome of feeding one user action into [`SkipConfirmation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipSignal {
    /// More escape presses are needed.
    Pending { presses: u8, remaining: u8 },
    /// The break should end now.
    Confirmed,
    /// Nothing to do (no break, prompt closed, or skip already emitted).
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipConfirmation {
    active: bool,
    presses: u8,
    prompt_open: bool,
    emitted: bool,
}

impl SkipConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presses(&self) -> u8 {
        self.presses
    }

    pub fn remaining_presses(&self) -> u8 {
        ESCAPE_PRESSES_TO_SKIP - self.presses
    }

    pub fn is_prompt_open(&self) -> bool {
        self.prompt_open
    }

    /// Arm for a new break; earlier presses never carry over.
    pub fn begin_break(&mut self) {
        *self = Self {
            active: true,
            ..Self::default()
        };
    }

    pub fn end_break(&mut self) {
        *self = Self::default();
    }

    pub fn escape_pressed(&mut self) -> SkipSignal {
        if !self.active || self.emitted {
            return SkipSignal::Ignored;
        }
        self.presses += 1;
        if self.presses >= ESCAPE_PRESSES_TO_SKIP {
            self.presses = 0;
            self.emit()
        } else {
            SkipSignal::Pending {
                presses: self.presses,
                remaining: self.remaining_presses(),
            }
        }
    }

    /// Skip button: opens the confirm/cancel prompt.
    pub fn request_skip(&mut self) -> bool {
        if !self.active || self.emitted || self.prompt_open {
            return false;
        }
        self.prompt_open = true;
        true
    }

    /// "Continue" in the prompt. Escape progress is left as it was.
    pub fn continue_break(&mut self) -> bool {
        std::mem::replace(&mut self.prompt_open, false)
    }

    /// "Skip" in the prompt.
    pub fn confirm_skip(&mut self) -> SkipSignal {
        if !self.prompt_open {
            return SkipSignal::Ignored;
        }
        self.prompt_open = false;
        self.emit()
    }

    /// Skip reported by the presenter after its own confirmation flow.
    pub fn confirm_direct(&mut self) -> SkipSignal {
        self.prompt_open = false;
        self.emit()
    }

    fn emit(&mut self) -> SkipSignal {
        if !self.active || self.emitted {
            return SkipSignal::Ignored;
        }
        self.emitted = true;
        SkipSignal::Confirmed
    }
}

//! Break scheduler implementation.
//!
//! The scheduler is a deadline-based state machine. It does not own a clock
//! or a thread: every operation takes `now`, and the caller (normally the
//! [`runtime`](crate::runtime)) is responsible for calling `tick()` every
//! [`TICK_INTERVAL_MS`] while [`SessionState::is_ticking`] holds.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> CountdownWarning -> OnBreak -> Running -> ...
//!           |  ^            |
//!           v  |            v
//!          Paused <---------+
//! ```
//!
//! Remaining time is always recomputed from an absolute deadline, so late or
//! missed ticks never distort the schedule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cycle::CycleTracker;
use super::policy::DurationPolicy;
use super::skip::{SkipConfirmation, SkipSignal};
use super::technique::{Technique, TechniqueKind};
use crate::error::SchedulerError;
use crate::events::{BreakOutcome, Event};
use crate::services::{BreakScreen, ErrorSink, OverlayPresenter, SettingsStore, SoundPlayer};

/// The countdown warning appears once this much work time remains.
pub const WARNING_THRESHOLD_SECS: i64 = 10;

/// Default tick cadence.
pub const TICK_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    /// Work interval about to end; the countdown warning is up.
    CountdownWarning,
    OnBreak,
    Paused,
}

impl SessionState {
    /// States in which the periodic tick must be armed.
    pub fn is_ticking(self) -> bool {
        matches!(
            self,
            SessionState::Running | SessionState::CountdownWarning | SessionState::OnBreak
        )
    }
}

/// Who paused the session. Only screen-lock pauses end on unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseOrigin {
    User,
    ScreenLock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlay {
    Warning,
    Break,
}

#[derive(Debug, Default)]
struct Session {
    technique: Option<Technique>,
    state: SessionState,
    work_deadline: Option<DateTime<Utc>>,
    paused_remaining: Option<Duration>,
    pause_origin: Option<PauseOrigin>,
    break_deadline: Option<DateTime<Utc>>,
    break_duration: Option<Duration>,
    cycles: CycleTracker,
    skip: SkipConfirmation,
}

/// The single session state machine.
pub struct BreakScheduler {
    session: Session,
    overlay_visible: Option<Overlay>,
    overlay: Box<dyn OverlayPresenter>,
    sound: Box<dyn SoundPlayer>,
    settings: Box<dyn SettingsStore>,
    errors: Box<dyn ErrorSink>,
}

impl BreakScheduler {
    /// Create a scheduler in the `Idle` state.
    pub fn new(
        overlay: Box<dyn OverlayPresenter>,
        sound: Box<dyn SoundPlayer>,
        settings: Box<dyn SettingsStore>,
        errors: Box<dyn ErrorSink>,
    ) -> Self {
        Self {
            session: Session::default(),
            overlay_visible: None,
            overlay,
            sound,
            settings,
            errors,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn technique(&self) -> Option<Technique> {
        self.session.technique
    }

    pub fn cycle_count(&self) -> u32 {
        self.session.cycles.count()
    }

    pub fn work_deadline(&self) -> Option<DateTime<Utc>> {
        self.session.work_deadline
    }

    pub fn paused_remaining(&self) -> Option<Duration> {
        self.session.paused_remaining
    }

    pub fn pause_origin(&self) -> Option<PauseOrigin> {
        self.session.pause_origin
    }

    pub fn break_deadline(&self) -> Option<DateTime<Utc>> {
        self.session.break_deadline
    }

    pub fn break_duration(&self) -> Option<Duration> {
        self.session.break_duration
    }

    pub fn escape_presses(&self) -> u8 {
        self.session.skip.presses()
    }

    pub fn is_skip_prompt_open(&self) -> bool {
        self.session.skip.is_prompt_open()
    }

    /// Time left in the current work interval or break.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.session.state {
            SessionState::Idle => None,
            SessionState::Paused => self.session.paused_remaining,
            SessionState::OnBreak => self.session.break_deadline.map(|d| d - now),
            SessionState::Running | SessionState::CountdownWarning => {
                self.session.work_deadline.map(|d| d - now)
            }
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            state: self.session.state,
            technique: self.session.technique.map(|t| t.kind()),
            cycle: self.session.cycles.count(),
            remaining_ms: self.remaining(now).map(millis),
            escape_presses: self.session.skip.presses(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or switch to) the named technique.
    ///
    /// On failure the session is left `Idle` and the error is also handed
    /// to the error sink.
    pub fn start(&mut self, name: &str, now: DateTime<Utc>) -> Result<Event, SchedulerError> {
        let technique = match name
            .parse::<TechniqueKind>()
            .and_then(|kind| kind.resolve(self.settings.as_ref()))
        {
            Ok(technique) => technique,
            Err(err) => return Err(self.abort(err)),
        };

        let work = DurationPolicy::work(&technique);
        if work <= Duration::zero() {
            return Err(self.abort(SchedulerError::TimerInitializationFailed(
                "work interval must be positive".into(),
            )));
        }
        let deadline = match deadline_after(now, work) {
            Ok(deadline) => deadline,
            Err(err) => return Err(self.abort(err)),
        };

        self.clear_timing();
        if technique.counts_cycles() {
            self.session.cycles.start();
        } else {
            self.session.cycles.reset();
        }
        self.session.technique = Some(technique);
        self.session.state = SessionState::Running;
        self.session.work_deadline = Some(deadline);

        let cycle = self.session.cycles.count();
        info!(technique = %technique.kind(), cycle, work_secs = work.num_seconds(), "session started");
        Ok(Event::SessionStarted {
            technique: technique.kind(),
            cycle,
            work_secs: secs(work),
            at: now,
        })
    }

    /// Reset the session to `Idle` and surface `error` to the user.
    ///
    /// Used for every recoverable failure, including a tick source that
    /// cannot be armed.
    pub fn abort(&mut self, error: SchedulerError) -> SchedulerError {
        warn!(error = %error, "scheduler operation failed");
        self.reset_session();
        self.errors.report(&error);
        error
    }

    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let was_idle = self.session.state == SessionState::Idle;
        self.reset_session();
        if was_idle {
            debug!("stop ignored: already idle");
            return None;
        }
        info!("session stopped");
        Some(Event::SessionStopped { at: now })
    }

    /// Re-arm the current technique's work interval, keeping the cycle count.
    pub fn restart(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state == SessionState::Idle {
            return None;
        }
        let technique = self.session.technique?;
        let work = DurationPolicy::work(&technique);
        let deadline = self.deadline_or_abort(now, work)?;
        self.clear_timing();
        self.session.state = SessionState::Running;
        self.session.work_deadline = Some(deadline);
        info!(technique = %technique.kind(), "work interval restarted");
        Some(Event::SessionRestarted {
            work_secs: secs(work),
            at: now,
        })
    }

    /// Call periodically while [`SessionState::is_ticking`].
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.session.state {
            SessionState::Running => {
                let remaining = self.session.work_deadline? - now;
                if remaining <= Duration::seconds(WARNING_THRESHOLD_SECS) {
                    self.enter_warning(remaining, now)
                } else {
                    Some(self.progress(remaining, now))
                }
            }
            SessionState::CountdownWarning => {
                let remaining = self.session.work_deadline? - now;
                if remaining <= Duration::zero() {
                    self.begin_break(now)
                } else {
                    Some(self.progress(remaining, now))
                }
            }
            SessionState::OnBreak => {
                let remaining = self.session.break_deadline? - now;
                if remaining <= Duration::zero() {
                    self.finish_break(BreakOutcome::Completed, now)
                } else {
                    Some(self.progress(remaining, now))
                }
            }
            SessionState::Idle | SessionState::Paused => None,
        }
    }

    /// The presenter's countdown ran out before the deadline tick arrived.
    pub fn warning_timed_out(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::CountdownWarning {
            return None;
        }
        self.begin_break(now)
    }

    pub fn take_break_now(&mut self, now: DateTime<Utc>) -> Option<Event> {
        match self.session.state {
            SessionState::Running | SessionState::CountdownWarning => self.begin_break(now),
            _ => None,
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.pause_with(PauseOrigin::User, now)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::Paused {
            return None;
        }
        self.resume_inner(now)
    }

    /// Duplicate lock notifications are no-ops, and so is a lock while the
    /// user has already paused: the pause stays user-owned.
    pub fn screen_locked(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.pause_with(PauseOrigin::ScreenLock, now)
    }

    pub fn screen_unlocked(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::Paused
            || self.session.pause_origin != Some(PauseOrigin::ScreenLock)
        {
            debug!(state = ?self.session.state, "unlock ignored");
            return None;
        }
        self.resume_inner(now)
    }

    pub fn escape_pressed(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::OnBreak {
            return None;
        }
        match self.session.skip.escape_pressed() {
            SkipSignal::Pending { presses, remaining } => {
                debug!(presses, remaining, "escape pressed during break");
                Some(Event::SkipProgress {
                    presses,
                    remaining,
                    at: now,
                })
            }
            SkipSignal::Confirmed => self.finish_break(BreakOutcome::Skipped, now),
            SkipSignal::Ignored => None,
        }
    }

    /// Skip button: opens the confirm/cancel prompt.
    pub fn request_skip(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::OnBreak || !self.session.skip.request_skip() {
            return None;
        }
        Some(Event::SkipPromptOpened { at: now })
    }

    /// "Continue" in the skip prompt.
    pub fn continue_break(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::OnBreak || !self.session.skip.continue_break() {
            return None;
        }
        Some(Event::SkipPromptDismissed { at: now })
    }

    /// "Skip" in the skip prompt.
    pub fn confirm_skip(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::OnBreak {
            return None;
        }
        match self.session.skip.confirm_skip() {
            SkipSignal::Confirmed => self.finish_break(BreakOutcome::Skipped, now),
            _ => None,
        }
    }

    /// A skip the presenter has already confirmed with the user.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::OnBreak {
            return None;
        }
        match self.session.skip.confirm_direct() {
            SkipSignal::Confirmed => self.finish_break(BreakOutcome::Skipped, now),
            _ => None,
        }
    }

    /// The break screen reports how the break ended.
    pub fn break_finished(&mut self, outcome: BreakOutcome, now: DateTime<Utc>) -> Option<Event> {
        match outcome {
            BreakOutcome::Completed if self.session.state == SessionState::OnBreak => {
                self.finish_break(BreakOutcome::Completed, now)
            }
            BreakOutcome::Completed => None,
            BreakOutcome::Skipped => self.skip(now),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn progress(&self, remaining: Duration, now: DateTime<Utc>) -> Event {
        Event::Tick {
            state: self.session.state,
            remaining_ms: millis(remaining),
            at: now,
        }
    }

    fn enter_warning(&mut self, remaining: Duration, now: DateTime<Utc>) -> Option<Event> {
        self.session.state = SessionState::CountdownWarning;
        let seconds = ceil_secs(remaining);
        if self.settings.is_overlay_enabled() {
            self.hide_overlay();
            self.overlay.show_countdown_warning(seconds);
            self.overlay_visible = Some(Overlay::Warning);
        }
        info!(seconds_remaining = seconds, "countdown warning");
        Some(Event::WarningShown {
            remaining_ms: millis(remaining),
            at: now,
        })
    }

    fn begin_break(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let technique = self.session.technique?;
        let cycle = self.session.cycles.count();
        let break_duration = DurationPolicy::break_duration(&technique, cycle);
        let long_break = DurationPolicy::is_long_break(&technique, cycle);
        let deadline = self.deadline_or_abort(now, break_duration)?;

        self.hide_overlay();
        self.session.state = SessionState::OnBreak;
        self.session.work_deadline = None;
        self.session.paused_remaining = None;
        self.session.pause_origin = None;
        self.session.break_deadline = Some(deadline);
        self.session.break_duration = Some(break_duration);
        self.session.skip.begin_break();

        let screen = BreakScreen {
            technique: technique.kind(),
            cycle,
            break_secs: secs(break_duration),
            long_break,
        };
        if self.settings.is_overlay_enabled() {
            self.overlay.show_break(&screen);
            self.overlay_visible = Some(Overlay::Break);
        }
        if self.settings.is_sound_enabled() {
            if let Err(err) = self.sound.play_break_start() {
                warn!(error = %err, "break sound failed");
            }
        }

        info!(technique = %screen.technique, cycle, break_secs = screen.break_secs, long_break, "break started");
        Some(Event::BreakStarted {
            technique: screen.technique,
            cycle,
            break_secs: screen.break_secs,
            long_break,
            at: now,
        })
    }

    fn finish_break(&mut self, outcome: BreakOutcome, now: DateTime<Utc>) -> Option<Event> {
        if self.session.state != SessionState::OnBreak {
            return None;
        }
        let technique = self.session.technique?;
        let work = DurationPolicy::work(&technique);
        let deadline = self.deadline_or_abort(now, work)?;

        self.hide_overlay();
        self.session.skip.end_break();
        self.session.break_deadline = None;
        self.session.break_duration = None;

        let cycle = if technique.counts_cycles() {
            self.session.cycles.advance()
        } else {
            self.session.cycles.count()
        };
        self.session.state = SessionState::Running;
        self.session.work_deadline = Some(deadline);

        info!(?outcome, cycle, "break ended");
        Some(Event::BreakEnded {
            outcome,
            cycle,
            next_work_secs: secs(work),
            at: now,
        })
    }

    fn pause_with(&mut self, origin: PauseOrigin, now: DateTime<Utc>) -> Option<Event> {
        match self.session.state {
            SessionState::Running | SessionState::CountdownWarning => {}
            state => {
                debug!(?state, ?origin, "pause ignored");
                return None;
            }
        }
        let deadline = self.session.work_deadline.take()?;
        let remaining = (deadline - now).max(Duration::zero());

        self.hide_overlay();
        self.session.state = SessionState::Paused;
        self.session.paused_remaining = Some(remaining);
        self.session.pause_origin = Some(origin);

        info!(?origin, remaining_ms = millis(remaining), "session paused");
        Some(Event::SessionPaused {
            remaining_ms: millis(remaining),
            origin,
            at: now,
        })
    }

    fn resume_inner(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let remaining = self.session.paused_remaining?;
        let deadline = self.deadline_or_abort(now, remaining)?;
        self.session.paused_remaining = None;
        let origin = self.session.pause_origin.take().unwrap_or(PauseOrigin::User);
        self.session.state = SessionState::Running;
        self.session.work_deadline = Some(deadline);

        info!(?origin, remaining_ms = millis(remaining), "session resumed");
        Some(Event::SessionResumed {
            remaining_ms: millis(remaining),
            origin,
            at: now,
        })
    }

    /// Drop timers and overlays; technique and cycle count survive.
    fn clear_timing(&mut self) {
        self.hide_overlay();
        self.session.skip.end_break();
        self.session.work_deadline = None;
        self.session.paused_remaining = None;
        self.session.pause_origin = None;
        self.session.break_deadline = None;
        self.session.break_duration = None;
    }

    fn reset_session(&mut self) {
        self.clear_timing();
        self.session.technique = None;
        self.session.cycles.reset();
        self.session.state = SessionState::Idle;
    }

    fn hide_overlay(&mut self) {
        if self.overlay_visible.take().is_some() {
            self.overlay.hide();
        }
    }

    /// `now + span`, or abort the session when that is past the calendar.
    fn deadline_or_abort(&mut self, now: DateTime<Utc>, span: Duration) -> Option<DateTime<Utc>> {
        match deadline_after(now, span) {
            Ok(deadline) => Some(deadline),
            Err(err) => {
                self.abort(err);
                None
            }
        }
    }
}

fn deadline_after(now: DateTime<Utc>, span: Duration) -> Result<DateTime<Utc>, SchedulerError> {
    now.checked_add_signed(span).ok_or_else(|| {
        SchedulerError::TimerInitializationFailed(format!(
            "deadline {}s from now is out of range",
            span.num_seconds()
        ))
    })
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.num_milliseconds()).unwrap_or(0)
}

fn secs(d: Duration) -> u64 {
    u64::try_from(d.num_seconds()).unwrap_or(0)
}

fn ceil_secs(d: Duration) -> u64 {
    millis(d).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Call, Recorder};
    use crate::services::StaticSettings;
    use proptest::prelude::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn scheduler_with(settings: StaticSettings, recorder: &Recorder) -> BreakScheduler {
        BreakScheduler::new(
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Box::new(settings),
            Box::new(recorder.clone()),
        )
    }

    fn scheduler() -> (BreakScheduler, Recorder) {
        let recorder = Recorder::default();
        let settings = StaticSettings::default().with_custom(Some(600), Some(45));
        (scheduler_with(settings, &recorder), recorder)
    }

    /// Drive a running session through warning and break back to Running.
    fn complete_break(s: &mut BreakScheduler) -> Duration {
        let deadline = s.work_deadline().unwrap();
        s.tick(deadline - Duration::seconds(5));
        assert_eq!(s.state(), SessionState::CountdownWarning);
        s.tick(deadline);
        assert_eq!(s.state(), SessionState::OnBreak);
        let length = s.break_duration().unwrap();
        s.tick(s.break_deadline().unwrap());
        assert_eq!(s.state(), SessionState::Running);
        length
    }

    #[test]
    fn twenty_twenty_twenty_full_cycle() {
        let (mut s, recorder) = scheduler();
        s.start("20-20-20", t(0)).unwrap();
        assert_eq!(s.work_deadline(), Some(t(1200)));

        assert!(matches!(s.tick(t(600)), Some(Event::Tick { remaining_ms: 600_000, .. })));
        assert_eq!(s.state(), SessionState::Running);

        let warning = s.tick(t(1190));
        assert!(matches!(warning, Some(Event::WarningShown { remaining_ms: 10_000, .. })));
        assert_eq!(s.state(), SessionState::CountdownWarning);

        let started = s.tick(t(1200));
        assert!(matches!(started, Some(Event::BreakStarted { break_secs: 20, .. })));
        assert_eq!(s.state(), SessionState::OnBreak);
        assert_eq!(s.break_deadline(), Some(t(1220)));

        let ended = s.tick(t(1220));
        assert!(matches!(
            ended,
            Some(Event::BreakEnded { outcome: BreakOutcome::Completed, .. })
        ));
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.work_deadline(), Some(t(1220 + 1200)));

        assert_eq!(
            recorder.calls(),
            vec![
                Call::Warning(10),
                Call::Hide,
                Call::Break(BreakScreen {
                    technique: TechniqueKind::TwentyTwentyTwenty,
                    cycle: 0,
                    break_secs: 20,
                    long_break: false,
                }),
                Call::Sound,
                Call::Hide,
            ]
        );
    }

    #[test]
    fn tick_at_deadline_never_skips_warning() {
        for name in ["20-20-20", "pomodoro", "custom"] {
            let (mut s, _) = scheduler();
            s.start(name, t(0)).unwrap();
            let deadline = s.work_deadline().unwrap();
            s.tick(deadline);
            assert_eq!(s.state(), SessionState::CountdownWarning, "{name}");
            s.tick(deadline + Duration::milliseconds(500));
            assert_eq!(s.state(), SessionState::OnBreak, "{name}");
        }
    }

    #[test]
    fn warning_timeout_starts_break() {
        let (mut s, _) = scheduler();
        s.start("custom", t(0)).unwrap();
        assert!(s.warning_timed_out(t(1)).is_none());
        s.tick(t(592));
        assert!(matches!(
            s.warning_timed_out(t(595)),
            Some(Event::BreakStarted { break_secs: 45, .. })
        ));
        assert_eq!(s.break_deadline(), Some(t(640)));
    }

    #[test]
    fn pomodoro_fourth_break_is_long_then_wraps() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        assert_eq!(s.cycle_count(), 1);

        let lengths: Vec<i64> = (0..4).map(|_| complete_break(&mut s).num_seconds()).collect();
        assert_eq!(lengths, vec![300, 300, 300, 1800]);
        assert_eq!(s.cycle_count(), 1);
        assert_eq!(complete_break(&mut s).num_seconds(), 300);
        assert_eq!(s.cycle_count(), 2);
    }

    #[test]
    fn pause_from_warning_hides_and_resume_reshows() {
        let (mut s, recorder) = scheduler();
        s.start("20-20-20", t(0)).unwrap();
        s.tick(t(1195));
        s.pause(t(1196));
        assert_eq!(s.paused_remaining(), Some(Duration::seconds(4)));
        assert_eq!(s.work_deadline(), None);
        assert!(s.tick(t(5000)).is_none());

        s.resume(t(5000));
        assert_eq!(s.state(), SessionState::Running);
        s.tick(t(5001));
        assert_eq!(s.state(), SessionState::CountdownWarning);
        assert_eq!(
            recorder.calls(),
            vec![Call::Warning(5), Call::Hide, Call::Warning(3)]
        );
    }

    #[test]
    fn screen_lock_is_idempotent_and_resumes_on_unlock() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        assert!(s.screen_unlocked(t(10)).is_none());

        assert!(s.screen_locked(t(100)).is_some());
        assert!(s.screen_locked(t(150)).is_none());
        assert_eq!(s.pause_origin(), Some(PauseOrigin::ScreenLock));
        assert_eq!(s.paused_remaining(), Some(Duration::seconds(1400)));

        assert!(s.screen_unlocked(t(900)).is_some());
        assert!(s.screen_unlocked(t(901)).is_none());
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.work_deadline(), Some(t(2300)));
    }

    #[test]
    fn unlock_does_not_resume_user_pause() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        s.pause(t(100));
        assert!(s.screen_locked(t(200)).is_none());
        assert!(s.screen_unlocked(t(300)).is_none());
        assert_eq!(s.state(), SessionState::Paused);
        assert_eq!(s.pause_origin(), Some(PauseOrigin::User));
        assert!(s.resume(t(400)).is_some());
        assert_eq!(s.work_deadline(), Some(t(1800)));
    }

    #[test]
    fn screen_lock_during_break_keeps_break_running() {
        let (mut s, _) = scheduler();
        s.start("20-20-20", t(0)).unwrap();
        s.take_break_now(t(30));
        assert!(s.screen_locked(t(35)).is_none());
        assert_eq!(s.state(), SessionState::OnBreak);
    }

    #[test]
    fn three_escapes_skip_exactly_once() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        s.take_break_now(t(60));
        assert!(matches!(
            s.escape_pressed(t(61)),
            Some(Event::SkipProgress { presses: 1, remaining: 2, .. })
        ));
        s.escape_pressed(t(62));
        let skipped = s.escape_pressed(t(63));
        assert!(matches!(
            skipped,
            Some(Event::BreakEnded { outcome: BreakOutcome::Skipped, cycle: 2, .. })
        ));
        assert_eq!(s.escape_presses(), 0);
        assert_eq!(s.state(), SessionState::Running);
        assert!(s.escape_pressed(t(64)).is_none());
        assert_eq!(s.cycle_count(), 2);
    }

    #[test]
    fn partial_escapes_reset_by_next_break() {
        let (mut s, _) = scheduler();
        s.start("20-20-20", t(0)).unwrap();
        s.take_break_now(t(10));
        s.escape_pressed(t(11));
        s.escape_pressed(t(12));
        assert_eq!(s.escape_presses(), 2);
        s.tick(t(30));
        assert_eq!(s.state(), SessionState::Running);
        s.take_break_now(t(40));
        assert_eq!(s.escape_presses(), 0);
        assert!(matches!(s.escape_pressed(t(41)), Some(Event::SkipProgress { .. })));
        assert_eq!(s.state(), SessionState::OnBreak);
    }

    #[test]
    fn skip_button_requires_confirmation() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        s.take_break_now(t(10));
        assert!(s.confirm_skip(t(11)).is_none());
        assert!(s.request_skip(t(12)).is_some());
        assert!(s.continue_break(t(13)).is_some());
        assert_eq!(s.state(), SessionState::OnBreak);

        s.request_skip(t(14));
        assert!(s.is_skip_prompt_open());
        assert!(matches!(
            s.confirm_skip(t(15)),
            Some(Event::BreakEnded { outcome: BreakOutcome::Skipped, .. })
        ));
        assert_eq!(s.work_deadline(), Some(t(15 + 1500)));
    }

    #[test]
    fn presenter_reports_end_breaks() {
        let (mut s, _) = scheduler();
        s.start("20-20-20", t(0)).unwrap();
        assert!(s.break_finished(BreakOutcome::Completed, t(1)).is_none());
        s.take_break_now(t(5));
        assert!(s.break_finished(BreakOutcome::Completed, t(25)).is_some());
        s.take_break_now(t(30));
        assert!(matches!(
            s.break_finished(BreakOutcome::Skipped, t(31)),
            Some(Event::BreakEnded { outcome: BreakOutcome::Skipped, .. })
        ));
        assert!(s.skip(t(32)).is_none());
    }

    #[test]
    fn custom_without_rule_fails_and_stays_idle() {
        let recorder = Recorder::default();
        let mut s = scheduler_with(StaticSettings::default(), &recorder);
        assert_eq!(
            s.start("Custom", t(0)),
            Err(SchedulerError::CustomRuleNotConfigured)
        );
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.technique(), None);
        assert_eq!(
            recorder.calls(),
            vec![Call::Error(SchedulerError::CustomRuleNotConfigured)]
        );
        assert!(s.start("20-20-20", t(1)).is_ok());
    }

    #[test]
    fn work_deadline_past_calendar_fails_start() {
        let recorder = Recorder::default();
        let settings = StaticSettings::default().with_custom(Some(1_000_000_000_000_000), Some(60));
        let mut s = scheduler_with(settings, &recorder);
        assert!(matches!(
            s.start("custom", t(0)),
            Err(SchedulerError::TimerInitializationFailed(_))
        ));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.work_deadline(), None);
        assert!(matches!(
            recorder.calls().as_slice(),
            [Call::Error(SchedulerError::TimerInitializationFailed(_))]
        ));
    }

    #[test]
    fn interval_beyond_duration_range_is_not_configured() {
        let recorder = Recorder::default();
        let settings = StaticSettings::default().with_custom(Some(i64::MAX as u64), Some(60));
        assert_eq!(settings.custom_interval(), None);
        let mut s = scheduler_with(settings, &recorder);
        assert_eq!(
            s.start("custom", t(0)),
            Err(SchedulerError::CustomRuleNotConfigured)
        );
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn break_deadline_past_calendar_aborts_session() {
        let recorder = Recorder::default();
        let settings = StaticSettings::default().with_custom(Some(60), Some(1_000_000_000_000_000));
        let mut s = scheduler_with(settings, &recorder);
        s.start("custom", t(0)).unwrap();

        assert_eq!(s.take_break_now(t(5)), None);
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.break_deadline(), None);
        assert!(matches!(
            recorder.calls().as_slice(),
            [Call::Error(SchedulerError::TimerInitializationFailed(_))]
        ));
        assert!(s.start("20-20-20", t(6)).is_ok());
    }

    #[test]
    fn invalid_technique_tears_down_running_session() {
        let (mut s, recorder) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        s.tick(t(1495));
        let err = s.start("", t(1496)).unwrap_err();
        assert_eq!(err, SchedulerError::InvalidTechnique(String::new()));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.cycle_count(), 0);
        assert_eq!(s.work_deadline(), None);
        assert_eq!(
            recorder.calls(),
            vec![
                Call::Warning(5),
                Call::Hide,
                Call::Error(SchedulerError::InvalidTechnique(String::new())),
            ]
        );
    }

    #[test]
    fn stop_from_every_state_resets_cycle() {
        let setups: Vec<fn(&mut BreakScheduler)> = vec![
            |_| {},
            |s| {
                let deadline = s.work_deadline().unwrap();
                s.tick(deadline - Duration::seconds(3));
                assert_eq!(s.state(), SessionState::CountdownWarning);
            },
            |s| {
                s.take_break_now(t(10));
            },
            |s| {
                s.pause(t(10));
            },
            |s| {
                s.screen_locked(t(10));
            },
        ];
        for setup in setups {
            let (mut s, _) = scheduler();
            s.start("pomodoro", t(0)).unwrap();
            complete_break(&mut s);
            setup(&mut s);
            assert!(s.stop(t(2000)).is_some());
            assert_eq!(s.state(), SessionState::Idle);
            assert_eq!(s.cycle_count(), 0);
            assert_eq!(s.work_deadline(), None);
            assert_eq!(s.paused_remaining(), None);
            assert!(s.stop(t(2001)).is_none());
        }
    }

    #[test]
    fn stop_hides_visible_break() {
        let (mut s, recorder) = scheduler();
        s.start("20-20-20", t(0)).unwrap();
        s.take_break_now(t(1));
        recorder.clear();
        s.stop(t(2));
        assert_eq!(recorder.calls(), vec![Call::Hide]);
        assert!(s.tick(t(3)).is_none());
    }

    #[test]
    fn technique_switch_keeps_or_clears_cycles() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        complete_break(&mut s);
        assert_eq!(s.cycle_count(), 2);
        s.start("pomodoro", t(5000)).unwrap();
        assert_eq!(s.cycle_count(), 2);
        s.start("20-20-20", t(5001)).unwrap();
        assert_eq!(s.cycle_count(), 0);
        s.start("pomodoro", t(5002)).unwrap();
        assert_eq!(s.cycle_count(), 1);
    }

    #[test]
    fn restart_rearms_interval_and_keeps_cycle() {
        let (mut s, _) = scheduler();
        assert!(s.restart(t(0)).is_none());
        s.start("pomodoro", t(0)).unwrap();
        complete_break(&mut s);
        s.pause(t(2000));
        s.restart(t(3000));
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.work_deadline(), Some(t(4500)));
        assert_eq!(s.cycle_count(), 2);
    }

    #[test]
    fn take_break_now_only_while_working() {
        let (mut s, _) = scheduler();
        assert!(s.take_break_now(t(0)).is_none());
        s.start("pomodoro", t(0)).unwrap();
        s.pause(t(5));
        assert!(s.take_break_now(t(6)).is_none());
        s.resume(t(7));
        assert!(matches!(
            s.take_break_now(t(8)),
            Some(Event::BreakStarted { break_secs: 300, cycle: 1, .. })
        ));
        assert!(s.take_break_now(t(9)).is_none());
    }

    #[test]
    fn overlay_disabled_keeps_timing_without_presenting() {
        let recorder = Recorder::default();
        let settings = StaticSettings {
            overlay_enabled: false,
            sound_enabled: false,
            ..StaticSettings::default()
        };
        let mut s = scheduler_with(settings, &recorder);
        s.start("20-20-20", t(0)).unwrap();
        s.tick(t(1195));
        s.tick(t(1200));
        assert_eq!(s.state(), SessionState::OnBreak);
        s.tick(t(1220));
        assert_eq!(s.state(), SessionState::Running);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn failing_sound_is_not_fatal() {
        let recorder = Recorder::failing_sound();
        let mut s = scheduler_with(StaticSettings::default(), &recorder);
        s.start("20-20-20", t(0)).unwrap();
        assert!(s.take_break_now(t(1)).is_some());
        assert_eq!(s.state(), SessionState::OnBreak);
        assert!(recorder.calls().contains(&Call::Sound));
    }

    #[test]
    fn snapshot_reports_paused_remaining() {
        let (mut s, _) = scheduler();
        s.start("pomodoro", t(0)).unwrap();
        s.pause(t(500));
        match s.snapshot(t(900)) {
            Event::StateSnapshot {
                state,
                technique,
                cycle,
                remaining_ms,
                ..
            } => {
                assert_eq!(state, SessionState::Paused);
                assert_eq!(technique, Some(TechniqueKind::Pomodoro));
                assert_eq!(cycle, 1);
                assert_eq!(remaining_ms, Some(1_000_000));
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn pause_resume_preserves_remaining(
            paused_at in 0i64..1489,
            paused_for in 0i64..100_000,
            via_lock in any::<bool>(),
        ) {
            let (mut s, _) = scheduler();
            s.start("pomodoro", t(0)).unwrap();
            let before = s.remaining(t(paused_at)).unwrap();
            if via_lock {
                s.screen_locked(t(paused_at));
                s.screen_unlocked(t(paused_at + paused_for));
            } else {
                s.pause(t(paused_at));
                s.resume(t(paused_at + paused_for));
            }
            prop_assert_eq!(s.state(), SessionState::Running);
            prop_assert_eq!(s.remaining(t(paused_at + paused_for)).unwrap(), before);
        }
    }
}

//! Serialized event consumer for the scheduler.
//!
//! Lock notifications, key presses, menu actions and timer ticks may come
//! from any task or thread. They all become [`Command`]s on one bounded
//! queue, and a single tokio task applies them to the [`BreakScheduler`] in
//! arrival order. The same task owns the periodic tick source: it is armed
//! while the session is in a ticking state and dropped otherwise.

mod bus;
mod clock;

pub use bus::{EventBus, EventSubscriber};
pub use clock::{Clock, ManualClock, SystemClock};

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{CoreError, Result, SchedulerError};
use crate::events::{BreakOutcome, Event};
use crate::timer::{BreakScheduler, TICK_INTERVAL_MS};

const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Everything a caller can ask of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(String),
    Stop,
    Restart,
    Pause,
    Resume,
    ScreenLocked,
    ScreenUnlocked,
    TakeBreakNow,
    EscapePressed,
    RequestSkip,
    ContinueBreak,
    ConfirmSkip,
    Skip,
    WarningTimedOut,
    BreakFinished(BreakOutcome),
    Snapshot,
    /// Stop the session and end the consumer task.
    Shutdown,
}

type Reply = std::result::Result<Option<Event>, SchedulerError>;

struct Envelope {
    command: Command,
    reply: oneshot::Sender<Reply>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub tick_interval: StdDuration,
    pub queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: StdDuration::from_millis(TICK_INTERVAL_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Cloneable sender side of the scheduler queue.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Envelope>,
}

impl SchedulerHandle {
    /// Enqueue `command` and wait for the scheduler to apply it.
    pub async fn send(&self, command: Command) -> Result<Option<Event>> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply })
            .await
            .map_err(|_| CoreError::RuntimeClosed)?;
        let outcome = response.await.map_err(|_| CoreError::RuntimeClosed)?;
        Ok(outcome?)
    }

    pub async fn start(&self, technique: &str) -> Result<Option<Event>> {
        self.send(Command::Start(technique.to_string())).await
    }

    pub async fn stop(&self) -> Result<Option<Event>> {
        self.send(Command::Stop).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<Option<Event>> {
        self.send(Command::Resume).await
    }

    pub async fn screen_locked(&self) -> Result<Option<Event>> {
        self.send(Command::ScreenLocked).await
    }

    pub async fn screen_unlocked(&self) -> Result<Option<Event>> {
        self.send(Command::ScreenUnlocked).await
    }

    pub async fn escape_pressed(&self) -> Result<Option<Event>> {
        self.send(Command::EscapePressed).await
    }

    pub async fn break_finished(&self, outcome: BreakOutcome) -> Result<Option<Event>> {
        self.send(Command::BreakFinished(outcome)).await
    }

    pub async fn snapshot(&self) -> Result<Event> {
        self.send(Command::Snapshot)
            .await?
            .ok_or(CoreError::RuntimeClosed)
    }

    pub async fn shutdown(&self) -> Result<Option<Event>> {
        self.send(Command::Shutdown).await
    }
}

/// The single consumer. Owns the scheduler for its whole life.
pub struct SchedulerRuntime {
    scheduler: BreakScheduler,
    clock: Arc<dyn Clock>,
    bus: EventBus,
    rx: mpsc::Receiver<Envelope>,
    tick_interval: StdDuration,
    ticker: Option<Interval>,
}

enum Step {
    Command(Option<Envelope>),
    Tick,
}

impl SchedulerRuntime {
    /// Spawn the consumer task on the current tokio runtime.
    ///
    /// The task ends on [`Command::Shutdown`] or when every handle is
    /// dropped, and yields the scheduler back.
    pub fn spawn(
        scheduler: BreakScheduler,
        clock: Arc<dyn Clock>,
        bus: EventBus,
        config: RuntimeConfig,
    ) -> (SchedulerHandle, JoinHandle<BreakScheduler>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let runtime = Self {
            scheduler,
            clock,
            bus,
            rx,
            tick_interval: config.tick_interval,
            ticker: None,
        };
        (SchedulerHandle { tx }, tokio::spawn(runtime.run()))
    }

    async fn run(mut self) -> BreakScheduler {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "scheduler runtime started");
        loop {
            let step = tokio::select! {
                envelope = self.rx.recv() => Step::Command(envelope),
                _ = next_tick(&mut self.ticker) => Step::Tick,
            };
            match step {
                Step::Tick => {
                    let now = self.clock.now();
                    if let Some(event) = self.scheduler.tick(now) {
                        self.publish(&event);
                    }
                }
                Step::Command(Some(Envelope { command, reply })) => {
                    let shutdown = command == Command::Shutdown;
                    let outcome = self.apply(command);
                    if let Ok(Some(event)) = &outcome {
                        self.publish(event);
                    }
                    let _ = reply.send(outcome);
                    if shutdown {
                        break;
                    }
                }
                Step::Command(None) => {
                    self.scheduler.stop(self.clock.now());
                    break;
                }
            }
            self.sync_ticker();
        }
        info!("scheduler runtime stopped");
        self.scheduler
    }

    fn apply(&mut self, command: Command) -> Reply {
        let now = self.clock.now();
        debug!(?command, "applying command");
        if let Command::Start(name) = &command {
            if self.tick_interval.is_zero() {
                return Err(self.scheduler.abort(SchedulerError::TimerInitializationFailed(
                    "tick interval must be greater than zero".into(),
                )));
            }
            return Ok(Some(self.scheduler.start(name, now)?));
        }

        let s = &mut self.scheduler;
        let event = match command {
            Command::Start(_) => None,
            Command::Stop | Command::Shutdown => s.stop(now),
            Command::Restart => s.restart(now),
            Command::Pause => s.pause(now),
            Command::Resume => s.resume(now),
            Command::ScreenLocked => s.screen_locked(now),
            Command::ScreenUnlocked => s.screen_unlocked(now),
            Command::TakeBreakNow => s.take_break_now(now),
            Command::EscapePressed => s.escape_pressed(now),
            Command::RequestSkip => s.request_skip(now),
            Command::ContinueBreak => s.continue_break(now),
            Command::ConfirmSkip => s.confirm_skip(now),
            Command::Skip => s.skip(now),
            Command::WarningTimedOut => s.warning_timed_out(now),
            Command::BreakFinished(outcome) => s.break_finished(outcome, now),
            Command::Snapshot => Some(s.snapshot(now)),
        };
        Ok(event)
    }

    fn publish(&self, event: &Event) {
        if !event.is_tick() {
            debug!(?event, "publishing event");
        }
        self.bus.emit(event.clone());
    }

    /// Arm the tick source on entering a ticking state, drop it on leaving.
    fn sync_ticker(&mut self) {
        let ticking = self.scheduler.state().is_ticking();
        match (&self.ticker, ticking) {
            (None, true) if !self.tick_interval.is_zero() => {
                let mut interval = tokio::time::interval(self.tick_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(interval);
                debug!("tick source armed");
            }
            (Some(_), false) => {
                self.ticker = None;
                debug!("tick source cancelled");
            }
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

use std::sync::Arc;

use breaktime_core::display::{event_status, format_millis, format_secs, skip_hint};
use breaktime_core::runtime::{EventSubscriber, SystemClock};
use breaktime_core::{
    BreakOutcome, BreakScheduler, Command, Config, CoreError, Event, EventBus, SchedulerHandle,
    SchedulerRuntime, SettingsStore,
};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::console::{ConsoleOverlay, StderrAlert, TerminalBell};

const HELP: &str = "commands: start <technique>, pause, resume, restart, stop, break, \
esc, skip, confirm, continue, lock, unlock, status, quit";

#[derive(Args)]
pub struct RunArgs {
    /// Technique to start with: 20-20-20, pomodoro or custom.
    /// Defaults to `default_technique` from the config.
    technique: Option<String>,
    /// Print every event as a JSON line instead of text
    #[arg(long)]
    json: bool,
}

/// One stdin line.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Send(Command),
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "start" => Command::Start(words.collect::<Vec<_>>().join(" ")),
        "stop" => Command::Stop,
        "restart" => Command::Restart,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "lock" => Command::ScreenLocked,
        "unlock" => Command::ScreenUnlocked,
        "break" => Command::TakeBreakNow,
        "esc" | "escape" => Command::EscapePressed,
        "skip" => Command::RequestSkip,
        "confirm" => Command::ConfirmSkip,
        "continue" => Command::ContinueBreak,
        "done" => Command::BreakFinished(BreakOutcome::Completed),
        "status" => Command::Snapshot,
        "help" | "?" => return Ok(Some(Input::Help)),
        "quit" | "exit" => return Ok(Some(Input::Quit)),
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(Input::Send(command)))
}

/// Text rendering of an event, or `None` for events not worth a line.
fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::SessionStarted {
            technique,
            cycle,
            work_secs,
            ..
        } => format!("started {technique}: work {} (cycle {cycle})", format_secs(*work_secs)),
        Event::Tick { .. } | Event::WarningShown { .. } => return None,
        Event::BreakStarted { .. } => "break started".to_string(),
        Event::BreakEnded {
            outcome,
            cycle,
            next_work_secs,
            ..
        } => {
            let how = match outcome {
                BreakOutcome::Completed => "break over",
                BreakOutcome::Skipped => "break skipped",
            };
            format!("{how}: work {} (cycle {cycle})", format_secs(*next_work_secs))
        }
        Event::SessionPaused { .. } => format!("paused {}", event_status(event).unwrap_or_default()),
        Event::SessionResumed { remaining_ms, .. } => {
            format!("resumed: {} left", format_millis(*remaining_ms))
        }
        Event::SessionRestarted { work_secs, .. } => {
            format!("restarted: work {}", format_secs(*work_secs))
        }
        Event::SkipProgress { remaining, .. } => skip_hint(*remaining),
        Event::SkipPromptOpened { .. } => "skip this break? (confirm / continue)".to_string(),
        Event::SkipPromptDismissed { .. } => "continuing break".to_string(),
        Event::SessionStopped { .. } => "stopped".to_string(),
        Event::StateSnapshot { state, .. } => match event_status(event) {
            Some(status) if !status.is_empty() => status,
            _ => format!("{state:?}").to_lowercase(),
        },
    };
    Some(line)
}

async fn print_events(mut events: EventSubscriber, json: bool) {
    while let Some(event) = events.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => debug!(error = %e, "event not serializable"),
            }
        } else if let Some(line) = describe(&event) {
            println!("{line}");
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let technique = args
        .technique
        .or_else(|| config.default_technique.clone())
        .unwrap_or_default();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(session(config, technique, args.json))
}

async fn session(
    config: Config,
    technique: String,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime_config = config.runtime_config();
    let overlay = ConsoleOverlay::new(config.is_overlay_enabled() && !json);
    let scheduler = BreakScheduler::new(
        Box::new(overlay),
        Box::new(TerminalBell),
        Box::new(config),
        Box::new(StderrAlert),
    );

    let bus = EventBus::new();
    let printer = tokio::spawn(print_events(bus.subscribe(), json));
    let (handle, task) =
        SchedulerRuntime::spawn(scheduler, Arc::new(SystemClock), bus, runtime_config);

    forward(&handle, Command::Start(technique)).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(None) => {}
            Ok(Some(Input::Send(command))) => forward(&handle, command).await?,
            Ok(Some(Input::Help)) => eprintln!("{HELP}"),
            Ok(Some(Input::Quit)) => break,
            Err(message) => eprintln!("{message}\n{HELP}"),
        }
    }

    handle.shutdown().await?;
    drop(handle);
    task.await?;
    printer.await?;
    Ok(())
}

/// Sends a command. Scheduler rejections were already shown by the alert
/// sink, so only runtime failures end the session.
async fn forward(handle: &SchedulerHandle, command: Command) -> Result<(), CoreError> {
    match handle.send(command).await {
        Ok(_) | Err(CoreError::Scheduler(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

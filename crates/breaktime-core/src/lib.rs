//! # Breaktime Core Library
//!
//! This library provides the core logic of the breaktime break reminder:
//! it interrupts a work session at technique-defined intervals so the user
//! rests their eyes and posture. Front ends (the CLI, or any GUI) supply the
//! rendering, audio and settings collaborators.
//!
//! ## Architecture
//!
//! - **Break Scheduler**: A deadline-based state machine that requires the
//!   caller to periodically invoke `tick()`
//! - **Runtime**: A single tokio task that serializes every command and
//!   tick into the scheduler and broadcasts the resulting events
//! - **Storage**: TOML-based configuration that doubles as the settings store
//!
//! ## Key Components
//!
//! - [`BreakScheduler`]: Session state machine
//! - [`DurationPolicy`]: Work and break lengths per technique
//! - [`SchedulerRuntime`]: Serialized event consumer
//! - [`Config`]: Application configuration management

pub mod display;
pub mod error;
pub mod events;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, SchedulerError};
pub use events::{BreakOutcome, Event};
pub use runtime::{Command, EventBus, RuntimeConfig, SchedulerHandle, SchedulerRuntime};
pub use services::{BreakScreen, ErrorSink, OverlayPresenter, SettingsStore, SoundPlayer};
pub use storage::Config;
pub use timer::{
    BreakScheduler, DurationPolicy, PauseOrigin, SessionState, Technique, TechniqueKind,
};

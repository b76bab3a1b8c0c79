//! Core error types for breaktime-core.
//!
//! Scheduler failures are recoverable by contract: the scheduler drops back
//! to `Idle` and stays usable. Settings failures and a closed runtime are
//! folded into [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breaktime-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduler rejected an operation
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The scheduler task has exited and no longer accepts commands
    #[error("Scheduler runtime is no longer running")]
    RuntimeClosed,
}

/// Failures surfaced to the user through an `ErrorSink`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Empty or unrecognized technique name
    #[error("Invalid or empty technique selected: '{0}'")]
    InvalidTechnique(String),

    /// Custom technique selected without a positive interval and break
    #[error("Custom rule interval not configured")]
    CustomRuleNotConfigured,

    /// The periodic tick source could not be armed
    #[error("Failed to initialize timer: {0}")]
    TimerInitializationFailed(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration schema
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No home directory to place the config under
    #[error("Could not determine the home directory")]
    NoHomeDir,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::services::SettingsStore;

/// Technique selected by name, before settings are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechniqueKind {
    /// Every 20 minutes, look 20 feet away for 20 seconds.
    TwentyTwentyTwenty,
    Pomodoro,
    Custom,
}

impl TechniqueKind {
    pub const ALL: [TechniqueKind; 3] = [
        TechniqueKind::TwentyTwentyTwenty,
        TechniqueKind::Pomodoro,
        TechniqueKind::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TechniqueKind::TwentyTwentyTwenty => "twenty-twenty-twenty",
            TechniqueKind::Pomodoro => "pomodoro",
            TechniqueKind::Custom => "custom",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TechniqueKind::TwentyTwentyTwenty => "20-20-20 Rule",
            TechniqueKind::Pomodoro => "Pomodoro Technique",
            TechniqueKind::Custom => "Custom",
        }
    }

    /// Attach the parameters this technique needs.
    ///
    /// Only `Custom` reads settings; it fails unless both the interval and
    /// the break duration are configured and strictly positive.
    pub fn resolve(self, settings: &dyn SettingsStore) -> Result<Technique, SchedulerError> {
        match self {
            TechniqueKind::TwentyTwentyTwenty => Ok(Technique::TwentyTwentyTwenty),
            TechniqueKind::Pomodoro => Ok(Technique::Pomodoro),
            TechniqueKind::Custom => {
                let rule = CustomRule::new(
                    settings.custom_interval(),
                    settings.custom_break_duration(),
                )
                .ok_or(SchedulerError::CustomRuleNotConfigured)?;
                Ok(Technique::Custom(rule))
            }
        }
    }
}

impl fmt::Display for TechniqueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechniqueKind {
    type Err = SchedulerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "twenty-twenty-twenty" | "20-20-20" | "20-20-20 rule" | "20_20_20"
            | "fixed-interval" => Ok(TechniqueKind::TwentyTwentyTwenty),
            "pomodoro" | "pomodoro technique" => Ok(TechniqueKind::Pomodoro),
            "custom" => Ok(TechniqueKind::Custom),
            _ => Err(SchedulerError::InvalidTechnique(name.trim().to_string())),
        }
    }
}

/// User-configured interval and break length, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRule {
    interval: Duration,
    break_duration: Duration,
}

impl CustomRule {
    pub fn new(interval: Option<Duration>, break_duration: Option<Duration>) -> Option<Self> {
        let interval = interval.filter(|d| *d > Duration::zero())?;
        let break_duration = break_duration.filter(|d| *d > Duration::zero())?;
        Some(Self {
            interval,
            break_duration,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }
}

/// A break technique with everything needed to compute its durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technique {
    TwentyTwentyTwenty,
    Pomodoro,
    Custom(CustomRule),
}

impl Technique {
    pub fn kind(&self) -> TechniqueKind {
        match self {
            Technique::TwentyTwentyTwenty => TechniqueKind::TwentyTwentyTwenty,
            Technique::Pomodoro => TechniqueKind::Pomodoro,
            Technique::Custom(_) => TechniqueKind::Custom,
        }
    }

    pub fn counts_cycles(&self) -> bool {
        matches!(self, Technique::Pomodoro)
    }
}

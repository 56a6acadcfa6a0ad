//! Scheduler configuration.
//!
//! Global placement rules plus algorithm and optimization settings,
//! loadable from TOML so a school can tune them without code changes.
//!
//! # Examples
//!
//! ```
//! use timetable_core::config::{AlgorithmMode, SchedulerConfig};
//!
//! let config = SchedulerConfig::from_toml_str(r#"
//!     algorithm = "compact"
//!
//!     [rules]
//!     max_daily_hours_teacher = 6
//!     avoid_first_last_period = true
//! "#).unwrap();
//!
//! assert_eq!(config.algorithm, AlgorithmMode::Compact);
//! assert_eq!(config.rules.max_daily_hours_teacher, 6);
//! // Unset rules keep their defaults
//! assert_eq!(config.rules.max_daily_hours_class, 9);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Global placement rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RuleSet {
    /// Hard cap on a teacher's lessons per day.
    pub max_daily_hours_teacher: u32,
    /// Hard cap on a class's lessons per day.
    pub max_daily_hours_class: u32,
    /// Longest run of back-to-back lessons allowed for one
    /// (class, subject) pair, and the teacher run length above which the
    /// validator warns.
    pub max_consecutive_hours: u32,
    /// Enforce `max_consecutive_hours` on same-subject runs.
    pub avoid_consecutive_same_subject: bool,
    /// Favor the first half of the day.
    pub prefer_morning_hours: bool,
    /// Penalize the first and last teaching period.
    pub avoid_first_last_period: bool,
    /// Keep the lunch period free.
    pub lunch_break_required: bool,
    /// Lunch length in periods.
    pub lunch_break_duration: u8,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_daily_hours_teacher: 8,
            max_daily_hours_class: 9,
            max_consecutive_hours: 3,
            avoid_consecutive_same_subject: true,
            prefer_morning_hours: true,
            avoid_first_last_period: false,
            lunch_break_required: true,
            lunch_break_duration: 1,
        }
    }
}

/// How lessons are spread over the week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmMode {
    /// No compactness bias.
    #[default]
    Balanced,
    /// Keep a class's lessons next to each other.
    Compact,
    /// Spread a subject's hours over different days.
    Distributed,
}

/// How exhaustively candidate slots are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationLevel {
    /// Take the first candidate without a soft penalty.
    Fast,
    /// Score every candidate.
    #[default]
    Balanced,
    /// Score every candidate; break score ties by the teacher's lighter day.
    Thorough,
}

/// Complete scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulerConfig {
    pub rules: RuleSet,
    pub algorithm: AlgorithmMode,
    pub optimization: OptimizationLevel,
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, contains invalid TOML or
    /// fails [`SchedulerConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the algorithm mode.
    pub fn with_algorithm(mut self, algorithm: AlgorithmMode) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the optimization level.
    pub fn with_optimization(mut self, optimization: OptimizationLevel) -> Self {
        self.optimization = optimization;
        self
    }

    /// Rejects settings under which nothing could ever be placed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.rules;
        if r.max_daily_hours_teacher == 0 {
            return Err(ConfigError::Invalid(
                "max_daily_hours_teacher must be at least 1".into(),
            ));
        }
        if r.max_daily_hours_class == 0 {
            return Err(ConfigError::Invalid(
                "max_daily_hours_class must be at least 1".into(),
            ));
        }
        if r.max_consecutive_hours == 0 {
            return Err(ConfigError::Invalid(
                "max_consecutive_hours must be at least 1".into(),
            ));
        }
        if r.lunch_break_required && r.lunch_break_duration == 0 {
            return Err(ConfigError::Invalid(
                "lunch_break_duration must be at least 1 when lunch is required".into(),
            ));
        }
        Ok(())
    }
}

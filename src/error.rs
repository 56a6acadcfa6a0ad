//! Error types.
//!
//! Only [`StructuralError`] aborts a generation run. Everything else the
//! scheduler runs into (resolution failures, shortfalls, rule breaches) is
//! collected and returned as data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Day, EducationLevel, PeriodId, Slot};

/// Malformed scheduler input. Fatal for the run: no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralError {
    #[error("no lesson demands to schedule")]
    EmptyDemandList,

    #[error("unknown teacher '{teacher_id}' in demand for class '{class_id}'")]
    UnknownTeacher { teacher_id: String, class_id: String },

    #[error("unknown class '{class_id}' in demand for subject '{subject_id}'")]
    UnknownClass {
        class_id: String,
        subject_id: String,
    },

    #[error("unknown subject '{subject_id}' in demand for class '{class_id}'")]
    UnknownSubject {
        subject_id: String,
        class_id: String,
    },

    #[error("no timetable configured for level {level} (class '{class_name}')")]
    MissingTimetable {
        class_name: String,
        level: EducationLevel,
    },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// Editing a grid cell that cannot be edited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("{slot} is a fixed non-teaching slot")]
    FixedSlot { slot: Slot },

    #[error("{slot} is already occupied")]
    Occupied { slot: Slot },

    #[error("{day} {period} is listed more than once")]
    DuplicateCell { day: Day, period: PeriodId },

    #[error("lesson on {day} {period}, which is not a numbered period")]
    LessonOffPeriod { day: Day, period: PeriodId },
}

/// A deserialized demand breaking its hour quota.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "demand for class '{class_id}' / subject '{subject_id}' has {assigned_hours} of \
     {weekly_hours_required} hours assigned"
)]
pub struct DemandError {
    pub class_id: String,
    pub subject_id: String,
    pub assigned_hours: u32,
    pub weekly_hours_required: u32,
}

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Committing a schedule to a store failed.
#[derive(Debug, Error)]
pub enum CommitError<E: std::error::Error + 'static> {
    #[error("refusing to commit a failed generation run")]
    FailedRun,

    #[error("store error for teacher '{teacher_id}': {source}")]
    Store {
        teacher_id: String,
        #[source]
        source: E,
    },
}

//! Timetabling domain models.
//!
//! Plain data describing the school (entities), the week (time model),
//! what users said about availability (constraints), what must be taught
//! (demands) and what was placed (schedule).
//!
//! # Domain Mappings
//!
//! | timetable-core | Generic scheduling |
//! |----------------|--------------------|
//! | LessonDemand | Task with a unit-length activity repeated N times |
//! | Teacher | Resource (disjunctive) |
//! | SchoolClass | Second disjunctive resource |
//! | Slot | Discrete time bucket |
//! | TeacherGrid | Per-resource schedule |

mod constraint;
mod demand;
mod entity;
mod schedule;
mod time;

pub use constraint::{
    Availability, ConstraintStore, Recommendations, SlotVerdict, TimeConstraint,
    RESTRICTED_PENALTY,
};
pub use demand::{DemandKey, LessonDemand, Priority};
pub use entity::{
    Competency, EducationLevel, EntityKind, EntityRef, SchoolClass, SchoolData, Subject, Teacher,
};
pub use schedule::{
    class_view, GridKey, Lesson, ScheduleEntry, ScheduleResult, Statistics, TeacherGrid,
    UnassignedLesson,
};
pub use time::{
    week_slots, Day, FixedKind, LevelTimetable, PeriodId, Slot, TimeModel, TimetableEntry,
};

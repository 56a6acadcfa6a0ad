//! School timetable scheduling core.
//!
//! Turns a school's teachers, classes and subjects into weekly lesson
//! timetables: one grid per teacher, with class timetables derived from
//! them. Placement is greedy and deterministic; every hour that could not
//! be placed is reported instead of silently dropped.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Teacher`, `SchoolClass`, `Subject`,
//!   `TimeModel`, `ConstraintStore`, `LessonDemand`, `TeacherGrid`,
//!   `ScheduleResult`
//! - **`mapping`**: Resolves a user selection into lesson demands
//! - **`conflict`**: Teacher and class double-booking checks
//! - **`scheduler`**: Greedy placement, slot scoring, demand ordering, KPI
//! - **`validator`**: Post-hoc rule check of finished grids
//! - **`validation`**: Input integrity checks (duplicate IDs, references)
//! - **`store`**: Commit seam for persisting generated grids
//! - **`config`**: Generation settings and TOML loading
//!
//! # Flow
//!
//! ```text
//! SchoolData + Selection ──mapping──▶ LessonDemand*
//!                                          │
//! TimeModel + ConstraintStore ──▶ GreedyScheduler ──▶ ScheduleResult
//!                                                          │
//!                                    ScheduleValidator ◀───┤
//!                                         store::commit ◀──┘
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"

pub mod config;
pub mod conflict;
pub mod error;
pub mod mapping;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;
pub mod validator;

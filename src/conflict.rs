//! Double-booking checks.
//!
//! A pure predicate over an [`OccupancyView`]: would putting a lesson at a
//! slot collide with something already there? Nothing is mutated and
//! nothing panics; every outcome is a [`ConflictCheck`] whose message
//! names the teacher, class and subject involved.
//!
//! # Modes
//!
//! | Mode | Primary grid | Secondary check |
//! |------|--------------|-----------------|
//! | `Teacher` | Teacher's slot taken (lesson or fixed) | Class held by other teacher or subject |
//! | `Class` | Class's slot taken | Teacher busy with another class or subject, or fixed |

use std::collections::HashMap;

use crate::models::{ScheduleEntry, SchoolData, Slot, TeacherGrid};

/// Which side of the placement is being edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckMode {
    /// Placing into a teacher's grid.
    #[default]
    Teacher,
    /// Placing into a class's timetable.
    Class,
}

/// Who holds a class at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant<'a> {
    pub teacher_id: &'a str,
    pub subject_id: &'a str,
    /// Entry belongs to schedule data outside the current run.
    pub external: bool,
}

/// Read access to current placements.
///
/// Implemented by the scheduler's run arena and by [`GridOccupancy`].
pub trait OccupancyView {
    /// Entry in a teacher's grid at `slot`, fixed entries included.
    fn teacher_entry(&self, teacher_id: &str, slot: Slot) -> Option<&ScheduleEntry>;

    /// Lesson holding the class at `slot`, from any grid.
    fn class_occupant(&self, class_id: &str, slot: Slot) -> Option<Occupant<'_>>;
}

/// Outcome of a conflict check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictCheck {
    pub has_conflict: bool,
    /// Human-readable reason. Empty when there is no conflict.
    pub message: String,
    /// The colliding entry came from outside the current run.
    pub external: bool,
}

impl ConflictCheck {
    /// No conflict.
    pub fn clear() -> Self {
        Self::default()
    }

    fn conflict(message: String, external: bool) -> Self {
        Self {
            has_conflict: true,
            message,
            external,
        }
    }
}

/// A proposed lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<'a> {
    pub teacher_id: &'a str,
    pub class_id: &'a str,
    pub subject_id: &'a str,
    pub slot: Slot,
}

/// Checks placements against an occupancy view.
#[derive(Debug, Clone, Copy)]
pub struct ConflictChecker<'a> {
    data: &'a SchoolData,
}

impl<'a> ConflictChecker<'a> {
    pub fn new(data: &'a SchoolData) -> Self {
        Self { data }
    }

    /// Checks one placement.
    pub fn check(
        &self,
        mode: CheckMode,
        placement: Placement<'_>,
        view: &impl OccupancyView,
    ) -> ConflictCheck {
        match mode {
            CheckMode::Teacher => self
                .teacher_side(placement, view)
                .or_else(|| self.class_side(placement, view, false))
                .unwrap_or_else(ConflictCheck::clear),
            CheckMode::Class => self
                .class_side(placement, view, true)
                .or_else(|| self.teacher_side(placement, view))
                .unwrap_or_else(ConflictCheck::clear),
        }
    }

    /// Teacher's own grid: any entry collides.
    fn teacher_side(&self, p: Placement<'_>, view: &impl OccupancyView) -> Option<ConflictCheck> {
        let teacher = self.data.teacher_name(p.teacher_id);
        let message = match view.teacher_entry(p.teacher_id, p.slot)? {
            ScheduleEntry::Fixed { fixed } => {
                format!("{} is a fixed {} slot for {}", p.slot, fixed, teacher)
            }
            ScheduleEntry::Lesson(lesson) => format!(
                "{} is already teaching {} to {} at {}",
                teacher,
                self.data.subject_name(&lesson.subject_id),
                self.data.class_name(&lesson.class_id),
                p.slot
            ),
        };
        Some(ConflictCheck::conflict(message, false))
    }

    /// Class side. In teacher mode the class only collides with a
    /// different teacher or subject; in class mode any occupant collides.
    fn class_side(
        &self,
        p: Placement<'_>,
        view: &impl OccupancyView,
        strict: bool,
    ) -> Option<ConflictCheck> {
        let occupant = view.class_occupant(p.class_id, p.slot)?;
        let same = occupant.teacher_id == p.teacher_id && occupant.subject_id == p.subject_id;
        if same && !strict {
            return None;
        }
        Some(ConflictCheck::conflict(
            format!(
                "{} already has {} with {} at {}",
                self.data.class_name(p.class_id),
                self.data.subject_name(occupant.subject_id),
                self.data.teacher_name(occupant.teacher_id),
                p.slot
            ),
            occupant.external,
        ))
    }
}

/// Occupancy over a set of finished grids, with a derived class index.
///
/// When grids double-book a class, the grid seen first wins in the index.
#[derive(Debug, Clone, Default)]
pub struct GridOccupancy<'g> {
    grids: HashMap<&'g str, &'g TeacherGrid>,
    classes: HashMap<(&'g str, Slot), Occupant<'g>>,
}

impl<'g> GridOccupancy<'g> {
    pub fn new(grids: impl IntoIterator<Item = &'g TeacherGrid>) -> Self {
        let mut view = Self::default();
        for grid in grids {
            view.grids.entry(grid.teacher_id.as_str()).or_insert(grid);
            for (slot, lesson) in grid.lessons() {
                view.classes
                    .entry((lesson.class_id.as_str(), slot))
                    .or_insert(Occupant {
                        teacher_id: &grid.teacher_id,
                        subject_id: &lesson.subject_id,
                        external: false,
                    });
            }
        }
        view
    }
}

impl OccupancyView for GridOccupancy<'_> {
    fn teacher_entry(&self, teacher_id: &str, slot: Slot) -> Option<&ScheduleEntry> {
        self.grids.get(teacher_id).and_then(|g| g.at(slot))
    }

    fn class_occupant(&self, class_id: &str, slot: Slot) -> Option<Occupant<'_>> {
        self.classes.get(&(class_id, slot)).copied()
    }
}

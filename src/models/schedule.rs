//! Schedule (solution) model.
//!
//! The teacher grid is the only authoritative store of placements: one
//! grid per teacher, one entry per occupied position. Class timetables
//! are derived from the teacher grids on demand and never stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Day, FixedKind, LessonDemand, LevelTimetable, PeriodId, Slot};
use crate::error::{GridError, StructuralError};

/// A lesson occupying a teaching slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub subject_id: String,
    pub class_id: String,
    /// Filled in class-centric views; `None` inside a teacher's own grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
}

impl Lesson {
    /// Creates a lesson for a teacher grid.
    pub fn new(subject_id: impl Into<String>, class_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            class_id: class_id.into(),
            teacher_id: None,
        }
    }
}

/// One occupied position in a teacher's week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleEntry {
    Lesson(Lesson),
    /// Non-teaching sentinel. Immutable once seeded.
    Fixed { fixed: FixedKind },
}

impl ScheduleEntry {
    /// The lesson, unless this is a fixed entry.
    pub fn as_lesson(&self) -> Option<&Lesson> {
        match self {
            Self::Lesson(l) => Some(l),
            Self::Fixed { .. } => None,
        }
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }
}

/// Position of an entry within the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub day: Day,
    pub period: PeriodId,
}

impl From<Slot> for GridKey {
    fn from(slot: Slot) -> Self {
        Self {
            day: slot.day,
            period: PeriodId::Numbered(slot.period),
        }
    }
}

/// A teacher's weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "GridRepr", try_from = "GridRepr")]
pub struct TeacherGrid {
    pub teacher_id: String,
    /// Teaching periods of the grid's day layout, used for capacity.
    teaching_periods: Vec<u8>,
    entries: BTreeMap<GridKey, ScheduleEntry>,
}

/// Flat serialized form: JSON maps need string keys.
#[derive(Serialize, Deserialize)]
struct GridRepr {
    teacher_id: String,
    teaching_periods: Vec<u8>,
    cells: Vec<GridCell>,
}

#[derive(Serialize, Deserialize)]
struct GridCell {
    day: Day,
    period: PeriodId,
    entry: ScheduleEntry,
}

impl From<TeacherGrid> for GridRepr {
    fn from(grid: TeacherGrid) -> Self {
        Self {
            teacher_id: grid.teacher_id,
            teaching_periods: grid.teaching_periods,
            cells: grid
                .entries
                .into_iter()
                .map(|(k, entry)| GridCell {
                    day: k.day,
                    period: k.period,
                    entry,
                })
                .collect(),
        }
    }
}

/// Rejects cells a grid could never hold: two cells at one position, or a
/// lesson on a pseudo-period.
impl TryFrom<GridRepr> for TeacherGrid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        let mut entries = BTreeMap::new();
        for GridCell { day, period, entry } in repr.cells {
            if matches!(period, PeriodId::Pseudo(_)) && !entry.is_fixed() {
                return Err(GridError::LessonOffPeriod { day, period });
            }
            if entries.insert(GridKey { day, period }, entry).is_some() {
                return Err(GridError::DuplicateCell { day, period });
            }
        }
        Ok(Self {
            teacher_id: repr.teacher_id,
            teaching_periods: repr.teaching_periods,
            entries,
        })
    }
}

impl TeacherGrid {
    /// Creates an empty grid with periods 1..=10 as its teaching layout.
    pub fn new(teacher_id: impl Into<String>) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            teaching_periods: (1..=10).collect(),
            entries: BTreeMap::new(),
        }
    }

    /// Creates a grid seeded with the fixed slots of a level layout on
    /// every day.
    pub fn with_layout(teacher_id: impl Into<String>, layout: &LevelTimetable) -> Self {
        let mut entries = BTreeMap::new();
        for day in Day::ALL {
            for (period, fixed) in layout.fixed_entries() {
                entries.insert(GridKey { day, period }, ScheduleEntry::Fixed { fixed });
            }
        }
        Self {
            teacher_id: teacher_id.into(),
            teaching_periods: layout.teaching_periods(),
            entries,
        }
    }

    /// Entry at a position.
    pub fn get(&self, key: GridKey) -> Option<&ScheduleEntry> {
        self.entries.get(&key)
    }

    /// Entry at a teaching slot.
    pub fn at(&self, slot: Slot) -> Option<&ScheduleEntry> {
        self.entries.get(&GridKey::from(slot))
    }

    /// Lesson at a slot, ignoring fixed entries.
    pub fn lesson_at(&self, slot: Slot) -> Option<&Lesson> {
        self.at(slot).and_then(ScheduleEntry::as_lesson)
    }

    /// Whether nothing (lesson or fixed) occupies the slot.
    pub fn is_free(&self, slot: Slot) -> bool {
        !self.entries.contains_key(&GridKey::from(slot))
    }

    /// Places a lesson into a free slot.
    pub fn place(&mut self, slot: Slot, lesson: Lesson) -> Result<(), GridError> {
        match self.at(slot) {
            Some(ScheduleEntry::Fixed { .. }) => Err(GridError::FixedSlot { slot }),
            Some(ScheduleEntry::Lesson(_)) => Err(GridError::Occupied { slot }),
            None => {
                self.entries
                    .insert(GridKey::from(slot), ScheduleEntry::Lesson(lesson));
                Ok(())
            }
        }
    }

    /// Removes the lesson at a slot. Fixed entries cannot be cleared.
    pub fn clear(&mut self, slot: Slot) -> Result<Option<Lesson>, GridError> {
        let key = GridKey::from(slot);
        match self.entries.get(&key) {
            Some(ScheduleEntry::Fixed { .. }) => Err(GridError::FixedSlot { slot }),
            Some(ScheduleEntry::Lesson(_)) => Ok(self
                .entries
                .remove(&key)
                .and_then(|e| e.as_lesson().cloned())),
            None => Ok(None),
        }
    }

    /// All entries in (day, position) order.
    pub fn entries(&self) -> impl Iterator<Item = (GridKey, &ScheduleEntry)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }

    /// Lessons with their slots, in (day, period) order.
    pub fn lessons(&self) -> impl Iterator<Item = (Slot, &Lesson)> {
        self.entries.iter().filter_map(|(k, e)| match (k.period, e) {
            (PeriodId::Numbered(p), ScheduleEntry::Lesson(l)) => Some((Slot::new(k.day, p), l)),
            _ => None,
        })
    }

    /// Number of lessons. Fixed entries are not counted.
    pub fn lesson_count(&self) -> usize {
        self.lessons().count()
    }

    /// Number of lessons on a day.
    pub fn daily_count(&self, day: Day) -> usize {
        self.lessons().filter(|(s, _)| s.day == day).count()
    }

    /// Teaching periods of this grid's layout.
    pub fn teaching_periods(&self) -> &[u8] {
        &self.teaching_periods
    }

    /// Teaching slots per week.
    pub fn capacity(&self) -> usize {
        self.teaching_periods.len() * Day::ALL.len()
    }
}

/// Class timetable derived from all teacher grids.
///
/// Each lesson carries the teacher id. If the grids double-book the
/// class, the teacher with the smallest id wins; the validator reports
/// the double booking.
pub fn class_view<'a>(
    grids: impl IntoIterator<Item = &'a TeacherGrid>,
    class_id: &str,
) -> BTreeMap<Slot, Lesson> {
    let mut view = BTreeMap::new();
    let mut sorted: Vec<&TeacherGrid> = grids.into_iter().collect();
    sorted.sort_by(|a, b| a.teacher_id.cmp(&b.teacher_id));
    for grid in sorted {
        for (slot, lesson) in grid.lessons() {
            if lesson.class_id == class_id {
                view.entry(slot).or_insert_with(|| Lesson {
                    teacher_id: Some(grid.teacher_id.clone()),
                    ..lesson.clone()
                });
            }
        }
    }
    view
}

/// A demand's unplaced remainder, named for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedLesson {
    pub class_id: String,
    pub class_name: String,
    pub subject_id: String,
    pub subject_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub missing_hours: u32,
}

impl std::fmt::Display for UnassignedLesson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} / {} ({}): {} hour(s) could not be placed",
            self.class_name, self.subject_name, self.teacher_name, self.missing_hours
        )
    }
}

/// Run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Lessons across all produced grids.
    pub filled_slots: usize,
    /// Teaching capacity across all produced grids.
    pub total_slots: usize,
    /// Rejections caused by entries outside this run (pre-existing grids).
    pub conflict_count: usize,
    pub unassigned_lessons: Vec<UnassignedLesson>,
}

impl Statistics {
    /// Total missing hours.
    pub fn unassigned_hours(&self) -> u32 {
        self.unassigned_lessons.iter().map(|u| u.missing_hours).sum()
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// `false` only for structural failures.
    pub success: bool,
    /// Set when the run was stopped between demands.
    pub cancelled: bool,
    /// Grid of every teacher touched by the run, keyed by teacher id.
    pub grids: BTreeMap<String, TeacherGrid>,
    /// Final state of every demand, in placement order.
    pub demands: Vec<LessonDemand>,
    pub statistics: Statistics,
    pub errors: Vec<StructuralError>,
}

impl ScheduleResult {
    /// A failed run carrying the structural error.
    pub fn failed(error: StructuralError) -> Self {
        Self {
            success: false,
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Whether every demand was fully placed.
    pub fn is_complete(&self) -> bool {
        self.success && !self.cancelled && self.statistics.unassigned_lessons.is_empty()
    }

    /// Derived class timetable.
    pub fn class_view(&self, class_id: &str) -> BTreeMap<Slot, Lesson> {
        class_view(self.grids.values(), class_id)
    }
}

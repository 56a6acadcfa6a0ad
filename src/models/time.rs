//! Weekly time model.
//!
//! A school week is five days of numbered periods. Each education level
//! has its own day layout: numbered teaching periods interleaved with
//! fixed non-teaching slots (preparation, breakfast, lunch, afternoon
//! break). Lunch takes over a numbered period; the other fixed slots are
//! pseudo-periods that sit between numbered periods.
//!
//! # Invariants
//! - Fixed slots are never scheduling candidates and never count as hours.
//! - A level without a timetable has no teaching periods. Callers must
//!   treat that as an error rather than fall back to another level.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::EducationLevel;

/// School day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All school days in week order.
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Zero-based position in the week.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
        };
        f.write_str(s)
    }
}

/// A teaching slot: a numbered period on a day.
///
/// Ordered by day, then period, which is also the scheduler's tie-break
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub day: Day,
    pub period: u8,
}

impl Slot {
    /// Creates a slot.
    pub fn new(day: Day, period: u8) -> Self {
        Self { day, period }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} period {}", self.day, self.period)
    }
}

/// Kind of a fixed (non-teaching) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedKind {
    Preparation,
    Breakfast,
    Lunch,
    AfternoonBreak,
}

impl std::fmt::Display for FixedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Preparation => "preparation",
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::AfternoonBreak => "afternoon break",
        };
        f.write_str(s)
    }
}

/// Identifier of a position in a day: a numbered period or a pseudo-period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodId {
    /// Numbered period (1-based).
    Numbered(u8),
    /// Pseudo-period between numbered periods.
    Pseudo(FixedKind),
}

impl std::fmt::Display for PeriodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numbered(p) => write!(f, "period {p}"),
            Self::Pseudo(kind) => write!(f, "{kind}"),
        }
    }
}

/// One position in a level's day layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: PeriodId,
    /// `Some` for fixed slots.
    pub fixed: Option<FixedKind>,
}

impl TimetableEntry {
    /// A numbered teaching period.
    pub fn teaching(period: u8) -> Self {
        Self {
            id: PeriodId::Numbered(period),
            fixed: None,
        }
    }

    /// A fixed slot at the given position.
    pub fn fixed(id: PeriodId, kind: FixedKind) -> Self {
        Self {
            id,
            fixed: Some(kind),
        }
    }

    /// Whether lessons may be placed here.
    pub fn is_teaching(&self) -> bool {
        self.fixed.is_none() && matches!(self.id, PeriodId::Numbered(_))
    }
}

/// Ordered day layout for one education level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTimetable {
    pub level: EducationLevel,
    pub entries: Vec<TimetableEntry>,
}

impl LevelTimetable {
    /// Creates an empty layout.
    pub fn new(level: EducationLevel) -> Self {
        Self {
            level,
            entries: Vec::new(),
        }
    }

    /// Appends a numbered teaching period.
    pub fn with_teaching(mut self, period: u8) -> Self {
        self.entries.push(TimetableEntry::teaching(period));
        self
    }

    /// Appends a pseudo-period fixed slot.
    pub fn with_pseudo(mut self, kind: FixedKind) -> Self {
        self.entries
            .push(TimetableEntry::fixed(PeriodId::Pseudo(kind), kind));
        self
    }

    /// Appends a numbered period that is fixed (e.g. lunch).
    pub fn with_fixed_period(mut self, period: u8, kind: FixedKind) -> Self {
        self.entries
            .push(TimetableEntry::fixed(PeriodId::Numbered(period), kind));
        self
    }

    /// Kindergarten/primary layout: breakfast before period 1, lunch at
    /// period 5, afternoon break between 8 and 9.
    pub fn standard_early(level: EducationLevel) -> Self {
        Self::new(level)
            .with_pseudo(FixedKind::Breakfast)
            .with_teaching(1)
            .with_teaching(2)
            .with_teaching(3)
            .with_teaching(4)
            .with_fixed_period(5, FixedKind::Lunch)
            .with_teaching(6)
            .with_teaching(7)
            .with_teaching(8)
            .with_pseudo(FixedKind::AfternoonBreak)
            .with_teaching(9)
            .with_teaching(10)
    }

    /// Middle school layout: preparation before 1, breakfast between 1 and
    /// 2, lunch at period 6, afternoon break between 8 and 9.
    pub fn standard_middle() -> Self {
        Self::new(EducationLevel::Middle)
            .with_pseudo(FixedKind::Preparation)
            .with_teaching(1)
            .with_pseudo(FixedKind::Breakfast)
            .with_teaching(2)
            .with_teaching(3)
            .with_teaching(4)
            .with_teaching(5)
            .with_fixed_period(6, FixedKind::Lunch)
            .with_teaching(7)
            .with_teaching(8)
            .with_pseudo(FixedKind::AfternoonBreak)
            .with_teaching(9)
            .with_teaching(10)
    }

    /// Teaching periods in day order.
    pub fn teaching_periods(&self) -> Vec<u8> {
        self.entries
            .iter()
            .filter(|e| e.is_teaching())
            .filter_map(|e| match e.id {
                PeriodId::Numbered(p) => Some(p),
                PeriodId::Pseudo(_) => None,
            })
            .collect()
    }

    /// Whether `period` is a teaching period at this level.
    pub fn is_teaching_period(&self, period: u8) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_teaching() && e.id == PeriodId::Numbered(period))
    }

    /// Fixed slots in day order.
    pub fn fixed_entries(&self) -> impl Iterator<Item = (PeriodId, FixedKind)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.fixed.map(|kind| (e.id, kind)))
    }

    /// First numbered period occupied by lunch.
    pub fn lunch_period(&self) -> Option<u8> {
        self.entries.iter().find_map(|e| match (e.id, e.fixed) {
            (PeriodId::Numbered(p), Some(FixedKind::Lunch)) => Some(p),
            _ => None,
        })
    }

    /// Applies the global lunch rule.
    ///
    /// When required, lunch spans `duration` numbered periods starting at
    /// the level's lunch period. When not required, numbered lunch periods
    /// become teaching periods again.
    pub fn apply_lunch_rule(mut self, required: bool, duration: u8) -> Self {
        if !required {
            for e in &mut self.entries {
                if matches!(e.id, PeriodId::Numbered(_)) && e.fixed == Some(FixedKind::Lunch) {
                    e.fixed = None;
                }
            }
            return self;
        }
        let Some(start) = self.lunch_period() else {
            return self;
        };
        let end = start.saturating_add(duration.max(1));
        for e in &mut self.entries {
            if let PeriodId::Numbered(p) = e.id {
                if p >= start && p < end {
                    e.fixed = Some(FixedKind::Lunch);
                }
            }
        }
        self
    }
}

/// Day layouts for every configured education level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeModel {
    levels: BTreeMap<EducationLevel, LevelTimetable>,
}

impl TimeModel {
    /// A model with no levels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard ten-period school day for all three levels.
    pub fn standard() -> Self {
        Self::empty()
            .with_level(LevelTimetable::standard_early(EducationLevel::Kindergarten))
            .with_level(LevelTimetable::standard_early(EducationLevel::Primary))
            .with_level(LevelTimetable::standard_middle())
    }

    /// Adds or replaces a level layout.
    pub fn with_level(mut self, timetable: LevelTimetable) -> Self {
        self.levels.insert(timetable.level, timetable);
        self
    }

    /// Applies the lunch rule to every level.
    pub fn with_lunch_rule(self, required: bool, duration: u8) -> Self {
        let levels = self
            .levels
            .into_iter()
            .map(|(level, tt)| (level, tt.apply_lunch_rule(required, duration)))
            .collect();
        Self { levels }
    }

    /// Layout for a level.
    pub fn timetable(&self, level: EducationLevel) -> Option<&LevelTimetable> {
        self.levels.get(&level)
    }

    /// Ordered day layout for a level, fixed slots included.
    pub fn periods_for(&self, level: EducationLevel) -> Option<&[TimetableEntry]> {
        self.levels.get(&level).map(|t| t.entries.as_slice())
    }

    /// Whether `period` is a teaching period for `level`. False for
    /// unconfigured levels.
    pub fn is_teaching_period(&self, level: EducationLevel, period: u8) -> bool {
        self.levels
            .get(&level)
            .is_some_and(|t| t.is_teaching_period(period))
    }

    /// Teaching periods shared by all of `levels`.
    ///
    /// A period fixed at any level is fixed for the whole set. Returns the
    /// first unconfigured level as the error.
    pub fn teaching_periods_for(
        &self,
        levels: &BTreeSet<EducationLevel>,
    ) -> Result<Vec<u8>, EducationLevel> {
        let mut shared: Option<Vec<u8>> = None;
        for &level in levels {
            let tt = self.levels.get(&level).ok_or(level)?;
            let periods = tt.teaching_periods();
            shared = Some(match shared {
                None => periods,
                Some(prev) => prev.into_iter().filter(|p| periods.contains(p)).collect(),
            });
        }
        Ok(shared.unwrap_or_default())
    }

    /// Configured levels.
    pub fn levels(&self) -> impl Iterator<Item = EducationLevel> + '_ {
        self.levels.keys().copied()
    }
}

/// All slots for the given teaching periods across the week, in
/// (day, period) order.
pub fn week_slots(periods: &[u8]) -> Vec<Slot> {
    let mut sorted = periods.to_vec();
    sorted.sort_unstable();
    Day::ALL
        .iter()
        .flat_map(|&day| sorted.iter().map(move |&p| Slot::new(day, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_primary_layout() {
        let model = TimeModel::standard();
        let periods = model
            .timetable(EducationLevel::Primary)
            .unwrap()
            .teaching_periods();
        assert_eq!(periods, vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);
        assert!(!model.is_teaching_period(EducationLevel::Primary, 5));
        assert!(model.is_teaching_period(EducationLevel::Primary, 6));
    }

    #[test]
    fn test_standard_middle_layout() {
        let model = TimeModel::standard();
        assert!(model.is_teaching_period(EducationLevel::Middle, 5));
        assert!(!model.is_teaching_period(EducationLevel::Middle, 6));
        let fixed: Vec<_> = model
            .timetable(EducationLevel::Middle)
            .unwrap()
            .fixed_entries()
            .map(|(_, k)| k)
            .collect();
        assert_eq!(
            fixed,
            vec![
                FixedKind::Preparation,
                FixedKind::Breakfast,
                FixedKind::Lunch,
                FixedKind::AfternoonBreak
            ]
        );
    }

    #[test]
    fn test_missing_level_is_not_teaching() {
        let model = TimeModel::empty().with_level(LevelTimetable::standard_middle());
        assert!(!model.is_teaching_period(EducationLevel::Primary, 1));
        assert!(model.periods_for(EducationLevel::Primary).is_none());

        let levels: BTreeSet<_> = [EducationLevel::Primary].into_iter().collect();
        assert_eq!(
            model.teaching_periods_for(&levels),
            Err(EducationLevel::Primary)
        );
    }

    #[test]
    fn test_mixed_levels_intersect() {
        let model = TimeModel::standard();
        let levels: BTreeSet<_> = [EducationLevel::Primary, EducationLevel::Middle]
            .into_iter()
            .collect();
        // Lunch at 5 (primary) and 6 (middle) are both excluded
        assert_eq!(
            model.teaching_periods_for(&levels).unwrap(),
            vec![1, 2, 3, 4, 7, 8, 9, 10]
        );
    }

    #[test]
    fn test_lunch_rule_widens() {
        let tt = LevelTimetable::standard_early(EducationLevel::Primary).apply_lunch_rule(true, 2);
        assert!(!tt.is_teaching_period(5));
        assert!(!tt.is_teaching_period(6));
        assert!(tt.is_teaching_period(7));
    }

    #[test]
    fn test_lunch_rule_not_required() {
        let model = TimeModel::standard().with_lunch_rule(false, 1);
        assert!(model.is_teaching_period(EducationLevel::Primary, 5));
        assert!(model.is_teaching_period(EducationLevel::Middle, 6));
        // Pseudo-periods are untouched
        assert_eq!(
            model
                .timetable(EducationLevel::Middle)
                .unwrap()
                .fixed_entries()
                .count(),
            3
        );
    }

    #[test]
    fn test_week_slots_order() {
        let slots = week_slots(&[2, 1]);
        assert_eq!(slots.len(), 10);
        assert_eq!(slots[0], Slot::new(Day::Monday, 1));
        assert_eq!(slots[1], Slot::new(Day::Monday, 2));
        assert_eq!(slots[9], Slot::new(Day::Friday, 2));
    }
}

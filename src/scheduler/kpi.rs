//! Run statistics and schedule load metrics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Fill rate | Lessons placed / teaching capacity of the produced grids |
//! | Completion rate | Hours placed / hours required |
//! | Weekly hours | Lessons per teacher and per class |
//! | Max daily load | Most lessons a single teacher (or class) has on one day |

use std::collections::{BTreeMap, HashMap};

use crate::models::{Day, ScheduleResult, Statistics, TeacherGrid, UnassignedLesson};

/// Load indicators of a generated schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Lessons per teacher id.
    pub teacher_hours: BTreeMap<String, usize>,
    /// Lessons per class id, across all grids.
    pub class_hours: BTreeMap<String, usize>,
    /// Lessons placed.
    pub placed_hours: usize,
    /// Hours that could not be placed.
    pub unassigned_hours: u32,
    /// Fraction of teaching capacity used (0.0..1.0).
    pub fill_rate: f64,
    /// Fraction of required hours placed (0.0..1.0).
    pub completion_rate: f64,
    pub max_daily_teacher_load: usize,
    pub max_daily_class_load: usize,
}

impl ScheduleKpi {
    /// Computes indicators from a run result.
    pub fn calculate(result: &ScheduleResult) -> Self {
        let mut teacher_hours = BTreeMap::new();
        let mut class_hours: BTreeMap<String, usize> = BTreeMap::new();
        let mut class_daily: HashMap<(&str, Day), usize> = HashMap::new();
        let mut max_daily_teacher_load = 0;

        for grid in result.grids.values() {
            teacher_hours.insert(grid.teacher_id.clone(), grid.lesson_count());
            for day in Day::ALL {
                max_daily_teacher_load = max_daily_teacher_load.max(grid.daily_count(day));
            }
            for (slot, lesson) in grid.lessons() {
                *class_hours.entry(lesson.class_id.clone()).or_default() += 1;
                *class_daily
                    .entry((lesson.class_id.as_str(), slot.day))
                    .or_default() += 1;
            }
        }

        let placed_hours: usize = teacher_hours.values().sum();
        let unassigned_hours = result.statistics.unassigned_hours();
        let required = placed_hours + unassigned_hours as usize;

        let fill_rate = if result.statistics.total_slots == 0 {
            0.0
        } else {
            result.statistics.filled_slots as f64 / result.statistics.total_slots as f64
        };
        let completion_rate = if required == 0 {
            1.0
        } else {
            placed_hours as f64 / required as f64
        };

        Self {
            teacher_hours,
            class_hours,
            placed_hours,
            unassigned_hours,
            fill_rate,
            completion_rate,
            max_daily_teacher_load,
            max_daily_class_load: class_daily.values().copied().max().unwrap_or(0),
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_completion: f64, max_daily_load: usize) -> bool {
        self.completion_rate >= min_completion
            && self.max_daily_teacher_load <= max_daily_load
            && self.max_daily_class_load <= max_daily_load
    }
}

/// Statistics over the grids produced by a run.
pub(crate) fn compute_statistics(
    grids: &BTreeMap<String, TeacherGrid>,
    conflict_count: usize,
    unassigned_lessons: Vec<UnassignedLesson>,
) -> Statistics {
    Statistics {
        filled_slots: grids.values().map(TeacherGrid::lesson_count).sum(),
        total_slots: grids.values().map(TeacherGrid::capacity).sum(),
        conflict_count,
        unassigned_lessons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EducationLevel, Lesson, LevelTimetable, Slot};

    fn result() -> ScheduleResult {
        let layout = LevelTimetable::standard_early(EducationLevel::Primary);
        let mut t1 = TeacherGrid::with_layout("T1", &layout);
        t1.place(Slot::new(Day::Monday, 1), Lesson::new("S1", "C1"))
            .unwrap();
        t1.place(Slot::new(Day::Monday, 2), Lesson::new("S1", "C1"))
            .unwrap();
        t1.place(Slot::new(Day::Tuesday, 1), Lesson::new("S1", "C2"))
            .unwrap();
        let mut t2 = TeacherGrid::with_layout("T2", &layout);
        t2.place(Slot::new(Day::Monday, 3), Lesson::new("S2", "C1"))
            .unwrap();

        let mut grids = BTreeMap::new();
        grids.insert("T1".to_string(), t1);
        grids.insert("T2".to_string(), t2);
        let unassigned = vec![UnassignedLesson {
            class_id: "C2".into(),
            class_name: "5B".into(),
            subject_id: "S1".into(),
            subject_name: "Math".into(),
            teacher_id: "T1".into(),
            teacher_name: "Ayse".into(),
            missing_hours: 1,
        }];
        ScheduleResult {
            success: true,
            statistics: compute_statistics(&grids, 0, unassigned),
            grids,
            ..ScheduleResult::default()
        }
    }

    #[test]
    fn test_statistics() {
        let r = result();
        assert_eq!(r.statistics.filled_slots, 4);
        // 9 teaching periods x 5 days x 2 teachers
        assert_eq!(r.statistics.total_slots, 90);
    }

    #[test]
    fn test_kpi_loads() {
        let kpi = ScheduleKpi::calculate(&result());
        assert_eq!(kpi.teacher_hours["T1"], 3);
        assert_eq!(kpi.class_hours["C1"], 3);
        assert_eq!(kpi.max_daily_teacher_load, 2);
        assert_eq!(kpi.max_daily_class_load, 3);
        assert_eq!(kpi.placed_hours, 4);
        assert_eq!(kpi.unassigned_hours, 1);
        assert!((kpi.completion_rate - 0.8).abs() < 1e-10);
        assert!((kpi.fill_rate - 4.0 / 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_thresholds() {
        let kpi = ScheduleKpi::calculate(&result());
        assert!(kpi.meets_thresholds(0.8, 3));
        assert!(!kpi.meets_thresholds(0.9, 3));
        assert!(!kpi.meets_thresholds(0.5, 2));
    }

    #[test]
    fn test_empty_result() {
        let kpi = ScheduleKpi::calculate(&ScheduleResult::default());
        assert_eq!(kpi.fill_rate, 0.0);
        assert_eq!(kpi.completion_rate, 1.0);
        assert_eq!(kpi.max_daily_class_load, 0);
    }
}

//! Schedule validation.
//!
//! Re-applies the scheduler's rules to finished grids, whether generated or
//! edited by hand. Findings fall into three buckets:
//!
//! | Bucket | Blocks saving | Examples |
//! |--------|---------------|----------|
//! | errors | yes | unknown ids, lesson on a fixed or missing period |
//! | constraint_violations | yes | unavailable slot, double booking, caps, same-subject runs |
//! | warnings | no | restricted slot, first/last period, long teacher runs |
//!
//! Messages name teachers, classes and subjects and are deduplicated.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::RuleSet;
use crate::models::{
    Availability, ConstraintStore, Day, EntityRef, SchoolData, Slot, TeacherGrid, TimeModel,
};

/// Validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub constraint_violations: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Default)]
struct Report {
    seen: HashSet<String>,
    errors: Vec<String>,
    violations: Vec<String>,
    warnings: Vec<String>,
}

impl Report {
    fn error(&mut self, message: String) {
        if self.seen.insert(message.clone()) {
            self.errors.push(message);
        }
    }

    fn violation(&mut self, message: String) {
        if self.seen.insert(message.clone()) {
            self.violations.push(message);
        }
    }

    fn warning(&mut self, message: String) {
        if self.seen.insert(message.clone()) {
            self.warnings.push(message);
        }
    }

    fn finish(self) -> ScheduleValidation {
        ScheduleValidation {
            is_valid: self.errors.is_empty() && self.violations.is_empty(),
            errors: self.errors,
            constraint_violations: self.violations,
            warnings: self.warnings,
        }
    }
}

/// A lesson seen from the class side.
#[derive(Debug, Clone, Copy)]
struct ClassLesson<'g> {
    teacher_id: &'g str,
    subject_id: &'g str,
}

/// Validates grids against the directory, time model, constraints and rules.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleValidator<'a> {
    data: &'a SchoolData,
    model: &'a TimeModel,
    store: &'a ConstraintStore,
    rules: &'a RuleSet,
}

impl<'a> ScheduleValidator<'a> {
    /// `model` should already carry the lunch rule the schedule was
    /// generated under (see [`TimeModel::with_lunch_rule`]).
    pub fn new(
        data: &'a SchoolData,
        model: &'a TimeModel,
        store: &'a ConstraintStore,
        rules: &'a RuleSet,
    ) -> Self {
        Self {
            data,
            model,
            store,
            rules,
        }
    }

    /// Validates every grid.
    pub fn validate<'g>(
        &self,
        grids: impl IntoIterator<Item = &'g TeacherGrid>,
    ) -> ScheduleValidation {
        let grids: Vec<&TeacherGrid> = grids.into_iter().collect();
        self.run(&grids, None)
    }

    /// Validates one teacher's grid against all grids.
    ///
    /// Class-side checks still see every grid, but only findings that
    /// involve `teacher_id` or the classes it teaches are reported.
    pub fn validate_teacher<'g>(
        &self,
        teacher_id: &str,
        grids: impl IntoIterator<Item = &'g TeacherGrid>,
    ) -> ScheduleValidation {
        let grids: Vec<&TeacherGrid> = grids.into_iter().collect();
        if !grids.iter().any(|g| g.teacher_id == teacher_id) {
            let mut report = Report::default();
            report.error(format!(
                "No grid for teacher '{}'",
                self.data.teacher_name(teacher_id)
            ));
            return report.finish();
        }
        self.run(&grids, Some(teacher_id))
    }

    fn run(&self, grids: &[&TeacherGrid], focus: Option<&str>) -> ScheduleValidation {
        let mut report = Report::default();
        let in_scope = |g: &&&TeacherGrid| focus.map_or(true, |t| g.teacher_id == t);

        for grid in grids.iter().filter(in_scope) {
            self.check_teacher_grid(grid, &mut report);
        }

        // Class projection across all grids
        let mut classes: BTreeMap<&str, BTreeMap<Slot, Vec<ClassLesson<'_>>>> = BTreeMap::new();
        for grid in grids {
            for (slot, lesson) in grid.lessons() {
                classes
                    .entry(lesson.class_id.as_str())
                    .or_default()
                    .entry(slot)
                    .or_default()
                    .push(ClassLesson {
                        teacher_id: &grid.teacher_id,
                        subject_id: &lesson.subject_id,
                    });
            }
        }

        let focused_classes: Option<HashSet<&str>> = focus.map(|t| {
            grids
                .iter()
                .filter(|g| g.teacher_id == t)
                .flat_map(|g| g.lessons().map(|(_, l)| l.class_id.as_str()))
                .collect()
        });

        for (class_id, cells) in &classes {
            if focused_classes
                .as_ref()
                .is_some_and(|set| !set.contains(class_id))
            {
                continue;
            }
            self.check_class(class_id, cells, focus, &mut report);
        }

        report.finish()
    }

    fn check_teacher_grid(&self, grid: &TeacherGrid, report: &mut Report) {
        let teacher = self.data.teacher_name(&grid.teacher_id);
        if self.data.teacher(&grid.teacher_id).is_none() {
            report.error(format!("Unknown teacher '{}'", grid.teacher_id));
        }

        let teacher_ref = EntityRef::Teacher(&grid.teacher_id);
        let mut by_day: BTreeMap<Day, Vec<u8>> = BTreeMap::new();

        for (slot, lesson) in grid.lessons() {
            by_day.entry(slot.day).or_default().push(slot.period);
            let class_name = self.data.class_name(&lesson.class_id);

            if self.data.subject(&lesson.subject_id).is_none() {
                report.error(format!(
                    "Unknown subject '{}' in {}'s grid",
                    lesson.subject_id, teacher
                ));
            }
            match self.data.class(&lesson.class_id) {
                None => report.error(format!(
                    "Unknown class '{}' in {}'s grid",
                    lesson.class_id, teacher
                )),
                Some(class) => match self.model.teaching_periods_for(&class.levels) {
                    Err(level) => report.error(format!(
                        "No timetable configured for level {} (class '{}')",
                        level, class.name
                    )),
                    Ok(periods) => {
                        if !periods.contains(&slot.period) {
                            report.error(format!(
                                "{} has a lesson on {}, which is not a teaching period for {}",
                                teacher, slot, class.name
                            ));
                        } else if self.rules.avoid_first_last_period
                            && (periods.first() == Some(&slot.period)
                                || periods.last() == Some(&slot.period))
                        {
                            report.warning(format!(
                                "{} has {} in the first or last period on {}",
                                class.name,
                                self.data.subject_name(&lesson.subject_id),
                                slot.day
                            ));
                        }
                    }
                },
            }

            match self.store.availability(teacher_ref, slot) {
                Availability::Unavailable => {
                    report.violation(format!("{} is unavailable on {}", teacher, slot))
                }
                Availability::Restricted => {
                    report.warning(format!("{} is restricted on {}", teacher, slot))
                }
                Availability::Preferred => {}
            }
            match self.store.availability(EntityRef::Class(&lesson.class_id), slot) {
                Availability::Unavailable => {
                    report.violation(format!("{} is unavailable on {}", class_name, slot))
                }
                Availability::Restricted => {
                    report.warning(format!("{} is restricted on {}", class_name, slot))
                }
                Availability::Preferred => {}
            }
        }

        for (day, mut periods) in by_day {
            if periods.len() as u32 > self.rules.max_daily_hours_teacher {
                report.violation(format!(
                    "{} has {} lessons on {} (max {})",
                    teacher,
                    periods.len(),
                    day,
                    self.rules.max_daily_hours_teacher
                ));
            }
            periods.sort_unstable();
            let longest = longest_run(&periods, |a, b| a.checked_add(1) == Some(b));
            if longest > self.rules.max_consecutive_hours {
                report.warning(format!(
                    "{} teaches {} periods in a row on {}",
                    teacher, longest, day
                ));
            }
        }
    }

    fn check_class(
        &self,
        class_id: &str,
        cells: &BTreeMap<Slot, Vec<ClassLesson<'_>>>,
        focus: Option<&str>,
        report: &mut Report,
    ) {
        let class_name = self.data.class_name(class_id);
        let involves_focus = |lessons: &[ClassLesson<'_>]| {
            focus.map_or(true, |t| lessons.iter().any(|l| l.teacher_id == t))
        };

        let mut daily: BTreeMap<Day, usize> = BTreeMap::new();
        for (slot, lessons) in cells {
            *daily.entry(slot.day).or_default() += 1;
            if lessons.len() > 1 && involves_focus(lessons) {
                let teachers: Vec<&str> = lessons
                    .iter()
                    .map(|l| self.data.teacher_name(l.teacher_id))
                    .collect();
                report.violation(format!(
                    "{} is double-booked on {} ({})",
                    class_name,
                    slot,
                    teachers.join(", ")
                ));
            }
        }

        for (day, count) in daily {
            if count as u32 > self.rules.max_daily_hours_class {
                report.violation(format!(
                    "{} has {} lessons on {} (max {})",
                    class_name, count, day, self.rules.max_daily_hours_class
                ));
            }
        }

        if !self.rules.avoid_consecutive_same_subject {
            return;
        }
        let Some(periods) = self
            .data
            .class(class_id)
            .and_then(|c| self.model.teaching_periods_for(&c.levels).ok())
        else {
            return;
        };

        let mut runs: HashMap<(Day, &str), Vec<u8>> = HashMap::new();
        for (slot, lessons) in cells {
            if let Some(first) = lessons.first() {
                runs.entry((slot.day, first.subject_id))
                    .or_default()
                    .push(slot.period);
            }
        }
        let mut runs: Vec<_> = runs.into_iter().collect();
        runs.sort_unstable();
        for ((day, subject_id), mut hours) in runs {
            hours.sort_unstable();
            let longest = longest_run(&hours, |a, b| {
                a.checked_add(1) == Some(b) && periods.contains(&a) && periods.contains(&b)
            });
            if longest > self.rules.max_consecutive_hours {
                report.violation(format!(
                    "{} has {} consecutive {} lessons on {} (max {})",
                    class_name,
                    longest,
                    self.data.subject_name(subject_id),
                    day,
                    self.rules.max_consecutive_hours
                ));
            }
        }
    }
}

/// Longest chain in sorted `periods` where each neighbour pair is linked.
fn longest_run(periods: &[u8], linked: impl Fn(u8, u8) -> bool) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<u8> = None;
    for &p in periods {
        current = match previous {
            Some(prev) if linked(prev, p) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(p);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EducationLevel, Lesson, LevelTimetable, SchoolClass, Subject, Teacher, TimeConstraint,
    };

    fn data() -> SchoolData {
        SchoolData::new(
            vec![
                Teacher::new("T1", "Ayse").with_competency("Math", EducationLevel::Primary),
                Teacher::new("T2", "Mehmet").with_competency("Art", EducationLevel::Primary),
            ],
            vec![SchoolClass::new("C1", "5A", EducationLevel::Primary)],
            vec![
                Subject::new("S1", "Math", "Math", EducationLevel::Primary, 4),
                Subject::new("S2", "Art", "Art", EducationLevel::Primary, 2),
            ],
        )
    }

    fn grid(teacher: &str, lessons: &[(Day, u8, &str)]) -> TeacherGrid {
        let layout = LevelTimetable::standard_early(EducationLevel::Primary);
        let mut g = TeacherGrid::with_layout(teacher, &layout);
        for &(day, period, subject) in lessons {
            g.place(Slot::new(day, period), Lesson::new(subject, "C1"))
                .unwrap();
        }
        g
    }

    fn check(
        grids: &[TeacherGrid],
        constraints: &[TimeConstraint],
        rules: RuleSet,
    ) -> ScheduleValidation {
        let data = data();
        let model = TimeModel::standard();
        let store = ConstraintStore::from_constraints(constraints);
        ScheduleValidator::new(&data, &model, &store, &rules).validate(grids)
    }

    #[test]
    fn test_clean_schedule() {
        let grids = [grid(
            "T1",
            &[(Day::Monday, 1, "S1"), (Day::Monday, 2, "S1")],
        )];
        let v = check(&grids, &[], RuleSet::default());
        assert!(v.is_valid);
        assert!(v.errors.is_empty());
        assert!(v.constraint_violations.is_empty());
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_unavailable_blocks_restricted_warns() {
        let grids = [grid(
            "T1",
            &[(Day::Monday, 1, "S1"), (Day::Tuesday, 1, "S1")],
        )];
        let constraints = [
            TimeConstraint::teacher("T1", Day::Monday, 1, Availability::Unavailable),
            TimeConstraint::class("C1", Day::Tuesday, 1, Availability::Restricted),
        ];
        let v = check(&grids, &constraints, RuleSet::default());
        assert!(!v.is_valid);
        assert_eq!(v.constraint_violations, vec!["Ayse is unavailable on Monday period 1"]);
        assert_eq!(v.warnings, vec!["5A is restricted on Tuesday period 1"]);
    }

    #[test]
    fn test_double_booking_named() {
        let grids = [
            grid("T1", &[(Day::Monday, 3, "S1")]),
            grid("T2", &[(Day::Monday, 3, "S2")]),
        ];
        let v = check(&grids, &[], RuleSet::default());
        assert!(!v.is_valid);
        assert_eq!(v.constraint_violations.len(), 1);
        assert!(v.constraint_violations[0].contains("5A"));
        assert!(v.constraint_violations[0].contains("Ayse, Mehmet"));
    }

    #[test]
    fn test_caps_and_runs() {
        let grids = [grid(
            "T1",
            &[
                (Day::Monday, 1, "S1"),
                (Day::Monday, 2, "S1"),
                (Day::Monday, 3, "S1"),
                (Day::Monday, 4, "S1"),
            ],
        )];
        let rules = RuleSet {
            max_daily_hours_class: 3,
            ..RuleSet::default()
        };
        let v = check(&grids, &[], rules);
        assert!(!v.is_valid);
        // class cap and the same-subject run
        assert_eq!(v.constraint_violations.len(), 2);
        // teacher run of 4 exceeds 3
        assert_eq!(v.warnings, vec!["Ayse teaches 4 periods in a row on Monday"]);
    }

    #[test]
    fn test_teacher_daily_cap() {
        let grids = [grid(
            "T1",
            &[
                (Day::Monday, 1, "S1"),
                (Day::Monday, 3, "S1"),
                (Day::Monday, 7, "S1"),
            ],
        )];
        let rules = RuleSet {
            max_daily_hours_teacher: 2,
            ..RuleSet::default()
        };
        let v = check(&grids, &[], rules);
        assert!(!v.is_valid);
        assert_eq!(
            v.constraint_violations,
            vec!["Ayse has 3 lessons on Monday (max 2)"]
        );
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_lunch_breaks_runs() {
        // 3, 4 | lunch | 6, 7 is two runs of two
        let grids = [grid(
            "T1",
            &[
                (Day::Monday, 3, "S1"),
                (Day::Monday, 4, "S1"),
                (Day::Monday, 6, "S1"),
                (Day::Monday, 7, "S1"),
            ],
        )];
        let rules = RuleSet {
            max_consecutive_hours: 2,
            ..RuleSet::default()
        };
        let v = check(&grids, &[], rules);
        assert!(v.is_valid);
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_structural_errors() {
        let mut g = TeacherGrid::new("TX");
        g.place(Slot::new(Day::Monday, 5), Lesson::new("SX", "C1"))
            .unwrap();
        let v = check(&[g], &[], RuleSet::default());
        assert!(!v.is_valid);
        // unknown teacher, unknown subject, lesson on lunch
        assert_eq!(v.errors.len(), 3);
    }

    #[test]
    fn test_first_last_warning() {
        let grids = [grid("T1", &[(Day::Friday, 10, "S1")])];
        let rules = RuleSet {
            avoid_first_last_period: true,
            ..RuleSet::default()
        };
        let v = check(&grids, &[], rules);
        assert!(v.is_valid);
        assert_eq!(v.warnings.len(), 1);
        assert!(v.warnings[0].contains("Math"));
    }

    #[test]
    fn test_validate_teacher_scope() {
        let data = data();
        let model = TimeModel::standard();
        let store = ConstraintStore::from_constraints(&[TimeConstraint::teacher(
            "T2",
            Day::Friday,
            1,
            Availability::Unavailable,
        )]);
        let rules = RuleSet::default();
        let validator = ScheduleValidator::new(&data, &model, &store, &rules);
        let grids = [
            grid("T1", &[(Day::Monday, 3, "S1")]),
            grid("T2", &[(Day::Monday, 3, "S2"), (Day::Friday, 1, "S2")]),
        ];

        let v = validator.validate_teacher("T1", &grids);
        // The double booking involves T1; T2's own breach is out of scope
        assert_eq!(v.constraint_violations.len(), 1);
        assert!(v.constraint_violations[0].contains("double-booked"));

        let missing = validator.validate_teacher("T9", &grids);
        assert!(!missing.is_valid);
    }
}

//! Turns the user's selection into lesson demands.
//!
//! For every selected (class, subject) pair whose levels intersect, a
//! teacher is resolved:
//!
//! 1. a selected teacher linked to the class (homeroom or co-teacher)
//!    holding the subject's branch at one of its levels;
//! 2. otherwise any selected teacher holding branch and level;
//! 3. otherwise the pair fails with a [`ResolutionError`].
//!
//! Pairs whose levels do not intersect are skipped without error. Failed
//! pairs are never dropped silently: the caller gets the full error list
//! and decides whether to go ahead with the partial mapping.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{LessonDemand, Priority, SchoolClass, SchoolData, Subject, Teacher};

/// What the user picked for a generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub class_ids: Vec<String>,
    pub subject_ids: Vec<String>,
    pub teacher_ids: Vec<String>,
    /// Weekly hour overrides per subject id. Zero means "use the default".
    pub subject_hours: HashMap<String, u32>,
    /// Priority overrides per subject id.
    pub subject_priorities: HashMap<String, Priority>,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects every entity in the directory.
    pub fn all(data: &SchoolData) -> Self {
        Self {
            class_ids: data.classes().iter().map(|c| c.id.clone()).collect(),
            subject_ids: data.subjects().iter().map(|s| s.id.clone()).collect(),
            teacher_ids: data.teachers().iter().map(|t| t.id.clone()).collect(),
            ..Self::default()
        }
    }

    pub fn with_classes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_subjects<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subject_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_teachers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teacher_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Overrides a subject's weekly hours.
    pub fn with_hours(mut self, subject_id: impl Into<String>, hours: u32) -> Self {
        self.subject_hours.insert(subject_id.into(), hours);
        self
    }

    /// Overrides a subject's priority.
    pub fn with_priority(mut self, subject_id: impl Into<String>, priority: Priority) -> Self {
        self.subject_priorities.insert(subject_id.into(), priority);
        self
    }
}

/// No eligible teacher for a requested (class, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
    "no eligible teacher for subject '{subject_name}' in class '{class_name}': check that \
     enough teachers are selected and that their branch and level match"
)]
pub struct ResolutionError {
    pub class_id: String,
    pub class_name: String,
    pub subject_id: String,
    pub subject_name: String,
}

/// Result of building the demand list.
#[derive(Debug, Clone, Default)]
pub struct MappingOutcome {
    /// One demand per resolved pair, in (class, subject) selection order.
    pub demands: Vec<LessonDemand>,
    /// One error per pair with no eligible teacher.
    pub errors: Vec<ResolutionError>,
    /// Pairs skipped because their levels don't intersect.
    pub skipped_pairs: usize,
}

impl MappingOutcome {
    /// Whether every requested pair resolved.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Demands if every pair resolved, otherwise the errors.
    pub fn into_result(self) -> Result<Vec<LessonDemand>, Vec<ResolutionError>> {
        if self.errors.is_empty() {
            Ok(self.demands)
        } else {
            Err(self.errors)
        }
    }
}

/// Builds lesson demands from a selection.
#[derive(Debug, Clone, Copy)]
pub struct MappingBuilder<'a> {
    data: &'a SchoolData,
}

impl<'a> MappingBuilder<'a> {
    pub fn new(data: &'a SchoolData) -> Self {
        Self { data }
    }

    /// Resolves every selected (class, subject) pair.
    ///
    /// Selected ids missing from the directory are ignored here;
    /// [`crate::validation::validate_input`] reports them.
    pub fn build(&self, selection: &Selection) -> MappingOutcome {
        let classes = select(self.data.classes(), &selection.class_ids, |c| &c.id);
        let subjects = select(self.data.subjects(), &selection.subject_ids, |s| &s.id);
        let teachers = select(self.data.teachers(), &selection.teacher_ids, |t| &t.id);

        let mut outcome = MappingOutcome::default();
        for class in &classes {
            for subject in &subjects {
                if !subject.applies_to(class) {
                    debug!(
                        event = "level_mismatch",
                        class = %class.name,
                        subject = %subject.name,
                        "skipping pair"
                    );
                    outcome.skipped_pairs += 1;
                    continue;
                }

                match find_teacher(subject, class, &teachers) {
                    Some(teacher) => {
                        let hours = selection
                            .subject_hours
                            .get(&subject.id)
                            .copied()
                            .filter(|&h| h > 0)
                            .unwrap_or(subject.weekly_hours);
                        let priority = selection
                            .subject_priorities
                            .get(&subject.id)
                            .copied()
                            .unwrap_or_default();
                        outcome.demands.push(
                            LessonDemand::new(&class.id, &subject.id, &teacher.id, hours)
                                .with_priority(priority),
                        );
                    }
                    None => {
                        warn!(
                            event = "resolution_failed",
                            class = %class.name,
                            subject = %subject.name,
                            "no eligible teacher"
                        );
                        outcome.errors.push(ResolutionError {
                            class_id: class.id.clone(),
                            class_name: class.name.clone(),
                            subject_id: subject.id.clone(),
                            subject_name: subject.name.clone(),
                        });
                    }
                }
            }
        }
        outcome
    }
}

/// Entities whose ids are selected, in directory order.
fn select<'d, T>(items: &'d [T], ids: &[String], id: impl Fn(&T) -> &String) -> Vec<&'d T> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    items
        .iter()
        .filter(|item| wanted.contains(id(item).as_str()))
        .collect()
}

fn find_teacher<'t>(
    subject: &Subject,
    class: &SchoolClass,
    teachers: &[&'t Teacher],
) -> Option<&'t Teacher> {
    teachers
        .iter()
        .find(|t| class.is_linked_teacher(&t.id) && t.can_teach(subject))
        .or_else(|| teachers.iter().find(|t| t.can_teach(subject)))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EducationLevel::{Middle, Primary};

    fn sample_data() -> SchoolData {
        SchoolData::new(
            vec![
                Teacher::new("T1", "Ayse").with_competency("Math", Primary),
                Teacher::new("T2", "Mehmet").with_competency("Math", Primary),
                Teacher::new("T3", "Zeynep").with_competency("Science", Middle),
            ],
            vec![
                SchoolClass::new("C1", "5A", Primary).with_homeroom_teacher("T2"),
                SchoolClass::new("C2", "5B", Primary),
            ],
            vec![
                Subject::new("S1", "Math", "Math", Primary, 4),
                Subject::new("S2", "Science", "Science", Middle, 3),
                Subject::new("S3", "Music", "Music", Primary, 2),
            ],
        )
    }

    #[test]
    fn test_prefers_linked_teacher() {
        let data = sample_data();
        let sel = Selection {
            subject_ids: vec!["S1".into()],
            ..Selection::all(&data)
        };
        let out = MappingBuilder::new(&data).build(&sel);
        assert!(out.is_complete());
        assert_eq!(out.demands.len(), 2);
        // 5A has T2 as homeroom teacher
        assert_eq!(out.demands[0].teacher_id(), "T2");
        // 5B falls back to the first matching selected teacher
        assert_eq!(out.demands[1].teacher_id(), "T1");
    }

    #[test]
    fn test_linked_teacher_must_be_selected() {
        let data = sample_data();
        let sel = Selection::new()
            .with_classes(["C1"])
            .with_subjects(["S1"])
            .with_teachers(["T1"]);
        let out = MappingBuilder::new(&data).build(&sel);
        assert_eq!(out.demands[0].teacher_id(), "T1");
    }

    #[test]
    fn test_level_mismatch_skipped_and_missing_teacher_reported() {
        let data = sample_data();
        let sel = Selection::new()
            .with_classes(["C1"])
            .with_subjects(["S2", "S3"])
            .with_teachers(["T1", "T2", "T3"]);
        let out = MappingBuilder::new(&data).build(&sel);
        assert!(out.demands.is_empty());
        assert_eq!(out.skipped_pairs, 1);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].class_name, "5A");
        assert_eq!(out.errors[0].subject_name, "Music");
        assert!(out.errors[0].to_string().contains("Music"));
    }

    #[test]
    fn test_overrides() {
        let data = sample_data();
        let sel = Selection::new()
            .with_classes(["C2"])
            .with_subjects(["S1"])
            .with_teachers(["T1"])
            .with_hours("S1", 6)
            .with_priority("S1", Priority::High);
        let out = MappingBuilder::new(&data).build(&sel);
        assert_eq!(out.demands[0].weekly_hours_required, 6);
        assert_eq!(out.demands[0].priority, Priority::High);
    }

    #[test]
    fn test_zero_hour_override_uses_default() {
        let data = sample_data();
        let sel = Selection::new()
            .with_classes(["C2"])
            .with_subjects(["S1"])
            .with_teachers(["T1"])
            .with_hours("S1", 0);
        let out = MappingBuilder::new(&data).build(&sel);
        assert_eq!(out.demands[0].weekly_hours_required, 4);
        assert_eq!(out.demands[0].priority, Priority::Medium);
    }

    #[test]
    fn test_into_result() {
        let data = sample_data();
        let sel = Selection::new()
            .with_classes(["C1"])
            .with_subjects(["S3"])
            .with_teachers(["T1"]);
        let errors = MappingBuilder::new(&data)
            .build(&sel)
            .into_result()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}

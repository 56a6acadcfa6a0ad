//! Input validation for timetable generation.
//!
//! Checks structural integrity of the entity directory and the user's
//! selection before any demand is built. Detects:
//! - Duplicate IDs
//! - Selected IDs missing from the directory
//! - Classes linked to unknown teachers
//! - Classes and subjects without an education level
//! - Selected subjects with no weekly hours
//! - Selected classes whose level has no timetable
//!
//! Every problem is collected; validation never stops at the first one.

use std::collections::HashSet;

use crate::mapping::Selection;
use crate::models::{SchoolData, TimeModel};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities of the same kind share an ID.
    DuplicateId,
    /// A selection or class link names an entity that doesn't exist.
    UnknownReference,
    /// A class or subject has no education level.
    MissingLevel,
    /// A selected subject would be requested with zero hours.
    EmptyHours,
    /// A selected class has a level with no timetable.
    MissingTimetable,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Validates the directory and the selection.
///
/// Checks:
/// 1. No duplicate teacher, class or subject IDs
/// 2. Every selected ID exists
/// 3. Homeroom and co-teacher links point to existing teachers
/// 4. Every class and subject has at least one level
/// 5. Every selected subject ends up with a positive hour count
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(data: &SchoolData, selection: &Selection) -> ValidationResult {
    let mut errors = Vec::new();

    check_duplicates(
        "teacher",
        data.teachers().iter().map(|t| t.id.as_str()),
        &mut errors,
    );
    check_duplicates(
        "class",
        data.classes().iter().map(|c| c.id.as_str()),
        &mut errors,
    );
    check_duplicates(
        "subject",
        data.subjects().iter().map(|s| s.id.as_str()),
        &mut errors,
    );

    for id in &selection.teacher_ids {
        if data.teacher(id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Selected teacher '{id}' does not exist"),
            ));
        }
    }
    for id in &selection.class_ids {
        if data.class(id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Selected class '{id}' does not exist"),
            ));
        }
    }
    for id in &selection.subject_ids {
        if data.subject(id).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownReference,
                format!("Selected subject '{id}' does not exist"),
            ));
        }
    }

    for class in data.classes() {
        let linked = class
            .homeroom_teacher_id
            .iter()
            .chain(class.co_teacher_ids.iter());
        for teacher_id in linked {
            if data.teacher(teacher_id).is_none() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownReference,
                    format!(
                        "Class '{}' is linked to unknown teacher '{}'",
                        class.name, teacher_id
                    ),
                ));
            }
        }
        if class.levels.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingLevel,
                format!("Class '{}' has no education level", class.name),
            ));
        }
    }

    for subject in data.subjects() {
        if subject.levels.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingLevel,
                format!("Subject '{}' has no education level", subject.name),
            ));
        }
    }

    for id in &selection.subject_ids {
        let Some(subject) = data.subject(id) else {
            continue;
        };
        let hours = selection
            .subject_hours
            .get(id)
            .copied()
            .filter(|&h| h > 0)
            .unwrap_or(subject.weekly_hours);
        if hours == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyHours,
                format!("Subject '{}' has no weekly hours", subject.name),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that every level of every selected class has a timetable.
pub fn validate_timetables(
    data: &SchoolData,
    selection: &Selection,
    model: &TimeModel,
) -> ValidationResult {
    let errors: Vec<ValidationError> = selection
        .class_ids
        .iter()
        .filter_map(|id| data.class(id))
        .flat_map(|class| {
            class
                .levels
                .iter()
                .filter(|&&level| model.timetable(level).is_none())
                .map(move |level| {
                    ValidationError::new(
                        ValidationErrorKind::MissingTimetable,
                        format!(
                            "No timetable configured for level {} (class '{}')",
                            level, class.name
                        ),
                    )
                })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_duplicates<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {kind} ID: {id}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EducationLevel, LevelTimetable, SchoolClass, Subject, Teacher};

    fn sample_data() -> SchoolData {
        SchoolData::new(
            vec![Teacher::new("T1", "Ayse").with_competency("Math", EducationLevel::Primary)],
            vec![SchoolClass::new("C1", "5A", EducationLevel::Primary).with_homeroom_teacher("T1")],
            vec![Subject::new("S1", "Math", "Math", EducationLevel::Primary, 4)],
        )
    }

    #[test]
    fn test_valid_input() {
        let data = sample_data();
        assert!(validate_input(&data, &Selection::all(&data)).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let data = SchoolData::new(
            vec![Teacher::new("T1", "Ayse"), Teacher::new("T1", "Other")],
            vec![],
            vec![],
        );
        let errs = validate_input(&data, &Selection::new()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValidationErrorKind::DuplicateId);
        assert!(errs[0].message.contains("teacher"));
    }

    #[test]
    fn test_unknown_selection() {
        let data = sample_data();
        let sel = Selection::new()
            .with_classes(["C9"])
            .with_subjects(["S9"])
            .with_teachers(["T9"]);
        let errs = validate_input(&data, &sel).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert!(errs
            .iter()
            .all(|e| e.kind == ValidationErrorKind::UnknownReference));
    }

    #[test]
    fn test_unknown_linked_teacher() {
        let data = SchoolData::new(
            vec![],
            vec![SchoolClass::new("C1", "5A", EducationLevel::Primary)
                .with_homeroom_teacher("T1")
                .with_co_teacher("T2")],
            vec![],
        );
        let errs = validate_input(&data, &Selection::new()).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs[0].message.contains("5A"));
    }

    #[test]
    fn test_missing_levels() {
        let mut class = SchoolClass::new("C1", "5A", EducationLevel::Primary);
        class.levels.clear();
        let mut subject = Subject::new("S1", "Math", "Math", EducationLevel::Primary, 4);
        subject.levels.clear();
        let data = SchoolData::new(vec![], vec![class], vec![subject]);
        let errs = validate_input(&data, &Selection::new()).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs
            .iter()
            .all(|e| e.kind == ValidationErrorKind::MissingLevel));
    }

    #[test]
    fn test_empty_hours() {
        let data = SchoolData::new(
            vec![],
            vec![],
            vec![Subject::new("S1", "Clubs", "Clubs", EducationLevel::Primary, 0)],
        );
        let sel = Selection::new().with_subjects(["S1"]);
        let errs = validate_input(&data, &sel).unwrap_err();
        assert_eq!(errs[0].kind, ValidationErrorKind::EmptyHours);

        // An override fixes it
        let sel = sel.with_hours("S1", 2);
        assert!(validate_input(&data, &sel).is_ok());
    }

    #[test]
    fn test_missing_timetable() {
        let data = sample_data();
        let sel = Selection::all(&data);
        let model = TimeModel::empty().with_level(LevelTimetable::standard_middle());
        let errs = validate_timetables(&data, &sel, &model).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValidationErrorKind::MissingTimetable);
        assert!(errs[0].to_string().contains("5A"));

        assert!(validate_timetables(&data, &sel, &TimeModel::standard()).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let data = SchoolData::new(
            vec![Teacher::new("T1", "Ayse"), Teacher::new("T1", "Ayse")],
            vec![SchoolClass::new("C1", "5A", EducationLevel::Primary).with_homeroom_teacher("T7")],
            vec![],
        );
        let sel = Selection::new().with_subjects(["S1"]);
        let errs = validate_input(&data, &sel).unwrap_err();
        assert_eq!(errs.len(), 3);
    }
}

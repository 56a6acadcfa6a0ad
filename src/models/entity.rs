//! School entities: teachers, classes and subjects.
//!
//! These are plain data consumed by the mapping builder and the scheduler.
//! Creating, editing and storing them is the caller's business.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Education level of a class, subject or teacher competency.
///
/// The ordering (kindergarten < primary < middle) is used to pick a
/// teacher's home level when seeding fixed periods into their grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    /// Pre-school.
    Kindergarten,
    /// Primary school.
    Primary,
    /// Middle school.
    Middle,
}

impl std::fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Kindergarten => "kindergarten",
            Self::Primary => "primary",
            Self::Middle => "middle",
        };
        f.write_str(s)
    }
}

/// A (branch, level) pair a teacher is qualified to teach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Competency {
    /// Subject branch (e.g. "Math", "Music").
    pub branch: String,
    /// Level the branch may be taught at.
    pub level: EducationLevel,
}

impl Competency {
    /// Creates a competency.
    pub fn new(branch: impl Into<String>, level: EducationLevel) -> Self {
        Self {
            branch: branch.into(),
            level,
        }
    }
}

/// A teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Branches and levels this teacher can teach.
    pub competencies: BTreeSet<Competency>,
}

impl Teacher {
    /// Creates a teacher with no competencies.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            competencies: BTreeSet::new(),
        }
    }

    /// Adds a competency.
    pub fn with_competency(mut self, branch: impl Into<String>, level: EducationLevel) -> Self {
        self.competencies.insert(Competency::new(branch, level));
        self
    }

    /// Whether this teacher can teach `subject` (branch matches and at
    /// least one of the subject's levels is covered).
    pub fn can_teach(&self, subject: &Subject) -> bool {
        self.competencies
            .iter()
            .any(|c| c.branch == subject.branch && subject.levels.contains(&c.level))
    }

    /// Lowest level among the competencies. `None` for a teacher with none.
    pub fn home_level(&self) -> Option<EducationLevel> {
        self.competencies.iter().map(|c| c.level).min()
    }
}

/// A class (group of pupils).
///
/// Named `SchoolClass` since `Class` reads poorly next to Rust keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolClass {
    /// Unique class identifier.
    pub id: String,
    /// Display name (e.g. "5A").
    pub name: String,
    /// Education levels of the class. Usually exactly one.
    pub levels: BTreeSet<EducationLevel>,
    /// Homeroom teacher, if any.
    pub homeroom_teacher_id: Option<String>,
    /// Additional teachers linked to the class.
    pub co_teacher_ids: Vec<String>,
}

impl SchoolClass {
    /// Creates a class at a single level.
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: EducationLevel) -> Self {
        let mut levels = BTreeSet::new();
        levels.insert(level);
        Self {
            id: id.into(),
            name: name.into(),
            levels,
            homeroom_teacher_id: None,
            co_teacher_ids: Vec::new(),
        }
    }

    /// Adds another level.
    pub fn with_level(mut self, level: EducationLevel) -> Self {
        self.levels.insert(level);
        self
    }

    /// Sets the homeroom teacher.
    pub fn with_homeroom_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.homeroom_teacher_id = Some(teacher_id.into());
        self
    }

    /// Links a co-teacher.
    pub fn with_co_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.co_teacher_ids.push(teacher_id.into());
        self
    }

    /// Whether `teacher_id` is the homeroom teacher or a co-teacher.
    pub fn is_linked_teacher(&self, teacher_id: &str) -> bool {
        self.homeroom_teacher_id.as_deref() == Some(teacher_id)
            || self.co_teacher_ids.iter().any(|t| t == teacher_id)
    }
}

/// A subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Branch a teacher must hold to teach it.
    pub branch: String,
    /// Levels the subject applies to.
    pub levels: BTreeSet<EducationLevel>,
    /// Default weekly hour count.
    pub weekly_hours: u32,
}

impl Subject {
    /// Creates a subject at a single level.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        branch: impl Into<String>,
        level: EducationLevel,
        weekly_hours: u32,
    ) -> Self {
        let mut levels = BTreeSet::new();
        levels.insert(level);
        Self {
            id: id.into(),
            name: name.into(),
            branch: branch.into(),
            levels,
            weekly_hours,
        }
    }

    /// Adds another applicable level.
    pub fn with_level(mut self, level: EducationLevel) -> Self {
        self.levels.insert(level);
        self
    }

    /// Whether the subject applies to any of the class's levels.
    pub fn applies_to(&self, class: &SchoolClass) -> bool {
        self.levels.iter().any(|l| class.levels.contains(l))
    }
}

/// Kind of entity a time constraint or conflict refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A teacher.
    Teacher,
    /// A class.
    Class,
}

/// Borrowed reference to a teacher or a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef<'a> {
    /// Teacher by id.
    Teacher(&'a str),
    /// Class by id.
    Class(&'a str),
}

impl<'a> EntityRef<'a> {
    /// Entity kind.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Teacher(_) => EntityKind::Teacher,
            Self::Class(_) => EntityKind::Class,
        }
    }

    /// Entity id.
    pub fn id(&self) -> &'a str {
        match self {
            Self::Teacher(id) | Self::Class(id) => id,
        }
    }
}

/// Immutable snapshot of all entities, indexed by id.
///
/// Used for structural checks and for putting names into user-facing
/// messages.
#[derive(Debug, Clone, Default)]
pub struct SchoolData {
    teachers: Vec<Teacher>,
    classes: Vec<SchoolClass>,
    subjects: Vec<Subject>,
    teacher_index: HashMap<String, usize>,
    class_index: HashMap<String, usize>,
    subject_index: HashMap<String, usize>,
}

impl SchoolData {
    /// Builds the directory. On duplicate ids the first entity wins for
    /// lookups; `validation::validate_input` reports the duplicate.
    pub fn new(teachers: Vec<Teacher>, classes: Vec<SchoolClass>, subjects: Vec<Subject>) -> Self {
        fn index<T>(items: &[T], id: impl Fn(&T) -> &str) -> HashMap<String, usize> {
            let mut map = HashMap::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                map.entry(id(item).to_string()).or_insert(i);
            }
            map
        }
        let teacher_index = index(&teachers, |t| t.id.as_str());
        let class_index = index(&classes, |c| c.id.as_str());
        let subject_index = index(&subjects, |s| s.id.as_str());
        Self {
            teachers,
            classes,
            subjects,
            teacher_index,
            class_index,
            subject_index,
        }
    }

    /// All teachers in input order.
    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    /// All classes in input order.
    pub fn classes(&self) -> &[SchoolClass] {
        &self.classes
    }

    /// All subjects in input order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Looks up a teacher.
    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teacher_index.get(id).map(|&i| &self.teachers[i])
    }

    /// Looks up a class.
    pub fn class(&self, id: &str) -> Option<&SchoolClass> {
        self.class_index.get(id).map(|&i| &self.classes[i])
    }

    /// Looks up a subject.
    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subject_index.get(id).map(|&i| &self.subjects[i])
    }

    /// Teacher name, falling back to the id for unknown teachers.
    pub fn teacher_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.teacher(id).map(|t| t.name.as_str()).unwrap_or(id)
    }

    /// Class name, falling back to the id.
    pub fn class_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.class(id).map(|c| c.name.as_str()).unwrap_or(id)
    }

    /// Subject name, falling back to the id.
    pub fn subject_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.subject(id).map(|s| s.name.as_str()).unwrap_or(id)
    }

    /// Display name of a teacher or class.
    pub fn entity_name<'a>(&'a self, entity: EntityRef<'a>) -> &'a str {
        match entity {
            EntityRef::Teacher(id) => self.teacher_name(id),
            EntityRef::Class(id) => self.class_name(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_can_teach() {
        let t = Teacher::new("T1", "Ayse").with_competency("Math", EducationLevel::Primary);
        let math = Subject::new("S1", "Math", "Math", EducationLevel::Primary, 4);
        let math_mid = Subject::new("S2", "Math", "Math", EducationLevel::Middle, 4);
        let music = Subject::new("S3", "Music", "Music", EducationLevel::Primary, 2);

        assert!(t.can_teach(&math));
        assert!(!t.can_teach(&math_mid));
        assert!(!t.can_teach(&music));
    }

    #[test]
    fn test_home_level() {
        let t = Teacher::new("T1", "Ayse")
            .with_competency("Math", EducationLevel::Middle)
            .with_competency("Math", EducationLevel::Primary);
        assert_eq!(t.home_level(), Some(EducationLevel::Primary));
        assert_eq!(Teacher::new("T2", "x").home_level(), None);
    }

    #[test]
    fn test_subject_applies_to_class() {
        let class = SchoolClass::new("C1", "5A", EducationLevel::Primary)
            .with_level(EducationLevel::Middle);
        let s = Subject::new("S1", "Science", "Science", EducationLevel::Middle, 3);
        let k = Subject::new("S2", "Play", "Play", EducationLevel::Kindergarten, 3);
        assert!(s.applies_to(&class));
        assert!(!k.applies_to(&class));
    }

    #[test]
    fn test_linked_teacher() {
        let class = SchoolClass::new("C1", "5A", EducationLevel::Primary)
            .with_homeroom_teacher("T1")
            .with_co_teacher("T2");
        assert!(class.is_linked_teacher("T1"));
        assert!(class.is_linked_teacher("T2"));
        assert!(!class.is_linked_teacher("T3"));
    }

    #[test]
    fn test_directory_lookup_and_names() {
        let data = SchoolData::new(
            vec![Teacher::new("T1", "Ayse")],
            vec![SchoolClass::new("C1", "5A", EducationLevel::Primary)],
            vec![Subject::new("S1", "Math", "Math", EducationLevel::Primary, 4)],
        );
        assert_eq!(data.teacher_name("T1"), "Ayse");
        assert_eq!(data.class_name("C1"), "5A");
        assert_eq!(data.subject_name("S1"), "Math");
        assert_eq!(data.teacher_name("T9"), "T9");
        assert_eq!(data.entity_name(EntityRef::Class("C1")), "5A");
        assert!(data.class("C9").is_none());
    }

    #[test]
    fn test_entity_ref() {
        let e = EntityRef::Teacher("T1");
        assert_eq!(e.kind(), EntityKind::Teacher);
        assert_eq!(e.id(), "T1");
    }
}

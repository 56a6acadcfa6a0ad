//! Lesson demand model.
//!
//! A demand is the weekly hour quota of one (class, subject, teacher)
//! triple. Demands are rebuilt for every run by the mapping builder and
//! are never stored on their own.

use serde::{Deserialize, Serialize};

use crate::error::DemandError;

/// Placement priority. Higher priorities are placed first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Identity of a demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DemandKey {
    pub class_id: String,
    pub subject_id: String,
    pub teacher_id: String,
}

/// Weekly hour quota for one (class, subject, teacher) triple.
///
/// # Invariant
/// `assigned_hours <= weekly_hours_required`. Only [`LessonDemand::assign_hour`]
/// mutates `assigned_hours`, and it refuses to exceed the quota.
/// Deserialization rejects records that break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DemandRepr")]
pub struct LessonDemand {
    pub key: DemandKey,
    pub weekly_hours_required: u32,
    assigned_hours: u32,
    pub priority: Priority,
}

/// Unchecked wire form of [`LessonDemand`].
#[derive(Deserialize)]
struct DemandRepr {
    key: DemandKey,
    weekly_hours_required: u32,
    #[serde(default)]
    assigned_hours: u32,
    #[serde(default)]
    priority: Priority,
}

impl TryFrom<DemandRepr> for LessonDemand {
    type Error = DemandError;

    fn try_from(repr: DemandRepr) -> Result<Self, Self::Error> {
        if repr.assigned_hours > repr.weekly_hours_required {
            return Err(DemandError {
                class_id: repr.key.class_id,
                subject_id: repr.key.subject_id,
                assigned_hours: repr.assigned_hours,
                weekly_hours_required: repr.weekly_hours_required,
            });
        }
        Ok(Self {
            key: repr.key,
            weekly_hours_required: repr.weekly_hours_required,
            assigned_hours: repr.assigned_hours,
            priority: repr.priority,
        })
    }
}

impl LessonDemand {
    /// Creates a demand with nothing assigned yet.
    pub fn new(
        class_id: impl Into<String>,
        subject_id: impl Into<String>,
        teacher_id: impl Into<String>,
        weekly_hours_required: u32,
    ) -> Self {
        Self {
            key: DemandKey {
                class_id: class_id.into(),
                subject_id: subject_id.into(),
                teacher_id: teacher_id.into(),
            },
            weekly_hours_required,
            assigned_hours: 0,
            priority: Priority::Medium,
        }
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[inline]
    pub fn class_id(&self) -> &str {
        &self.key.class_id
    }

    #[inline]
    pub fn subject_id(&self) -> &str {
        &self.key.subject_id
    }

    #[inline]
    pub fn teacher_id(&self) -> &str {
        &self.key.teacher_id
    }

    /// Hours placed so far.
    #[inline]
    pub fn assigned_hours(&self) -> u32 {
        self.assigned_hours
    }

    /// Hours still to place.
    #[inline]
    pub fn remaining_hours(&self) -> u32 {
        self.weekly_hours_required.saturating_sub(self.assigned_hours)
    }

    /// Whether the quota is met.
    #[inline]
    pub fn is_satisfied(&self) -> bool {
        self.assigned_hours >= self.weekly_hours_required
    }

    /// Records one placed hour. Returns `false` (and changes nothing) when
    /// the quota is already met.
    pub fn assign_hour(&mut self) -> bool {
        if self.is_satisfied() {
            return false;
        }
        self.assigned_hours += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_assign_hour_respects_quota() {
        let mut d = LessonDemand::new("C1", "S1", "T1", 2);
        assert_eq!(d.remaining_hours(), 2);
        assert!(d.assign_hour());
        assert!(d.assign_hour());
        assert!(d.is_satisfied());
        assert!(!d.assign_hour());
        assert_eq!(d.assigned_hours(), 2);
        assert_eq!(d.remaining_hours(), 0);
    }

    #[test]
    fn test_zero_hour_demand_is_satisfied() {
        let mut d = LessonDemand::new("C1", "S1", "T1", 0);
        assert!(d.is_satisfied());
        assert!(!d.assign_hour());
    }

    #[test]
    fn test_deserialize_checks_quota() {
        let json = r#"{
            "key": {"class_id": "C1", "subject_id": "S1", "teacher_id": "T1"},
            "weekly_hours_required": 2,
            "assigned_hours": 5
        }"#;
        let err = serde_json::from_str::<LessonDemand>(json).unwrap_err();
        assert!(err.to_string().contains("5 of 2 hours"));

        let json = r#"{
            "key": {"class_id": "C1", "subject_id": "S1", "teacher_id": "T1"},
            "weekly_hours_required": 2
        }"#;
        let d: LessonDemand = serde_json::from_str(json).unwrap();
        assert_eq!(d.assigned_hours(), 0);
        assert_eq!(d.remaining_hours(), 2);
        assert_eq!(d.priority, Priority::Medium);
    }

    #[test]
    fn test_serde_keeps_progress() {
        let mut d = LessonDemand::new("C1", "S1", "T1", 3).with_priority(Priority::Low);
        d.assign_hour();
        let json = serde_json::to_string(&d).unwrap();
        let back: LessonDemand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_accessors() {
        let d = LessonDemand::new("C1", "S1", "T1", 3).with_priority(Priority::High);
        assert_eq!(d.class_id(), "C1");
        assert_eq!(d.subject_id(), "S1");
        assert_eq!(d.teacher_id(), "T1");
        assert_eq!(d.priority, Priority::High);
    }
}

//! Persistence seam for generated grids.
//!
//! The scheduler never writes anywhere. After a run finishes, [`commit`]
//! hands every touched teacher's grid to a [`ScheduleStore`], deleting the
//! teacher's old entries before inserting the new ones, so a teacher is
//! never left with a mix of old and new lessons.

use std::collections::BTreeMap;
use std::convert::Infallible;

use tracing::info;

use crate::error::CommitError;
use crate::models::{ScheduleResult, TeacherGrid};

/// Backend holding one grid per teacher.
pub trait ScheduleStore {
    /// Backend failure.
    type Error: std::error::Error + 'static;

    /// Removes every entry of a teacher. Unknown teachers are not an error.
    fn delete_teacher_entries(&mut self, teacher_id: &str) -> Result<(), Self::Error>;

    /// Stores a teacher's grid.
    fn insert_teacher_entries(&mut self, grid: &TeacherGrid) -> Result<(), Self::Error>;

    /// Loads a teacher's grid.
    fn teacher_grid(&self, teacher_id: &str) -> Result<Option<TeacherGrid>, Self::Error>;
}

/// Writes a finished run to `store`, teacher by teacher in id order.
///
/// Returns the number of teachers written.
///
/// # Errors
///
/// [`CommitError::FailedRun`] if the run failed structurally (nothing is
/// written), or [`CommitError::Store`] naming the teacher whose write
/// failed. Teachers before it are already committed.
pub fn commit<S: ScheduleStore>(
    result: &ScheduleResult,
    store: &mut S,
) -> Result<usize, CommitError<S::Error>> {
    if !result.success {
        return Err(CommitError::FailedRun);
    }

    for (teacher_id, grid) in &result.grids {
        let wrap = |source| CommitError::Store {
            teacher_id: teacher_id.clone(),
            source,
        };
        store.delete_teacher_entries(teacher_id).map_err(wrap)?;
        store.insert_teacher_entries(grid).map_err(wrap)?;
        info!(
            event = "commit",
            teacher = %teacher_id,
            lessons = grid.lesson_count(),
        );
    }
    Ok(result.grids.len())
}

/// In-process store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    grids: BTreeMap<String, TeacherGrid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored grids in teacher id order.
    pub fn grids(&self) -> impl Iterator<Item = &TeacherGrid> {
        self.grids.values()
    }

    /// Clones every stored grid, e.g. to seed the next run's existing grids.
    pub fn snapshot(&self) -> Vec<TeacherGrid> {
        self.grids.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl ScheduleStore for MemoryStore {
    type Error = Infallible;

    fn delete_teacher_entries(&mut self, teacher_id: &str) -> Result<(), Self::Error> {
        self.grids.remove(teacher_id);
        Ok(())
    }

    fn insert_teacher_entries(&mut self, grid: &TeacherGrid) -> Result<(), Self::Error> {
        self.grids.insert(grid.teacher_id.clone(), grid.clone());
        Ok(())
    }

    fn teacher_grid(&self, teacher_id: &str) -> Result<Option<TeacherGrid>, Self::Error> {
        Ok(self.grids.get(teacher_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralError;
    use crate::models::{Day, Lesson, Slot};
    use thiserror::Error;

    fn result_with(teachers: &[(&str, u8)]) -> ScheduleResult {
        let mut grids = BTreeMap::new();
        for &(id, period) in teachers {
            let mut g = TeacherGrid::new(id);
            g.place(Slot::new(Day::Monday, period), Lesson::new("S1", "C1"))
                .unwrap();
            grids.insert(id.to_string(), g);
        }
        ScheduleResult {
            success: true,
            grids,
            ..ScheduleResult::default()
        }
    }

    #[test]
    fn test_commit_replaces_touched_teachers() {
        let mut store = MemoryStore::new();
        commit(&result_with(&[("T1", 1), ("T2", 2)]), &mut store).unwrap();
        assert_eq!(store.len(), 2);

        let written = commit(&result_with(&[("T1", 3)]), &mut store).unwrap();
        assert_eq!(written, 1);

        let t1 = store.teacher_grid("T1").unwrap().unwrap();
        assert_eq!(t1.lesson_count(), 1);
        assert!(t1.lesson_at(Slot::new(Day::Monday, 3)).is_some());
        assert!(t1.lesson_at(Slot::new(Day::Monday, 1)).is_none());
        // Untouched teacher keeps its grid
        assert!(store.teacher_grid("T2").unwrap().is_some());
    }

    #[test]
    fn test_failed_run_not_committed() {
        let mut store = MemoryStore::new();
        let failed = ScheduleResult::failed(StructuralError::EmptyDemandList);
        assert!(matches!(
            commit(&failed, &mut store),
            Err(CommitError::FailedRun)
        ));
        assert!(store.is_empty());
    }

    #[derive(Debug, Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_on: &'static str,
    }

    impl ScheduleStore for FailingStore {
        type Error = DiskFull;

        fn delete_teacher_entries(&mut self, teacher_id: &str) -> Result<(), DiskFull> {
            self.inner
                .delete_teacher_entries(teacher_id)
                .map_err(|e| match e {})
        }

        fn insert_teacher_entries(&mut self, grid: &TeacherGrid) -> Result<(), DiskFull> {
            if grid.teacher_id == self.fail_on {
                return Err(DiskFull);
            }
            self.inner
                .insert_teacher_entries(grid)
                .map_err(|e| match e {})
        }

        fn teacher_grid(&self, teacher_id: &str) -> Result<Option<TeacherGrid>, DiskFull> {
            self.inner.teacher_grid(teacher_id).map_err(|e| match e {})
        }
    }

    #[test]
    fn test_store_error_names_teacher() {
        let mut store = FailingStore {
            fail_on: "T2",
            ..FailingStore::default()
        };
        let err = commit(&result_with(&[("T1", 1), ("T2", 2)]), &mut store).unwrap_err();
        match &err {
            CommitError::Store { teacher_id, .. } => assert_eq!(teacher_id, "T2"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("disk full"));
        // T1 went through before the failure
        assert!(store.inner.teacher_grid("T1").unwrap().is_some());
        assert!(store.inner.teacher_grid("T2").unwrap().is_none());
    }

    #[test]
    fn test_snapshot_feeds_next_run() {
        let mut store = MemoryStore::new();
        commit(&result_with(&[("T1", 1)]), &mut store).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].teacher_id, "T1");
        assert_eq!(store.grids().count(), 1);
    }
}

//! Greedy lesson scheduler.
//!
//! # Algorithm
//!
//! 1. Order demands (priority, then most hours; see [`DemandOrdering`]).
//! 2. For each demand, while hours remain:
//!    - candidates are the class's teaching slots, in (day, period) order;
//!    - drop slots where the teacher or class is unavailable;
//!    - drop slots that breach a daily cap or the same-subject run limit;
//!    - drop slots the conflict checker rejects (teacher mode);
//!    - score the rest and take the lowest, earliest slot.
//! 3. A demand with no surviving candidate records its missing hours and
//!    the loop moves on. Placed hours are never undone.
//!
//! # Complexity
//! O(h * s) where h = demand hours and s = teaching slots per week.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::kpi::compute_statistics;
use super::ordering::DemandOrdering;
use super::scoring::{ScoreWeights, SlotFacts};
use crate::config::{OptimizationLevel, SchedulerConfig};
use crate::conflict::{CheckMode, ConflictChecker, OccupancyView, Occupant, Placement};
use crate::error::{GridError, StructuralError};
use crate::models::{
    week_slots, ConstraintStore, EntityRef, Lesson, LessonDemand, ScheduleEntry, ScheduleResult,
    SchoolData, Slot, TeacherGrid, TimeConstraint, TimeModel, UnassignedLesson,
};

/// Everything a generation run reads.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Entity snapshot.
    pub data: SchoolData,
    /// Demands to place, usually from the mapping builder.
    pub demands: Vec<LessonDemand>,
    /// Availability records.
    pub constraints: Vec<TimeConstraint>,
    pub config: SchedulerConfig,
    /// Day layouts. The config's lunch rule is applied on top.
    pub time_model: TimeModel,
    /// Previously stored grids. Grids of teachers this run touches are
    /// replaced; the rest constrain class occupancy.
    pub existing_grids: Vec<TeacherGrid>,
}

impl GenerationRequest {
    /// Creates a request with default config and the standard time model.
    pub fn new(data: SchoolData, demands: Vec<LessonDemand>) -> Self {
        Self {
            data,
            demands,
            constraints: Vec::new(),
            config: SchedulerConfig::default(),
            time_model: TimeModel::standard(),
            existing_grids: Vec::new(),
        }
    }

    /// Sets availability records.
    pub fn with_constraints(mut self, constraints: Vec<TimeConstraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the time model.
    pub fn with_time_model(mut self, time_model: TimeModel) -> Self {
        self.time_model = time_model;
        self
    }

    /// Sets previously stored grids.
    pub fn with_existing_grids(mut self, grids: Vec<TeacherGrid>) -> Self {
        self.existing_grids = grids;
        self
    }
}

/// Priority-driven greedy lesson scheduler.
///
/// Deterministic: identical requests produce identical results.
///
/// # Example
///
/// ```
/// use timetable_core::models::{
///     EducationLevel, LessonDemand, SchoolClass, SchoolData, Subject, Teacher,
/// };
/// use timetable_core::scheduler::{GenerationRequest, GreedyScheduler};
///
/// let data = SchoolData::new(
///     vec![Teacher::new("T1", "Ayse").with_competency("Math", EducationLevel::Primary)],
///     vec![SchoolClass::new("C1", "5A", EducationLevel::Primary)],
///     vec![Subject::new("S1", "Math", "Math", EducationLevel::Primary, 4)],
/// );
/// let request = GenerationRequest::new(data, vec![LessonDemand::new("C1", "S1", "T1", 4)]);
///
/// let result = GreedyScheduler::new().generate(&request);
/// assert!(result.is_complete());
/// assert_eq!(result.statistics.filled_slots, 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyScheduler {
    ordering: DemandOrdering,
    weights: ScoreWeights,
}

impl GreedyScheduler {
    /// Creates a scheduler with the standard ordering and weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the demand ordering.
    pub fn with_ordering(mut self, ordering: DemandOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Sets the scoring weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Runs the scheduler. Structural errors yield a failed result with no
    /// grids.
    pub fn generate(&self, request: &GenerationRequest) -> ScheduleResult {
        self.run(request, None).unwrap_or_else(ScheduleResult::failed)
    }

    /// Runs the scheduler, checking `cancel` between demands.
    ///
    /// A cancelled run keeps what was placed and reports every demand it
    /// did not get to as unassigned.
    pub fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &AtomicBool,
    ) -> ScheduleResult {
        self.run(request, Some(cancel)).unwrap_or_else(ScheduleResult::failed)
    }

    /// Runs the scheduler, returning structural errors as `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError`] for an empty demand list, a demand naming
    /// an unknown teacher, class or subject, a class whose level has no
    /// timetable, or a demand that already has hours assigned.
    pub fn try_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<ScheduleResult, StructuralError> {
        self.run(request, None)
    }

    fn run(
        &self,
        request: &GenerationRequest,
        cancel: Option<&AtomicBool>,
    ) -> Result<ScheduleResult, StructuralError> {
        let started = Instant::now();
        let prepared = prepare(request).inspect_err(|e| {
            warn!(event = "generation_failed", error = %e);
        })?;

        info!(
            event = "generation_start",
            demands = request.demands.len(),
            teachers = prepared.touched.len(),
            algorithm = ?request.config.algorithm,
            optimization = ?request.config.optimization,
        );

        let ctx = RunContext {
            config: &request.config,
            weights: self.weights,
            store: ConstraintStore::from_constraints(&request.constraints),
            checker: ConflictChecker::new(&request.data),
        };
        let mut arena = RunArena::new(request, &prepared);
        let mut demands = request.demands.clone();
        let mut rejections: HashSet<(usize, Slot)> = HashSet::new();
        let mut unassigned = Vec::new();
        let mut processed = Vec::with_capacity(demands.len());
        let mut cancelled = false;

        for idx in self.ordering.sort_indices(&request.demands) {
            if !cancelled && cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                cancelled = true;
                info!(event = "generation_cancelled", placed_demands = processed.len());
            }

            let input = &request.demands[idx];
            let demand = &mut demands[idx];
            if !cancelled {
                let target = Target {
                    index: idx,
                    teacher_id: input.teacher_id(),
                    class_id: input.class_id(),
                    subject_id: input.subject_id(),
                    periods: prepared
                        .class_periods
                        .get(input.class_id())
                        .map(Vec::as_slice)
                        .unwrap_or(&[]),
                };
                while !demand.is_satisfied() {
                    let Some(slot) = ctx.pick_slot(&arena, &target, &mut rejections) else {
                        break;
                    };
                    if let Err(e) = arena.place(&target, slot) {
                        warn!(event = "placement_rejected", error = %e);
                        break;
                    }
                    demand.assign_hour();
                }
                debug!(
                    event = "demand_done",
                    class = input.class_id(),
                    subject = input.subject_id(),
                    teacher = input.teacher_id(),
                    assigned = demand.assigned_hours(),
                    required = demand.weekly_hours_required,
                );
            }

            if demand.remaining_hours() > 0 {
                let lesson = unassigned_lesson(&request.data, demand);
                if !cancelled {
                    warn!(
                        event = "placement_shortfall",
                        class = %lesson.class_name,
                        subject = %lesson.subject_name,
                        teacher = %lesson.teacher_name,
                        missing_hours = lesson.missing_hours,
                    );
                }
                unassigned.push(lesson);
            }
            processed.push(demand.clone());
        }

        let grids = arena.into_grids();
        let statistics = compute_statistics(&grids, rejections.len(), unassigned);

        info!(
            event = "generation_end",
            placed_hours = statistics.filled_slots,
            unassigned_hours = statistics.unassigned_hours(),
            conflict_count = statistics.conflict_count,
            cancelled,
            duration_ms = started.elapsed().as_millis() as u64,
        );

        Ok(ScheduleResult {
            success: true,
            cancelled,
            grids,
            demands: processed,
            statistics,
            errors: Vec::new(),
        })
    }
}

/// Validated run input.
struct Prepared<'r> {
    model: TimeModel,
    /// Sorted teaching periods per class id.
    class_periods: HashMap<&'r str, Vec<u8>>,
    /// Teachers named by at least one demand.
    touched: BTreeSet<&'r str>,
}

fn prepare(request: &GenerationRequest) -> Result<Prepared<'_>, StructuralError> {
    if request.demands.is_empty() {
        return Err(StructuralError::EmptyDemandList);
    }

    let rules = &request.config.rules;
    let model = request
        .time_model
        .clone()
        .with_lunch_rule(rules.lunch_break_required, rules.lunch_break_duration);

    let data = &request.data;
    let mut class_periods = HashMap::new();
    let mut touched = BTreeSet::new();

    for demand in &request.demands {
        if demand.assigned_hours() > 0 {
            return Err(StructuralError::InvalidInput {
                message: format!(
                    "demand for class '{}' / subject '{}' already has {} hour(s) assigned",
                    demand.class_id(),
                    demand.subject_id(),
                    demand.assigned_hours()
                ),
            });
        }
        let teacher = data
            .teacher(demand.teacher_id())
            .ok_or_else(|| StructuralError::UnknownTeacher {
                teacher_id: demand.teacher_id().to_string(),
                class_id: demand.class_id().to_string(),
            })?;
        let class = data
            .class(demand.class_id())
            .ok_or_else(|| StructuralError::UnknownClass {
                class_id: demand.class_id().to_string(),
                subject_id: demand.subject_id().to_string(),
            })?;
        if data.subject(demand.subject_id()).is_none() {
            return Err(StructuralError::UnknownSubject {
                subject_id: demand.subject_id().to_string(),
                class_id: demand.class_id().to_string(),
            });
        }

        touched.insert(teacher.id.as_str());
        if !class_periods.contains_key(class.id.as_str()) {
            let mut periods = model.teaching_periods_for(&class.levels).map_err(|level| {
                StructuralError::MissingTimetable {
                    class_name: class.name.clone(),
                    level,
                }
            })?;
            periods.sort_unstable();
            periods.dedup();
            class_periods.insert(class.id.as_str(), periods);
        }
    }

    Ok(Prepared {
        model,
        class_periods,
        touched,
    })
}

/// The demand currently being placed.
struct Target<'r> {
    index: usize,
    teacher_id: &'r str,
    class_id: &'r str,
    subject_id: &'r str,
    /// Sorted teaching periods of the class.
    periods: &'r [u8],
}

impl Target<'_> {
    fn placement(&self, slot: Slot) -> Placement<'_> {
        Placement {
            teacher_id: self.teacher_id,
            class_id: self.class_id,
            subject_id: self.subject_id,
            slot,
        }
    }

    /// Adjacent teaching periods of the class, before and after `period`.
    fn neighbours(&self, period: u8) -> [Option<u8>; 2] {
        let before = period
            .checked_sub(1)
            .filter(|p| self.periods.contains(p));
        let after = period
            .checked_add(1)
            .filter(|p| self.periods.contains(p));
        [before, after]
    }
}

#[derive(Debug, Clone)]
struct ClassCell {
    teacher_id: String,
    subject_id: String,
    external: bool,
}

/// Working state of one run.
///
/// Teacher grids are the only authority; the class index is a projection
/// kept in step with them (plus lessons from untouched stored grids).
struct RunArena<'r> {
    grids: BTreeMap<String, TeacherGrid>,
    external: HashMap<&'r str, &'r TeacherGrid>,
    classes: HashMap<String, HashMap<Slot, ClassCell>>,
}

impl<'r> RunArena<'r> {
    fn new(request: &'r GenerationRequest, prepared: &Prepared<'r>) -> Self {
        let mut grids = BTreeMap::new();
        for &teacher_id in &prepared.touched {
            let layout = request
                .data
                .teacher(teacher_id)
                .and_then(|t| t.home_level())
                .and_then(|level| prepared.model.timetable(level));
            let grid = match layout {
                Some(layout) => TeacherGrid::with_layout(teacher_id, layout),
                None => TeacherGrid::new(teacher_id),
            };
            grids.insert(teacher_id.to_string(), grid);
        }

        let mut stored: Vec<&TeacherGrid> = request
            .existing_grids
            .iter()
            .filter(|g| !prepared.touched.contains(g.teacher_id.as_str()))
            .collect();
        stored.sort_by(|a, b| a.teacher_id.cmp(&b.teacher_id));

        let mut external = HashMap::new();
        let mut classes: HashMap<String, HashMap<Slot, ClassCell>> = HashMap::new();
        for grid in stored {
            external.entry(grid.teacher_id.as_str()).or_insert(grid);
            for (slot, lesson) in grid.lessons() {
                classes
                    .entry(lesson.class_id.clone())
                    .or_default()
                    .entry(slot)
                    .or_insert_with(|| ClassCell {
                        teacher_id: grid.teacher_id.clone(),
                        subject_id: lesson.subject_id.clone(),
                        external: true,
                    });
            }
        }

        Self {
            grids,
            external,
            classes,
        }
    }

    fn place(&mut self, target: &Target<'_>, slot: Slot) -> Result<(), GridError> {
        self.grids
            .entry(target.teacher_id.to_string())
            .or_insert_with(|| TeacherGrid::new(target.teacher_id))
            .place(slot, Lesson::new(target.subject_id, target.class_id))?;
        self.classes
            .entry(target.class_id.to_string())
            .or_default()
            .insert(
                slot,
                ClassCell {
                    teacher_id: target.teacher_id.to_string(),
                    subject_id: target.subject_id.to_string(),
                    external: false,
                },
            );
        Ok(())
    }

    fn teacher_daily(&self, teacher_id: &str, slot: Slot) -> u32 {
        self.grids
            .get(teacher_id)
            .map_or(0, |g| g.daily_count(slot.day) as u32)
    }

    fn class_daily(&self, class_id: &str, slot: Slot) -> u32 {
        self.classes.get(class_id).map_or(0, |cells| {
            cells.keys().filter(|s| s.day == slot.day).count() as u32
        })
    }

    fn class_cell(&self, class_id: &str, slot: Slot) -> Option<&ClassCell> {
        self.classes.get(class_id).and_then(|cells| cells.get(&slot))
    }

    fn has_subject(&self, target: &Target<'_>, slot: Slot) -> bool {
        self.class_cell(target.class_id, slot)
            .is_some_and(|c| c.subject_id == target.subject_id)
    }

    /// Length of the same (class, subject) run `slot` would be part of.
    fn subject_run(&self, target: &Target<'_>, slot: Slot) -> u32 {
        let mut run = 1;
        let mut period = slot.period;
        while let [Some(prev), _] = target.neighbours(period) {
            if !self.has_subject(target, Slot::new(slot.day, prev)) {
                break;
            }
            run += 1;
            period = prev;
        }
        period = slot.period;
        while let [_, Some(next)] = target.neighbours(period) {
            if !self.has_subject(target, Slot::new(slot.day, next)) {
                break;
            }
            run += 1;
            period = next;
        }
        run
    }

    fn next_to_class_lesson(&self, target: &Target<'_>, slot: Slot) -> bool {
        target
            .neighbours(slot.period)
            .into_iter()
            .flatten()
            .any(|p| self.class_cell(target.class_id, Slot::new(slot.day, p)).is_some())
    }

    fn same_subject_that_day(&self, target: &Target<'_>, slot: Slot) -> u32 {
        self.classes.get(target.class_id).map_or(0, |cells| {
            cells
                .iter()
                .filter(|(s, c)| s.day == slot.day && c.subject_id == target.subject_id)
                .count() as u32
        })
    }

    fn into_grids(self) -> BTreeMap<String, TeacherGrid> {
        self.grids
    }
}

impl OccupancyView for RunArena<'_> {
    fn teacher_entry(&self, teacher_id: &str, slot: Slot) -> Option<&ScheduleEntry> {
        match self.grids.get(teacher_id) {
            Some(grid) => grid.at(slot),
            None => self.external.get(teacher_id).and_then(|g| g.at(slot)),
        }
    }

    fn class_occupant(&self, class_id: &str, slot: Slot) -> Option<Occupant<'_>> {
        self.class_cell(class_id, slot).map(|c| Occupant {
            teacher_id: &c.teacher_id,
            subject_id: &c.subject_id,
            external: c.external,
        })
    }
}

/// Read-only collaborators of a run.
struct RunContext<'r> {
    config: &'r SchedulerConfig,
    weights: ScoreWeights,
    store: ConstraintStore,
    checker: ConflictChecker<'r>,
}

impl RunContext<'_> {
    /// Best slot for one more hour of `target`, if any survives the
    /// hard filters.
    fn pick_slot(
        &self,
        arena: &RunArena<'_>,
        target: &Target<'_>,
        rejections: &mut HashSet<(usize, Slot)>,
    ) -> Option<Slot> {
        let rules = &self.config.rules;
        let teacher = EntityRef::Teacher(target.teacher_id);
        let class = EntityRef::Class(target.class_id);
        let mut best: Option<(i32, u32, Slot)> = None;

        for slot in week_slots(target.periods) {
            if self.store.is_hard_blocked(teacher, slot) || self.store.is_hard_blocked(class, slot)
            {
                continue;
            }
            let teacher_load = arena.teacher_daily(target.teacher_id, slot);
            if teacher_load >= rules.max_daily_hours_teacher
                || arena.class_daily(target.class_id, slot) >= rules.max_daily_hours_class
            {
                continue;
            }
            if rules.avoid_consecutive_same_subject
                && arena.subject_run(target, slot) > rules.max_consecutive_hours
            {
                continue;
            }
            let check = self
                .checker
                .check(CheckMode::Teacher, target.placement(slot), arena);
            if check.has_conflict {
                if check.external {
                    rejections.insert((target.index, slot));
                }
                continue;
            }

            let facts = SlotFacts {
                restricted_penalty: self.store.soft_penalty(teacher, slot)
                    + self.store.soft_penalty(class, slot),
                period_index: target
                    .periods
                    .iter()
                    .position(|&p| p == slot.period)
                    .unwrap_or(0),
                period_count: target.periods.len(),
                adjacent_to_class_lesson: arena.next_to_class_lesson(target, slot),
                same_subject_that_day: arena.same_subject_that_day(target, slot),
            };
            let score = self.weights.score(&facts, rules, self.config.algorithm);

            let key = match self.config.optimization {
                OptimizationLevel::Fast if score <= 0 => return Some(slot),
                OptimizationLevel::Fast | OptimizationLevel::Balanced => (score, 0, slot),
                OptimizationLevel::Thorough => (score, teacher_load, slot),
            };
            if best.map_or(true, |b| key < b) {
                best = Some(key);
            }
        }

        best.map(|(_, _, slot)| slot)
    }
}

fn unassigned_lesson(data: &SchoolData, demand: &LessonDemand) -> UnassignedLesson {
    UnassignedLesson {
        class_id: demand.class_id().to_string(),
        class_name: data.class_name(demand.class_id()).to_string(),
        subject_id: demand.subject_id().to_string(),
        subject_name: data.subject_name(demand.subject_id()).to_string(),
        teacher_id: demand.teacher_id().to_string(),
        teacher_name: data.teacher_name(demand.teacher_id()).to_string(),
        missing_hours: demand.remaining_hours(),
    }
}

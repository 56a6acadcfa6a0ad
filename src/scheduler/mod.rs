//! Greedy lesson scheduling and KPI evaluation.
//!
//! # Algorithm
//!
//! `GreedyScheduler` places demands one hour at a time into the best
//! surviving slot, in [`DemandOrdering`] order, and never backtracks. It
//! is not optimal, but it is deterministic, bounded and explains every
//! shortfall.
//!
//! # KPI
//!
//! `ScheduleKpi` computes load indicators from a result: fill rate,
//! completion rate, weekly hours and peak daily load.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod greedy;
mod kpi;
mod ordering;
mod scoring;

pub use greedy::{GenerationRequest, GreedyScheduler};
pub use kpi::ScheduleKpi;
pub use ordering::{DemandOrdering, HighestPriority, MostHours, OrderingRule, RuleScore};
pub use scoring::{ScoreWeights, SlotFacts};

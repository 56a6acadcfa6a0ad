//! Demand ordering rules.
//!
//! Decides which demand the greedy loop places first. Rules are chained
//! sequentially: the next rule only breaks ties of the previous one, and
//! demands tied on every rule keep their input order (stable sort).
//!
//! # Score Convention
//! **Lower score = placed earlier.**
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::fmt::Debug;
use std::sync::Arc;

use crate::models::{LessonDemand, Priority};

/// Score returned by an ordering rule. Lower = placed earlier.
pub type RuleScore = f64;

/// A rule that ranks lesson demands.
pub trait OrderingRule: Send + Sync + Debug {
    /// Short rule name.
    fn name(&self) -> &'static str;

    /// Scores a demand; lower is placed earlier.
    fn evaluate(&self, demand: &LessonDemand) -> RuleScore;

    fn description(&self) -> &'static str {
        self.name()
    }
}

/// High priority first, then medium, then low.
#[derive(Debug, Clone, Copy)]
pub struct HighestPriority;

impl OrderingRule for HighestPriority {
    fn name(&self) -> &'static str {
        "PRIORITY"
    }

    fn evaluate(&self, demand: &LessonDemand) -> RuleScore {
        match demand.priority {
            Priority::High => 0.0,
            Priority::Medium => 1.0,
            Priority::Low => 2.0,
        }
    }

    fn description(&self) -> &'static str {
        "Highest priority first"
    }
}

/// Most required hours first (hardest to fit).
#[derive(Debug, Clone, Copy)]
pub struct MostHours;

impl OrderingRule for MostHours {
    fn name(&self) -> &'static str {
        "MWKR"
    }

    fn evaluate(&self, demand: &LessonDemand) -> RuleScore {
        -(demand.weekly_hours_required as f64)
    }

    fn description(&self) -> &'static str {
        "Most weekly hours first"
    }
}

/// Sequential chain of ordering rules.
///
/// # Example
/// ```
/// use timetable_core::models::{LessonDemand, Priority};
/// use timetable_core::scheduler::DemandOrdering;
///
/// let demands = vec![
///     LessonDemand::new("C1", "Art", "T1", 2),
///     LessonDemand::new("C1", "Math", "T2", 5),
///     LessonDemand::new("C2", "Music", "T3", 1).with_priority(Priority::High),
/// ];
/// let order = DemandOrdering::standard().sort_indices(&demands);
/// assert_eq!(order, vec![2, 1, 0]);
/// ```
#[derive(Clone)]
pub struct DemandOrdering {
    rules: Vec<Arc<dyn OrderingRule>>,
    epsilon: f64,
}

impl DemandOrdering {
    /// Creates an ordering with no rules (input order).
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Priority first, then most hours.
    pub fn standard() -> Self {
        Self::new().with_rule(HighestPriority).with_rule(MostHours)
    }

    /// Appends a rule. Later rules only break ties.
    pub fn with_rule<R: OrderingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Indices into `demands` in placement order.
    pub fn sort_indices(&self, demands: &[LessonDemand]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..demands.len()).collect();
        indices.sort_by(|&a, &b| self.compare(&demands[a], &demands[b]));
        indices
    }

    fn compare(&self, a: &LessonDemand, b: &LessonDemand) -> std::cmp::Ordering {
        for rule in &self.rules {
            let score_a = rule.evaluate(a);
            let score_b = rule.evaluate(b);
            if (score_a - score_b).abs() > self.epsilon {
                return score_a
                    .partial_cmp(&score_b)
                    .unwrap_or(std::cmp::Ordering::Equal);
            }
        }
        std::cmp::Ordering::Equal
    }
}

impl Default for DemandOrdering {
    fn default() -> Self {
        Self::standard()
    }
}

impl Debug for DemandOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemandOrdering")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

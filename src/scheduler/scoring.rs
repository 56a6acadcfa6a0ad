//! Slot scoring.
//!
//! Every candidate that survives the hard filters gets an integer score;
//! the lowest score wins. The score only sees [`SlotFacts`], so it can be
//! tested without a run in progress.
//!
//! | Factor | Condition | Default |
//! |--------|-----------|---------|
//! | Restricted | per restricted entity (teacher, class) | +10 |
//! | Morning | `prefer_morning_hours`, first half of the class day | -2 |
//! | Edges | `avoid_first_last_period`, first or last teaching period | +5 |
//! | Compact | algorithm `compact`, next to a lesson of the class that day | -3 |
//! | Spread | algorithm `distributed`, per same-subject hour already that day | +4 |

use serde::{Deserialize, Serialize};

use crate::config::{AlgorithmMode, RuleSet};

/// What the scorer needs to know about one candidate slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotFacts {
    /// Sum of the teacher's and class's soft penalties.
    pub restricted_penalty: i32,
    /// Position of the period in the class's teaching periods.
    pub period_index: usize,
    /// Number of teaching periods in the class's day.
    pub period_count: usize,
    /// A lesson of the same class sits on an adjacent teaching period.
    pub adjacent_to_class_lesson: bool,
    /// Hours of the same (class, subject) already placed that day.
    pub same_subject_that_day: u32,
}

impl SlotFacts {
    fn is_morning(&self) -> bool {
        self.period_index < self.period_count / 2
    }

    fn is_edge(&self) -> bool {
        self.period_count > 0
            && (self.period_index == 0 || self.period_index + 1 == self.period_count)
    }
}

/// Weights of the soft factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScoreWeights {
    pub morning_bonus: i32,
    pub first_last_penalty: i32,
    pub compact_bonus: i32,
    pub spread_penalty: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            morning_bonus: 2,
            first_last_penalty: 5,
            compact_bonus: 3,
            spread_penalty: 4,
        }
    }
}

impl ScoreWeights {
    /// Scores a candidate. Lower is better.
    pub fn score(&self, facts: &SlotFacts, rules: &RuleSet, mode: AlgorithmMode) -> i32 {
        let mut score = facts.restricted_penalty;

        if rules.prefer_morning_hours && facts.is_morning() {
            score -= self.morning_bonus;
        }
        if rules.avoid_first_last_period && facts.is_edge() {
            score += self.first_last_penalty;
        }

        match mode {
            AlgorithmMode::Balanced => {}
            AlgorithmMode::Compact => {
                if facts.adjacent_to_class_lesson {
                    score -= self.compact_bonus;
                }
            }
            AlgorithmMode::Distributed => {
                score += self.spread_penalty * facts.same_subject_that_day as i32;
            }
        }

        score
    }
}

//! Per-entity time availability.
//!
//! Users mark individual (day, period) slots of a teacher or class as
//! preferred, restricted or unavailable. A slot with no record is
//! preferred.
//!
//! # Precedence
//! When several records exist for the same slot, the strictest wins:
//! `Unavailable` > `Restricted` > `Preferred`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Day, EntityKind, EntityRef, Slot};

/// Penalty added to a slot score per restricted entity.
pub const RESTRICTED_PENALTY: i32 = 10;

/// Availability of an entity at a slot.
///
/// Ordered by strictness, so `max` picks the winning record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Free to schedule (also the meaning of "no record").
    #[default]
    Preferred,
    /// Allowed, but penalized.
    Restricted,
    /// Hard block.
    Unavailable,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Preferred => "preferred",
            Self::Restricted => "restricted",
            Self::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// A user-entered availability record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConstraint {
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub day: Day,
    pub period: u8,
    pub constraint_type: Availability,
}

impl TimeConstraint {
    /// Creates a record for a teacher.
    pub fn teacher(
        teacher_id: impl Into<String>,
        day: Day,
        period: u8,
        constraint_type: Availability,
    ) -> Self {
        Self {
            entity_type: EntityKind::Teacher,
            entity_id: teacher_id.into(),
            day,
            period,
            constraint_type,
        }
    }

    /// Creates a record for a class.
    pub fn class(
        class_id: impl Into<String>,
        day: Day,
        period: u8,
        constraint_type: Availability,
    ) -> Self {
        Self {
            entity_type: EntityKind::Class,
            entity_id: class_id.into(),
            day,
            period,
            constraint_type,
        }
    }

    /// The entity this record refers to.
    pub fn entity(&self) -> EntityRef<'_> {
        match self.entity_type {
            EntityKind::Teacher => EntityRef::Teacher(&self.entity_id),
            EntityKind::Class => EntityRef::Class(&self.entity_id),
        }
    }

    /// The slot this record refers to.
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.period)
    }
}

/// Slots of an entity grouped by availability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendations {
    pub preferred: Vec<Slot>,
    pub restricted: Vec<Slot>,
    pub unavailable: Vec<Slot>,
}

/// Whether a slot is a good choice for an entity, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotVerdict {
    pub is_optimal: bool,
    pub availability: Availability,
    pub reason: &'static str,
}

/// Constant-time availability lookup.
///
/// Read-only to the scheduler; built once per run from the records.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    by_entity: HashMap<EntityKind, HashMap<String, HashMap<Slot, Availability>>>,
}

impl ConstraintStore {
    /// Creates an empty store (everything preferred).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from records, resolving duplicates by precedence.
    pub fn from_constraints<'a>(records: impl IntoIterator<Item = &'a TimeConstraint>) -> Self {
        let mut store = Self::new();
        for r in records {
            store.insert(r);
        }
        store
    }

    /// Adds a record. A stricter existing record for the same slot is kept.
    pub fn insert(&mut self, record: &TimeConstraint) {
        let slot_map = self
            .by_entity
            .entry(record.entity_type)
            .or_default()
            .entry(record.entity_id.clone())
            .or_default();
        let current = slot_map.entry(record.slot()).or_default();
        *current = (*current).max(record.constraint_type);
    }

    /// Availability of `entity` at `slot`.
    pub fn availability(&self, entity: EntityRef<'_>, slot: Slot) -> Availability {
        self.by_entity
            .get(&entity.kind())
            .and_then(|m| m.get(entity.id()))
            .and_then(|m| m.get(&slot))
            .copied()
            .unwrap_or_default()
    }

    /// True only for `Unavailable`.
    pub fn is_hard_blocked(&self, entity: EntityRef<'_>, slot: Slot) -> bool {
        self.availability(entity, slot) == Availability::Unavailable
    }

    /// 0 for preferred or absent, [`RESTRICTED_PENALTY`] for restricted.
    ///
    /// Unavailable slots are filtered out before scoring, so they carry no
    /// soft penalty.
    pub fn soft_penalty(&self, entity: EntityRef<'_>, slot: Slot) -> i32 {
        match self.availability(entity, slot) {
            Availability::Restricted => RESTRICTED_PENALTY,
            Availability::Preferred | Availability::Unavailable => 0,
        }
    }

    /// Groups `slots` by the entity's availability.
    pub fn recommendations(&self, entity: EntityRef<'_>, slots: &[Slot]) -> Recommendations {
        let mut rec = Recommendations::default();
        for &slot in slots {
            match self.availability(entity, slot) {
                Availability::Preferred => rec.preferred.push(slot),
                Availability::Restricted => rec.restricted.push(slot),
                Availability::Unavailable => rec.unavailable.push(slot),
            }
        }
        rec
    }

    /// Judges a single slot for an entity.
    pub fn is_optimal_slot(&self, entity: EntityRef<'_>, slot: Slot) -> SlotVerdict {
        let has_record = self
            .by_entity
            .get(&entity.kind())
            .and_then(|m| m.get(entity.id()))
            .is_some_and(|m| m.contains_key(&slot));
        let availability = self.availability(entity, slot);
        let (is_optimal, reason) = match availability {
            Availability::Preferred if has_record => (true, "preferred slot"),
            Availability::Preferred => (true, "preferred slot (default)"),
            Availability::Restricted => (false, "restricted slot, use with care"),
            Availability::Unavailable => (false, "unavailable slot, cannot be used"),
        };
        SlotVerdict {
            is_optimal,
            availability,
            reason,
        }
    }

    /// Number of entities with at least one record.
    pub fn entity_count(&self) -> usize {
        self.by_entity.values().map(|m| m.len()).sum()
    }
}

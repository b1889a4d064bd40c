//! Arena storage for every unit in a battle.
//!
//! Units are stored densely by id and never removed, so lookups are an
//! index and iteration order is id order. Groups and armies hold
//! [`UnitId`]s into this arena instead of owning units.

use serde::{Deserialize, Serialize};

use crate::unit::{Unit, UnitId};

/// Owns every unit of both armies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitRoster {
    units: Vec<Unit>,
}

impl UnitRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self { units: Vec::new() }
    }

    /// Id the next spawned unit will get.
    #[must_use]
    pub fn next_id(&self) -> UnitId {
        UnitId::try_from(self.units.len() + 1).unwrap_or(UnitId::MAX)
    }

    /// Insert a unit built for the next id and return that id.
    pub fn spawn(&mut self, build: impl FnOnce(UnitId) -> Unit) -> UnitId {
        let id = self.next_id();
        let mut unit = build(id);
        unit.id = id;
        self.units.push(unit);
        id
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        Self::index(id).and_then(|i| self.units.get(i))
    }

    /// Get a mutable reference to a unit by id.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        Self::index(id).and_then(|i| self.units.get_mut(i))
    }

    /// Borrow two distinct units mutably at once.
    ///
    /// Returns `None` if either id is unknown or both ids are equal.
    pub fn pair_mut(&mut self, a: UnitId, b: UnitId) -> Option<(&mut Unit, &mut Unit)> {
        let (ia, ib) = (Self::index(a)?, Self::index(b)?);
        if ia == ib || ia >= self.units.len() || ib >= self.units.len() {
            return None;
        }

        if ia < ib {
            let (left, right) = self.units.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.units.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// Alive predicate for an id; unknown ids count as dead.
    #[must_use]
    pub fn is_alive(&self, id: UnitId) -> bool {
        self.get(id).is_some_and(Unit::is_alive)
    }

    /// Number of units ever spawned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate over all units in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    fn index(id: UnitId) -> Option<usize> {
        usize::try_from(id).ok()?.checked_sub(1)
    }
}

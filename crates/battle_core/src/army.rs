//! Armies: ordered groups plus aggregate queries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::group::Group;
use crate::math::{Fixed, Vec2Fixed};
use crate::roster::UnitRoster;
use crate::unit::{Unit, UnitId};

/// One of the two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Deploys on the left, retreats off the left edge.
    A,
    /// Deploys on the right, retreats off the right edge.
    B,
}

impl Side {
    /// Both sides, A first.
    pub const BOTH: [Self; 2] = [Self::A, Self::B];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Unit vector toward the enemy edge.
    #[must_use]
    pub fn forward(self) -> Vec2Fixed {
        match self {
            Self::A => Vec2Fixed::new(Fixed::ONE, Fixed::ZERO),
            Self::B => Vec2Fixed::new(-Fixed::ONE, Fixed::ZERO),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// A side's groups in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    /// Which side this army fights on.
    pub side: Side,
    /// Display name, usually the preset it was built from.
    pub name: String,
    groups: Vec<Group>,
}

impl Army {
    /// Create an empty army.
    #[must_use]
    pub fn new(side: Side, name: impl Into<String>) -> Self {
        Self {
            side,
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Append a group.
    pub fn add_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    /// Groups in creation order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Movement step for every group. Returns units newly ordered to retreat.
    pub fn update(&mut self, roster: &mut UnitRoster, dt: Fixed, field: &Battlefield) -> Vec<UnitId> {
        let mut routed = Vec::new();
        for group in &mut self.groups {
            routed.extend(group.update(roster, dt, field));
        }
        routed
    }

    /// Re-place every group's members around its anchor.
    pub fn apply_formations(&mut self, roster: &mut UnitRoster) {
        for group in &mut self.groups {
            group.apply_formation(roster);
        }
    }

    /// Every unit id, leaders and members, dead or alive.
    #[must_use]
    pub fn all_units(&self) -> Vec<UnitId> {
        self.groups.iter().flat_map(Group::unit_ids).collect()
    }

    /// Units that are alive and not retreating.
    #[must_use]
    pub fn alive_units(&self, roster: &UnitRoster) -> Vec<UnitId> {
        self.units(roster)
            .filter(|u| u.is_combatant())
            .map(|u| u.id)
            .collect()
    }

    /// Number of units that are alive and not retreating.
    #[must_use]
    pub fn alive_count(&self, roster: &UnitRoster) -> usize {
        self.units(roster).filter(|u| u.is_combatant()).count()
    }

    /// Mean HP fraction over every unit; the dead contribute zero.
    ///
    /// An army with no units scores zero.
    #[must_use]
    pub fn total_health_fraction(&self, roster: &UnitRoster) -> Fixed {
        let (sum, count) = self
            .units(roster)
            .fold((Fixed::ZERO, 0_i64), |(sum, count), unit| {
                (sum + unit.health.fraction(), count + 1)
            });

        if count == 0 {
            Fixed::ZERO
        } else {
            sum / count
        }
    }

    /// Every group has no living unit. Retreating units are still alive.
    #[must_use]
    pub fn is_defeated(&self, roster: &UnitRoster) -> bool {
        self.groups.iter().all(|g| g.is_defeated(roster))
    }

    fn units<'a>(&'a self, roster: &'a UnitRoster) -> impl Iterator<Item = &'a Unit> + 'a {
        self.groups
            .iter()
            .flat_map(Group::unit_ids)
            .filter_map(|id| roster.get(id))
    }
}

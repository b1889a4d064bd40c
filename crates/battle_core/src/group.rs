//! Leader-plus-members groups.
//!
//! While the leader lives, members are placed in formation around an anchor
//! derived from the leader. Once the leader dies, every member still
//! fighting routs toward its army's map edge.

use serde::{Deserialize, Serialize};

use crate::army::Side;
use crate::battlefield::Battlefield;
use crate::formation::Formation;
use crate::math::{fixed_int, Fixed, Vec2Fixed};
use crate::roster::UnitRoster;
use crate::unit::UnitId;

/// Unique group identifier within a battle.
pub type GroupId = u32;

/// Leader movement beyond this distance from its target counts as moving.
pub const LEADER_MOVING_THRESHOLD: Fixed = fixed_int(5);

/// A leader and its members, by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier.
    pub id: GroupId,
    /// Owning army.
    pub side: Side,
    /// Leader unit.
    pub leader: UnitId,
    /// Member units, in formation slot order.
    pub members: Vec<UnitId>,
    /// Member placement.
    pub formation: Formation,
    anchor: Vec2Fixed,
}

impl Group {
    /// Create a group in the default circle formation.
    #[must_use]
    pub fn new(id: GroupId, side: Side, leader: UnitId, members: Vec<UnitId>, anchor: Vec2Fixed) -> Self {
        Self {
            id,
            side,
            leader,
            members,
            formation: Formation::default(),
            anchor,
        }
    }

    /// Anchor computed on the last formation pass.
    #[must_use]
    pub const fn anchor(&self) -> Vec2Fixed {
        self.anchor
    }

    /// Leader first, then members.
    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        std::iter::once(self.leader).chain(self.members.iter().copied())
    }

    /// Movement step for every unit in the group.
    ///
    /// Returns the members newly ordered to retreat this call.
    pub fn update(&mut self, roster: &mut UnitRoster, dt: Fixed, field: &Battlefield) -> Vec<UnitId> {
        if let Some(leader) = roster.get_mut(self.leader) {
            leader.update(dt);
        }

        let routed = if roster.is_alive(self.leader) {
            self.apply_formation(roster);
            Vec::new()
        } else {
            self.order_retreat(roster, field)
        };

        for id in &self.members {
            if let Some(member) = roster.get_mut(*id) {
                member.update(dt);
            }
        }

        routed
    }

    /// Recompute the anchor and overwrite members' targets with slots.
    ///
    /// Does nothing when the leader is dead. Retreating members keep their
    /// exit target.
    pub fn apply_formation(&mut self, roster: &mut UnitRoster) {
        let Some(leader) = roster.get(self.leader).filter(|l| l.is_alive()) else {
            return;
        };

        let leader_moving = leader.position.distance(leader.target) > LEADER_MOVING_THRESHOLD;
        self.anchor = if leader_moving { leader.target } else { leader.position };

        let facing = if leader_moving {
            leader.target - leader.position
        } else {
            self.side.forward()
        };

        let placed: Vec<UnitId> = self
            .members
            .iter()
            .copied()
            .filter(|id| roster.get(*id).is_some_and(|u| u.is_combatant()))
            .collect();

        let slots = self.formation.compute_slots(self.anchor, placed.len(), facing);
        for (id, slot) in placed.into_iter().zip(slots) {
            if let Some(member) = roster.get_mut(id) {
                member.move_to(slot);
            }
        }
    }

    /// Send every fighting member toward the exit. Idempotent.
    fn order_retreat(&self, roster: &mut UnitRoster, field: &Battlefield) -> Vec<UnitId> {
        let mut routed = Vec::new();

        for id in &self.members {
            let Some(member) = roster.get_mut(*id) else {
                continue;
            };
            if !member.is_combatant() {
                continue;
            }

            member.start_retreating(field.exit_point(self.side, member.position.y));
            routed.push(*id);
        }

        if !routed.is_empty() {
            tracing::debug!(group = self.id, side = ?self.side, count = routed.len(), "Leader down, group retreating");
        }
        routed
    }

    /// Units alive, retreating or not.
    #[must_use]
    pub fn alive_count(&self, roster: &UnitRoster) -> usize {
        self.unit_ids().filter(|id| roster.is_alive(*id)).count()
    }

    /// Every unit, leader included, is dead.
    #[must_use]
    pub fn is_defeated(&self, roster: &UnitRoster) -> bool {
        self.alive_count(roster) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{Unit, UnitStats};
    use crate::unit_kind::UnitKind;

    fn spawn(roster: &mut UnitRoster, x: i32, y: i32, side: Side) -> UnitId {
        let stats = UnitStats {
            attack: 15,
            defense: 10,
            magic_power: 0,
            speed: Fixed::from_num(40),
            range: Fixed::from_num(15),
            sight_range: Fixed::from_num(5000),
            size: Fixed::ONE,
            attack_cooldown: Fixed::ONE,
        };
        roster.spawn(|id| {
            Unit::new(
                id,
                UnitKind::Infantry,
                "Infantry",
                100,
                stats,
                Vec2Fixed::from_ints(x, y),
                side,
            )
        })
    }

    fn group(roster: &mut UnitRoster, side: Side, members: usize) -> Group {
        let leader = spawn(roster, 300, 300, side);
        roster.get_mut(leader).unwrap().is_leader = true;
        let members = (0..members)
            .map(|i| spawn(roster, 310 + i as i32 * 5, 310, side))
            .collect();
        Group::new(1, side, leader, members, Vec2Fixed::from_ints(300, 300))
    }

    fn dt() -> Fixed {
        Fixed::from_num(0.05)
    }

    #[test]
    fn test_leader_death_routes_all_members_to_own_edge() {
        let field = Battlefield::default();
        for (side, exit_x) in [(Side::A, -100), (Side::B, 1124)] {
            let mut roster = UnitRoster::new();
            let mut g = group(&mut roster, side, 3);
            roster.get_mut(g.leader).unwrap().kill();

            let routed = g.update(&mut roster, dt(), &field);
            assert_eq!(routed.len(), 3);
            for id in &g.members {
                let member = roster.get(*id).unwrap();
                assert!(member.is_retreating());
                assert_eq!(member.target.x, Fixed::from_num(exit_x));
                assert_eq!(member.target.y, Fixed::from_num(310));
            }

            // Already routed; nothing new.
            assert!(g.update(&mut roster, dt(), &field).is_empty());
        }
    }

    #[test]
    fn test_dead_members_are_not_routed() {
        let mut roster = UnitRoster::new();
        let mut g = group(&mut roster, Side::A, 2);
        roster.get_mut(g.members[0]).unwrap().kill();
        roster.get_mut(g.leader).unwrap().kill();

        let routed = g.update(&mut roster, dt(), &Battlefield::default());
        assert_eq!(routed, vec![g.members[1]]);
        assert!(!roster.get(g.members[0]).unwrap().is_retreating());
    }

    #[test]
    fn test_anchor_follows_moving_leader_target() {
        let mut roster = UnitRoster::new();
        let mut g = group(&mut roster, Side::A, 2);
        roster.get_mut(g.leader).unwrap().move_to(Vec2Fixed::from_ints(500, 300));

        g.apply_formation(&mut roster);
        assert_eq!(g.anchor(), Vec2Fixed::from_ints(500, 300));

        for id in &g.members {
            let slot = roster.get(*id).unwrap().target;
            let r = slot.distance(g.anchor()).to_num::<f64>();
            assert!((r - 50.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_anchor_is_leader_position_when_settled() {
        let mut roster = UnitRoster::new();
        let mut g = group(&mut roster, Side::A, 1);
        roster.get_mut(g.leader).unwrap().move_to(Vec2Fixed::from_ints(303, 300));

        g.apply_formation(&mut roster);
        assert_eq!(g.anchor(), Vec2Fixed::from_ints(300, 300));
    }

    #[test]
    fn test_formation_skips_retreating_members() {
        let mut roster = UnitRoster::new();
        let mut g = group(&mut roster, Side::A, 2);
        let exit = Vec2Fixed::from_ints(-100, 310);
        roster.get_mut(g.members[0]).unwrap().start_retreating(exit);

        g.apply_formation(&mut roster);
        assert_eq!(roster.get(g.members[0]).unwrap().target, exit);
        // Only one placed member, so it takes slot 0 at angle 0.
        let slot = roster.get(g.members[1]).unwrap().target;
        assert!((slot.x.to_num::<f64>() - 350.0).abs() < 0.01);
    }

    #[test]
    fn test_alive_count_and_defeat() {
        let mut roster = UnitRoster::new();
        let g = group(&mut roster, Side::B, 2);
        assert_eq!(g.alive_count(&roster), 3);

        roster
            .get_mut(g.members[0])
            .unwrap()
            .start_retreating(Vec2Fixed::ZERO);
        assert_eq!(g.alive_count(&roster), 3, "retreating units still count");

        for id in g.unit_ids().collect::<Vec<_>>() {
            roster.get_mut(id).unwrap().kill();
        }
        assert!(g.is_defeated(&roster));
    }
}

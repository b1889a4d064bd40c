//! Preset army compositions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::unit_kind::UnitKind;

/// One group of a preset: a leader and `count` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTemplate {
    /// Leader unit kind.
    pub leader: UnitKind,
    /// Member unit kind.
    pub member: UnitKind,
    /// Number of members (leader excluded).
    pub count: u32,
}

impl GroupTemplate {
    /// Create a group template.
    #[must_use]
    pub const fn new(leader: UnitKind, member: UnitKind, count: u32) -> Self {
        Self {
            leader,
            member,
            count,
        }
    }
}

/// Archetype name to ordered group list. The n-th group deploys at the
/// n-th deployment point of its side.
pub type PresetTable = BTreeMap<String, Vec<GroupTemplate>>;

/// The three archetypes the game ships with.
#[must_use]
pub fn builtin_presets() -> PresetTable {
    use UnitKind::{Archer, Cavalry, HeavyInfantry, Infantry, Mage};

    let mut presets = PresetTable::new();
    presets.insert(
        "balanced".to_string(),
        vec![
            GroupTemplate::new(Infantry, Infantry, 4),
            GroupTemplate::new(Archer, Archer, 3),
            GroupTemplate::new(Mage, Infantry, 2),
        ],
    );
    presets.insert(
        "offensive".to_string(),
        vec![
            GroupTemplate::new(Cavalry, Cavalry, 2),
            GroupTemplate::new(Archer, Archer, 4),
            GroupTemplate::new(Infantry, Infantry, 3),
        ],
    );
    presets.insert(
        "defensive".to_string(),
        vec![
            GroupTemplate::new(HeavyInfantry, HeavyInfantry, 3),
            GroupTemplate::new(Infantry, Archer, 4),
            GroupTemplate::new(Mage, Mage, 2),
        ],
    );
    presets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_have_three_groups_each() {
        let presets = builtin_presets();
        assert_eq!(presets.len(), 3);
        for groups in presets.values() {
            assert_eq!(groups.len(), 3);
        }
        assert_eq!(presets["defensive"][1], GroupTemplate::new(UnitKind::Infantry, UnitKind::Archer, 4));
    }

    #[test]
    fn test_parse_preset_table() {
        let table: PresetTable = ron::from_str(
            r#"{ "skirmish": [(leader: cavalry, member: archer, count: 2)] }"#,
        )
        .unwrap();
        assert_eq!(table["skirmish"][0].leader, UnitKind::Cavalry);
    }
}

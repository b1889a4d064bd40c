//! Formation shapes.
//!
//! A [`Formation`] maps an anchor point and a member count to one slot per
//! member. Groups call [`Formation::compute_slots`] every tick and assign
//! slots in member order.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_int, fixed_serde, Fixed, Vec2Fixed};

/// Default circle radius around the anchor.
pub const DEFAULT_RADIUS: Fixed = fixed_int(50);
/// Default distance between neighbouring members.
pub const DEFAULT_SPACING: Fixed = fixed_int(20);

/// Member placement around the group anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    /// Equal angular spacing on a circle around the anchor.
    Circle {
        /// Circle radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
        /// Nominal member spacing (unused by the circle itself).
        #[serde(with = "fixed_serde")]
        spacing: Fixed,
    },
    /// A single rank across the facing direction, centered on the anchor.
    Line {
        /// Distance between neighbours.
        #[serde(with = "fixed_serde")]
        spacing: Fixed,
    },
    /// A V trailing behind the anchor, alternating left and right.
    Wedge {
        /// Distance between ranks.
        #[serde(with = "fixed_serde")]
        spacing: Fixed,
    },
}

impl Default for Formation {
    fn default() -> Self {
        Self::Circle {
            radius: DEFAULT_RADIUS,
            spacing: DEFAULT_SPACING,
        }
    }
}

impl Formation {
    /// Shape tag for views and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Line { .. } => "line",
            Self::Wedge { .. } => "wedge",
        }
    }

    /// One slot per member. `facing` only matters for line and wedge.
    #[must_use]
    pub fn compute_slots(&self, anchor: Vec2Fixed, count: usize, facing: Vec2Fixed) -> Vec<Vec2Fixed> {
        if count == 0 {
            return Vec::new();
        }

        let facing = facing.normalize();
        let across = Vec2Fixed::new(-facing.y, facing.x);

        match *self {
            Self::Circle { radius, .. } => {
                let radius = radius.to_num::<f32>();
                (0..count)
                    .map(|i| {
                        let angle = (i as f32 / count as f32) * std::f32::consts::TAU;
                        anchor + Vec2Fixed::from_f32(angle.cos() * radius, angle.sin() * radius)
                    })
                    .collect()
            }
            Self::Line { spacing } => {
                // Offsets -(n-1)/2 .. (n-1)/2, doubled to stay integral.
                let n = count as i64;
                (0..n)
                    .map(|i| {
                        let offset = spacing * Fixed::from_num(2 * i - (n - 1)) / 2;
                        anchor + across * offset
                    })
                    .collect()
            }
            Self::Wedge { spacing } => (0..count)
                .map(|i| {
                    let rank = Fixed::from_num(i / 2 + 1) * spacing;
                    let side = if i % 2 == 0 { rank } else { -rank };
                    anchor - facing * rank + across * side
                })
                .collect(),
        }
    }
}

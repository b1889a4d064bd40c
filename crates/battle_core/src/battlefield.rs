//! Battlefield geometry: playable bounds and retreat exits.

use serde::{Deserialize, Serialize};

use crate::army::Side;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Left inset of the playable rectangle.
pub const INSET_LEFT: u32 = 50;
/// Right inset of the playable rectangle.
pub const INSET_RIGHT: u32 = 50;
/// Top inset of the playable rectangle (leaves room for the HUD).
pub const INSET_TOP: u32 = 100;
/// Bottom inset of the playable rectangle.
pub const INSET_BOTTOM: u32 = 68;
/// How far past the map edge routed units head.
pub const EXIT_MARGIN: u32 = 100;

/// Battlefield dimensions for the current battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battlefield {
    /// Width in length-units.
    #[serde(with = "fixed_serde")]
    pub width: Fixed,
    /// Height in length-units.
    #[serde(with = "fixed_serde")]
    pub height: Fixed,
}

impl Battlefield {
    /// Create a battlefield of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: Fixed::from_num(width),
            height: Fixed::from_num(height),
        }
    }

    /// Top-left corner of the playable rectangle.
    #[must_use]
    pub fn playable_min(&self) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::from_num(INSET_LEFT), Fixed::from_num(INSET_TOP))
    }

    /// Bottom-right corner of the playable rectangle.
    #[must_use]
    pub fn playable_max(&self) -> Vec2Fixed {
        Vec2Fixed::new(
            self.width - Fixed::from_num(INSET_RIGHT),
            self.height - Fixed::from_num(INSET_BOTTOM),
        )
    }

    /// Clamp a point into the playable rectangle.
    #[must_use]
    pub fn clamp_playable(&self, point: Vec2Fixed) -> Vec2Fixed {
        point.clamp(self.playable_min(), self.playable_max())
    }

    /// Where a routed unit of `side` at height `y` heads: off the left
    /// edge for side A, off the right edge for side B.
    #[must_use]
    pub fn exit_point(&self, side: Side, y: Fixed) -> Vec2Fixed {
        let margin = Fixed::from_num(EXIT_MARGIN);
        match side {
            Side::A => Vec2Fixed::new(-margin, y),
            Side::B => Vec2Fixed::new(self.width + margin, y),
        }
    }
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds_match_screen_layout() {
        let field = Battlefield::default();
        assert_eq!(field.playable_min(), Vec2Fixed::from_ints(50, 100));
        assert_eq!(field.playable_max(), Vec2Fixed::from_ints(974, 700));
    }

    #[test]
    fn test_exit_points_are_off_map_on_own_edge() {
        let field = Battlefield::default();
        let y = Fixed::from_num(333);
        assert_eq!(field.exit_point(Side::A, y), Vec2Fixed::from_ints(-100, 333));
        assert_eq!(field.exit_point(Side::B, y), Vec2Fixed::from_ints(1124, 333));
    }

    #[test]
    fn test_clamp_playable() {
        let field = Battlefield::new(800, 600);
        let clamped = field.clamp_playable(Vec2Fixed::from_ints(900, 10));
        assert_eq!(clamped, Vec2Fixed::from_ints(750, 100));
    }
}

//! Stage (battlefield) definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal, Fixed, Vec2Fixed};

/// A deployment position as authored in data files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPoint {
    /// X coordinate.
    #[serde(with = "fixed_decimal")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_decimal")]
    pub y: Fixed,
}

impl DeploymentPoint {
    /// Convert to a simulation vector.
    #[must_use]
    pub const fn to_vec(self) -> Vec2Fixed {
        Vec2Fixed::new(self.x, self.y)
    }
}

impl From<Vec2Fixed> for DeploymentPoint {
    fn from(v: Vec2Fixed) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// A battlefield: terrain, size, time limit and where each side deploys.
///
/// # Example RON
///
/// ```ron
/// (
///     name: "Open Plains",
///     terrain: "plains",
///     deployment_points_a: [(x: 150.0, y: 250.0), (x: 150.0, y: 400.0)],
///     deployment_points_b: [(x: 850.0, y: 250.0), (x: 850.0, y: 400.0)],
///     time_limit: 180.0,
///     width: 1024,
///     height: 768,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Display name.
    pub name: String,

    /// Terrain identifier (key into the terrain table).
    pub terrain: String,

    /// Group deployment points for side A, one per group.
    pub deployment_points_a: Vec<DeploymentPoint>,

    /// Group deployment points for side B, one per group.
    pub deployment_points_b: Vec<DeploymentPoint>,

    /// Battle length in seconds before health decides the winner.
    #[serde(with = "fixed_decimal")]
    pub time_limit: Fixed,

    /// Battlefield width in length-units.
    pub width: u32,

    /// Battlefield height in length-units.
    pub height: u32,
}

impl StageConfig {
    /// Side A deployment points as vectors.
    #[must_use]
    pub fn deployment_a(&self) -> Vec<Vec2Fixed> {
        self.deployment_points_a.iter().map(|p| p.to_vec()).collect()
    }

    /// Side B deployment points as vectors.
    #[must_use]
    pub fn deployment_b(&self) -> Vec<Vec2Fixed> {
        self.deployment_points_b.iter().map(|p| p.to_vec()).collect()
    }
}

/// Stages keyed by identifier.
pub type StageTable = BTreeMap<String, StageConfig>;

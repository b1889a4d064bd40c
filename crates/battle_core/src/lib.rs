//! # Battle Core
//!
//! Deterministic tactical battle simulation.
//!
//! Two armies of leader-plus-members groups fight autonomously on a 2D
//! battlefield. This crate contains **only** the simulation:
//! - No rendering
//! - No IO beyond explicit data-file loading
//! - No system randomness (deployment jitter is seeded)
//! - No floating-point math in the tick (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`math`] - Fixed-point vectors
//! - [`unit_kind`] - Unit variants and their tuning table
//! - [`unit`] - Individual combatants
//! - [`ai`] - Target selection and action decisions
//! - [`formation`] - Member slot placement
//! - [`group`] - Leader-plus-members groups
//! - [`army`] - Sides and aggregate queries
//! - [`battle`] - Setup, tick pipeline, win conditions
//! - [`data`] - RON data tables
//! - [`events`] - Tick events and observers
//! - [`view`] - Presentation snapshots

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod army;
pub mod battle;
pub mod battlefield;
pub mod data;
pub mod error;
pub mod events;
pub mod formation;
pub mod group;
pub mod math;
pub mod roster;
pub mod unit;
pub mod unit_kind;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiAction, AiBehavior};
    pub use crate::army::{Army, Side};
    pub use crate::battle::{BattleManager, BattlePhase, Winner, TICK_DURATION, TICK_RATE};
    pub use crate::battlefield::Battlefield;
    pub use crate::data::{DataCatalog, GroupTemplate, StageConfig, TerrainConfig, UnitTypeConfig};
    pub use crate::error::{BattleError, Result};
    pub use crate::events::{AttackEvent, BattleObserver, EventLog, NullObserver, TickEvents};
    pub use crate::formation::Formation;
    pub use crate::group::{Group, GroupId};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::roster::UnitRoster;
    pub use crate::unit::{Unit, UnitId};
    pub use crate::unit_kind::UnitKind;
    pub use crate::view::{ArmyView, BattleView, UnitView};
}

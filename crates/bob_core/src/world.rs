//! Read-only view of the game world.
//!
//! The core never owns game units. It holds [`UnitHandle`]s and resolves
//! them through a [`WorldView`] every tick; a handle the world no longer
//! knows is treated as a destroyed unit.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::unit_kind::UnitKindId;

/// Opaque, stable reference to a unit owned by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitHandle(pub u32);

/// Which player a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The bot itself.
    Own,
    /// The opponent.
    Enemy,
}

/// In-game score, split the way the game reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Score for buildings constructed.
    pub building: i64,
    /// Score for enemy units killed.
    pub kill: i64,
    /// Score for enemy buildings razed.
    pub razing: i64,
    /// Score for units produced.
    pub unit: i64,
}

impl ScoreComponents {
    /// Aggregate score used to settle timed-out matches.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.building + self.kill + self.razing + self.unit
    }
}

/// A visible enemy unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyUnit {
    /// Unit handle.
    pub handle: UnitHandle,
    /// Unit kind.
    pub kind: UnitKindId,
    /// Current position.
    pub position: Vec2Fixed,
}

/// Queries the decision core needs from the game.
///
/// Implementations must answer consistently within one tick.
pub trait WorldView {
    /// Current simulation frame.
    fn frame(&self) -> u32;

    /// Own units of a kind, including ones still under construction.
    fn owned_count(&self, kind: UnitKindId) -> u32;

    /// Own completed units of a kind.
    fn completed_count(&self, kind: UnitKindId) -> u32;

    /// Units of a kind waiting in own production queues.
    fn queued_count(&self, kind: UnitKindId) -> u32;

    /// Supply currently used.
    fn supply_used(&self) -> u32;

    /// Supply capacity currently available.
    fn supply_total(&self) -> u32;

    /// Kind of an own unit, `None` if the handle is unknown.
    fn unit_kind(&self, handle: UnitHandle) -> Option<UnitKindId>;

    /// Hit points of an own unit, `None` if the handle is unknown.
    fn unit_health(&self, handle: UnitHandle) -> Option<i32>;

    /// Enemy units currently visible.
    fn enemy_units(&self) -> Vec<EnemyUnit>;

    /// Position of the own start location.
    fn home_position(&self) -> Option<Vec2Fixed>;

    /// Score components for a side.
    fn score(&self, side: Side) -> ScoreComponents;
}

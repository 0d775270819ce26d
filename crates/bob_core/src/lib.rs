//! # Build Order Bot Core
//!
//! Deterministic decision core of an opponent-adaptive RTS bot.
//!
//! This crate contains **only** decision logic:
//! - No IO (files are read and written through [`strategy::OutcomeStore`]
//!   and string parsers in [`data`])
//! - No system randomness
//! - No game state of its own; the world is queried through
//!   [`world::WorldView`]
//!
//! Given the same data, history and world answers it makes the same
//! decisions, tick for tick.
//!
//! ## Crate Structure
//!
//! - [`strategy`] - Opening selection with a UCB1 bandit
//! - [`timeline`] - Timed attack goals and the cursor over them
//! - [`composition`] - Parsing and merging army compositions
//! - [`build_goal`] - What to build next
//! - [`squad`] - All-or-nothing attack squad assembly
//! - [`tactics`] - Attack trigger, worker defense, rush detection
//! - [`planner`] - The per-match context tying it all together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod build_goal;
pub mod composition;
pub mod config;
pub mod data;
pub mod error;
pub mod math;
pub mod planner;
pub mod race;
pub mod rng;
pub mod squad;
pub mod strategy;
pub mod tactics;
pub mod timeline;
pub mod unit_kind;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::build_goal::{BuildGoalItem, BuildGoalResolver};
    pub use crate::composition::{ArmyComposition, CompositionSpec};
    pub use crate::config::{CompositionMode, Escalation, PlannerConfig, TacticsConfig};
    pub use crate::error::{PlannerError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::planner::StrategyPlanner;
    pub use crate::race::Race;
    pub use crate::squad::{Assembly, AttackRoster, AttackSquadAssembler};
    pub use crate::strategy::{
        MatchOutcome, OpeningCatalog, OutcomeStore, StrategyRecord, StrategySelector,
    };
    pub use crate::timeline::{AttackGoal, AttackPlanTimeline};
    pub use crate::unit_kind::{UnitKindId, UnitKindRegistry, UnitRole};
    pub use crate::world::{EnemyUnit, ScoreComponents, Side, UnitHandle, WorldView};
}

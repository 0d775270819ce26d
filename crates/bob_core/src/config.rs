//! Planner configuration.
//!
//! Every field has a default, so a RON file only needs to name what it
//! changes:
//!
//! ```ron
//! PlannerConfig(
//!     use_strategy_io: true,
//!     composition_mode: MergePending,
//!     tactics: TacticsConfig(worker_defense: false),
//! )
//! ```

use serde::{Deserialize, Serialize};

/// Which goals the build goal is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositionMode {
    /// Only the goal at the cursor.
    #[default]
    Current,
    /// The merge of every goal from the cursor to the end.
    MergePending,
}

/// What to do when the active composition is already satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Escalation {
    /// Advance the shared timeline cursor to the next goal.
    #[default]
    AdvanceCursor,
    /// Look at later goals without moving the cursor, so the squad
    /// assembler still executes the satisfied goal when its frame comes.
    LookAhead,
}

/// Tactical thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    /// Whether workers may be pulled to defend.
    pub worker_defense: bool,
    /// Radius around home in which enemy units threaten workers (pixels).
    pub defense_radius: i32,
    /// Enemy kinds that count as a worker threat.
    pub worker_threat_kinds: Vec<String>,
    /// Own kinds whose first completed unit triggers attacking.
    pub attack_trigger_kinds: Vec<String>,
    /// Free force size that triggers attacking.
    pub min_attack_force: usize,
    /// Enemy combatants near home before this frame count as a rush.
    pub rush_window_frame: u32,
    /// Radius around home watched for rushes (pixels).
    pub rush_radius: i32,
    /// Percentage of a squad that must be gathered to skip regrouping.
    pub regroup_percent: u32,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            worker_defense: true,
            defense_radius: 300,
            worker_threat_kinds: vec!["zergling".to_string()],
            attack_trigger_kinds: vec!["dark_templar".to_string()],
            min_attack_force: 1,
            rush_window_frame: 24 * 60 * 5,
            rush_radius: 800,
            regroup_percent: 50,
        }
    }
}

/// Top-level planner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Learn from persisted outcomes; otherwise pick openings at random.
    pub use_strategy_io: bool,
    /// Tournament time limit. Matches reaching it are settled by score.
    pub game_end_frame: u32,
    /// Seed for random opening selection.
    pub random_seed: u64,
    /// Which goals feed the build goal.
    pub composition_mode: CompositionMode,
    /// Behaviour when the active goal is already satisfied.
    pub escalation: Escalation,
    /// Supply capacity never exceeded by queued providers.
    pub max_supply: u32,
    /// Tactical thresholds.
    pub tactics: TacticsConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            use_strategy_io: true,
            game_end_frame: 86_400,
            random_seed: 0,
            composition_mode: CompositionMode::Current,
            escalation: Escalation::AdvanceCursor,
            max_supply: 400,
            tactics: TacticsConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(ron)
    }
}

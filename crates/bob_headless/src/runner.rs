//! Single match runner.
//!
//! Drives a [`StrategyPlanner`] against a [`SandboxWorld`] the way a bot
//! framework would: select at start, then every tick compute the build
//! goal, try to assemble a squad and decide whether to attack, and record
//! the outcome at the end.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use bob_core::build_goal::BuildGoalItem;
use bob_core::config::PlannerConfig;
use bob_core::planner::StrategyPlanner;
use bob_core::race::Race;
use bob_core::strategy::{OpeningCatalog, OutcomeStore};
use bob_core::timeline::AttackPlanTimeline;
use bob_core::unit_kind::{UnitKindId, UnitKindRegistry};
use bob_core::world::{Side, WorldView};

use crate::sandbox::{OpponentProfile, SandboxResult, SandboxWorld};
use crate::storage::{self, DataPaths};

/// Everything needed to start matches for one race.
#[derive(Debug, Clone)]
pub struct MatchSetup {
    /// Own race.
    pub race: Race,
    /// Unit kinds of all races.
    pub registry: UnitKindRegistry,
    /// Opening catalog with zeroed history.
    pub catalog: OpeningCatalog,
    /// Attack timeline at its first goal.
    pub timeline: AttackPlanTimeline,
    /// Planner config.
    pub config: PlannerConfig,
}

impl MatchSetup {
    /// Load data files for `race`. Missing files degrade to empty data.
    #[must_use]
    pub fn load(paths: &DataPaths, race: Race) -> Self {
        Self {
            race,
            registry: storage::load_registry(paths),
            catalog: storage::load_catalog(paths, race),
            timeline: storage::load_timeline(paths, race),
            config: storage::load_config(&paths.config_path()),
        }
    }

    /// A fresh planner for one match.
    #[must_use]
    pub fn planner(&self, opponent: &str) -> StrategyPlanner {
        StrategyPlanner::new(
            self.race,
            self.registry.clone(),
            self.catalog.clone(),
            self.timeline.clone(),
            opponent,
            self.config.clone(),
        )
    }

    /// A fresh sandbox for one match.
    #[must_use]
    pub fn world(&self, opponent: OpponentProfile) -> SandboxWorld {
        SandboxWorld::new(self.registry.clone(), self.race, opponent)
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Frames advanced per planner tick.
    pub step_frames: u32,
    /// Frame at which the match is stopped.
    pub max_frames: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            step_frames: 24,
            max_frames: 86_400,
        }
    }
}

/// What happened in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Opponent name.
    pub opponent: String,
    /// Index of the opening played.
    pub opening_index: Option<usize>,
    /// Label of the opening played.
    pub opening: Option<String>,
    /// Sandbox result, `None` if the match ran into the frame limit.
    pub result: Option<SandboxResult>,
    /// Whether the match was reported as won.
    pub won: bool,
    /// Frame the match ended at.
    pub end_frame: u32,
    /// Attack goal reached.
    pub final_goal: usize,
    /// Units committed to attacks over the match.
    pub roster_size: usize,
    /// Own aggregate score.
    pub own_score: i64,
    /// Opponent aggregate score.
    pub enemy_score: i64,
}

/// Play one match to the end.
pub fn play_match(
    planner: &mut StrategyPlanner,
    world: &mut SandboxWorld,
    settings: &MatchSettings,
    store: &mut dyn OutcomeStore,
) -> MatchReport {
    planner.on_start(store);
    let mut opening: VecDeque<UnitKindId> = planner.opening_build_order().into();
    let mut rush_reported = false;

    while world.frame() < settings.max_frames && world.result().is_none() {
        while let Some(&kind) = opening.front() {
            if world.produce(&[BuildGoalItem { kind, count: 1 }]) == 0 {
                // Nothing in flight can unblock it.
                if world.in_production() == 0 {
                    tracing::warn!(
                        "Opening item {} cannot be started, skipping",
                        planner.registry().string_id(kind).unwrap_or("?")
                    );
                    opening.pop_front();
                    continue;
                }
                break;
            }
            opening.pop_front();
        }
        if opening.is_empty() {
            let goal = planner.build_order_goal(&*world);
            world.produce(&goal);
        }

        let free = world.free_military(planner.roster());
        planner.attack_squad(&free, &*world);

        let free = world.free_military(planner.roster());
        if planner.do_attack(&free, &*world) {
            world.engage(planner.roster());
        }

        if planner.defend_with_workers(&*world) {
            tracing::debug!(
                frame = world.frame(),
                threats = planner.worker_threat(&*world),
                "Pulling workers to defend"
            );
        }
        if !rush_reported && planner.rush_detected(&*world) {
            tracing::info!(frame = world.frame(), "Rush detected");
            rush_reported = true;
        }

        world.advance(settings.step_frames);
    }

    let won = world.result() == Some(SandboxResult::Victory);
    planner.on_end(won, &*world, store);

    let report = MatchReport {
        opponent: world.opponent().name.clone(),
        opening_index: planner.selector().selected(),
        opening: planner.opening().map(str::to_string),
        result: world.result(),
        won,
        end_frame: world.frame(),
        final_goal: planner.timeline().cursor(),
        roster_size: planner.roster().len(),
        own_score: world.score(Side::Own).total(),
        enemy_score: world.score(Side::Enemy).total(),
    };
    tracing::info!(
        opponent = %report.opponent,
        opening = ?report.opening,
        result = ?report.result,
        frame = report.end_frame,
        "Match finished"
    );
    report
}

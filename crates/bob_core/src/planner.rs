//! The planner context.
//!
//! [`StrategyPlanner`] owns every piece of per-match state: the opening
//! selector, the attack timeline, the attack roster and the tactical
//! latches. The driver creates one per match and calls it once per tick.
//!
//! # Match lifecycle
//!
//! ```text
//! new ─► on_start ─► (build_order_goal, attack_squad, do_attack, ...)* ─► on_end
//! ```

use crate::build_goal::{BuildGoalItem, BuildGoalResolver};
use crate::config::PlannerConfig;
use crate::race::Race;
use crate::squad::{Assembly, AttackRoster, AttackSquadAssembler};
use crate::strategy::{MatchOutcome, OpeningCatalog, OutcomeStore, StrategySelector};
use crate::tactics::{self, AttackTrigger, ThreatAssessor};
use crate::timeline::AttackPlanTimeline;
use crate::unit_kind::{UnitKindId, UnitKindRegistry};
use crate::world::{Side, UnitHandle, WorldView};

/// Decision state for one match.
#[derive(Debug, Clone)]
pub struct StrategyPlanner {
    race: Race,
    registry: UnitKindRegistry,
    config: PlannerConfig,
    selector: StrategySelector,
    timeline: AttackPlanTimeline,
    roster: AttackRoster,
    trigger: AttackTrigger,
    threats: ThreatAssessor,
    last_assembly: Option<Assembly>,
}

impl StrategyPlanner {
    /// Create a planner for one match against `opponent`.
    ///
    /// An empty catalog or timeline is accepted; the planner then selects no
    /// opening and produces empty build goals.
    #[must_use]
    pub fn new(
        race: Race,
        registry: UnitKindRegistry,
        catalog: OpeningCatalog,
        timeline: AttackPlanTimeline,
        opponent: impl Into<String>,
        config: PlannerConfig,
    ) -> Self {
        let selector = StrategySelector::new(catalog, opponent, &config);
        let trigger = AttackTrigger::new(&registry, race, &config.tactics);
        let threats = ThreatAssessor::new(&registry, race, &config.tactics);
        Self {
            race,
            registry,
            config,
            selector,
            timeline,
            roster: AttackRoster::new(),
            trigger,
            threats,
            last_assembly: None,
        }
    }

    /// Load history and choose the opening. Call once at match start.
    pub fn on_start(&mut self, store: &mut dyn OutcomeStore) -> Option<usize> {
        self.selector.load_history(store);
        self.selector.select_strategy()
    }

    /// What to build next.
    pub fn build_order_goal<W: WorldView + ?Sized>(&mut self, world: &W) -> Vec<BuildGoalItem> {
        BuildGoalResolver::new(&self.registry, self.race, &self.config).compute_goal(
            &mut self.timeline,
            &self.roster,
            world,
        )
    }

    /// Try to commit the active goal's squad and return the roster.
    ///
    /// `free_pool` holds the own units not yet committed, in the order they
    /// should be drafted.
    pub fn attack_squad<W: WorldView + ?Sized>(
        &mut self,
        free_pool: &[UnitHandle],
        world: &W,
    ) -> &AttackRoster {
        let assembly = AttackSquadAssembler::new(&self.registry, self.race).assemble(
            &mut self.timeline,
            &mut self.roster,
            free_pool,
            world,
        );
        self.last_assembly = Some(assembly);
        &self.roster
    }

    /// Whether the bot should be attacking. Latches on the first yes.
    pub fn do_attack<W: WorldView + ?Sized>(&mut self, free_units: &[UnitHandle], world: &W) -> bool {
        self.trigger.should_attack(&self.registry, free_units, world)
    }

    /// Whether workers should be pulled to fight.
    #[must_use]
    pub fn defend_with_workers<W: WorldView + ?Sized>(&self, world: &W) -> bool {
        self.threats.worker_defense_threat(world) > 0
    }

    /// Number of enemies threatening the workers.
    #[must_use]
    pub fn worker_threat<W: WorldView + ?Sized>(&self, world: &W) -> usize {
        self.threats.worker_defense_threat(world)
    }

    /// Whether an early rush is underway.
    #[must_use]
    pub fn rush_detected<W: WorldView + ?Sized>(&self, world: &W) -> bool {
        self.threats.rush_detected(&self.registry, world)
    }

    /// Whether a squad with `in_radius` of `squad_size` units gathered
    /// should regroup before pushing on.
    #[must_use]
    pub fn regroup(&self, in_radius: usize, squad_size: usize) -> bool {
        tactics::should_regroup(in_radius, squad_size, self.config.tactics.regroup_percent)
    }

    /// Record the match result. Call once at match end.
    pub fn on_end<W: WorldView + ?Sized>(&mut self, won: bool, world: &W, store: &mut dyn OutcomeStore) {
        let outcome = MatchOutcome {
            won,
            frame: world.frame(),
            own_score: world.score(Side::Own),
            enemy_score: world.score(Side::Enemy),
        };
        self.selector.record_outcome(&outcome, store);
    }

    /// Label of the selected opening.
    #[must_use]
    pub fn opening(&self) -> Option<&str> {
        self.selector.opening()
    }

    /// Unit kinds of the selected opening, in order.
    #[must_use]
    pub fn opening_build_order(&self) -> Vec<UnitKindId> {
        self.selector.opening_build_order(self.race, &self.registry)
    }

    /// Result of the latest squad assembly attempt.
    #[must_use]
    pub fn last_assembly(&self) -> Option<&Assembly> {
        self.last_assembly.as_ref()
    }

    /// Own race.
    #[must_use]
    pub const fn race(&self) -> Race {
        self.race
    }

    /// Unit kind registry.
    #[must_use]
    pub fn registry(&self) -> &UnitKindRegistry {
        &self.registry
    }

    /// Planner configuration.
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Opening selector.
    #[must_use]
    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    /// Attack timeline.
    #[must_use]
    pub fn timeline(&self) -> &AttackPlanTimeline {
        &self.timeline
    }

    /// Attack roster.
    #[must_use]
    pub fn roster(&self) -> &AttackRoster {
        &self.roster
    }
}

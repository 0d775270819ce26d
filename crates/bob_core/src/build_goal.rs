//! Build goal computation.
//!
//! Turns the active attack composition into an ordered production list:
//! missing prerequisites first, then per-kind deficits, then supply
//! providers when the list would overrun capacity. Recomputed from scratch
//! every tick.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::composition::ArmyComposition;
use crate::config::{CompositionMode, Escalation, PlannerConfig};
use crate::race::Race;
use crate::squad::AttackRoster;
use crate::timeline::AttackPlanTimeline;
use crate::unit_kind::{UnitKindId, UnitKindRegistry, UnitRole};
use crate::world::WorldView;

/// One entry of the build goal: produce `count` more of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildGoalItem {
    /// Kind to produce.
    pub kind: UnitKindId,
    /// Number to produce.
    pub count: u32,
}

/// Ordered build goal with at most one item per kind.
#[derive(Debug, Default)]
struct GoalList {
    items: Vec<BuildGoalItem>,
}

impl GoalList {
    fn contains(&self, kind: UnitKindId) -> bool {
        self.items.iter().any(|item| item.kind == kind)
    }

    /// Append `kind`, or raise its existing count. The item keeps its
    /// earliest position.
    fn push_or_raise(&mut self, kind: UnitKindId, count: u32) {
        match self.items.iter_mut().find(|item| item.kind == kind) {
            Some(item) => item.count = item.count.max(count),
            None => self.items.push(BuildGoalItem { kind, count }),
        }
    }

    fn into_vec(self) -> Vec<BuildGoalItem> {
        #[cfg(feature = "debug-validation")]
        {
            let mut seen = HashSet::new();
            debug_assert!(
                self.items.iter().all(|item| seen.insert(item.kind)),
                "build goal contains a duplicate kind"
            );
        }
        self.items
    }
}

/// Computes what to build next from the attack plan and the world.
#[derive(Debug, Clone, Copy)]
pub struct BuildGoalResolver<'a> {
    registry: &'a UnitKindRegistry,
    race: Race,
    mode: CompositionMode,
    escalation: Escalation,
    max_supply: u32,
}

impl<'a> BuildGoalResolver<'a> {
    /// Create a resolver for `race` using the planner configuration.
    #[must_use]
    pub fn new(registry: &'a UnitKindRegistry, race: Race, config: &PlannerConfig) -> Self {
        Self {
            registry,
            race,
            mode: config.composition_mode,
            escalation: config.escalation,
            max_supply: config.max_supply,
        }
    }

    /// Compute the build goal for this tick.
    ///
    /// When the active composition is already met the resolver escalates to
    /// the next goal, either by advancing the timeline or by looking ahead,
    /// until a goal yields work or the terminal goal is reached. The result
    /// is empty only when the terminal goal is satisfied or the timeline is
    /// empty.
    pub fn compute_goal<W: WorldView + ?Sized>(
        &self,
        timeline: &mut AttackPlanTimeline,
        roster: &AttackRoster,
        world: &W,
    ) -> Vec<BuildGoalItem> {
        let mut index = timeline.cursor();
        loop {
            let composition = self.composition_at(timeline, index);
            let goal = self.goal_for(&composition, roster, world);
            if !goal.is_empty() {
                return goal;
            }

            tracing::debug!("Attack goal {index} already met");
            let escalated = match self.escalation {
                Escalation::AdvanceCursor => {
                    let moved = timeline.advance();
                    index = timeline.cursor();
                    moved
                }
                Escalation::LookAhead => {
                    index += 1;
                    index < timeline.len()
                }
            };
            if !escalated {
                return goal;
            }
        }
    }

    fn composition_at(&self, timeline: &mut AttackPlanTimeline, index: usize) -> ArmyComposition {
        match self.mode {
            CompositionMode::Current => timeline.composition_at(index, self.race, self.registry),
            CompositionMode::MergePending => timeline.merged_from(index, self.race, self.registry),
        }
    }

    fn goal_for<W: WorldView + ?Sized>(
        &self,
        composition: &ArmyComposition,
        roster: &AttackRoster,
        world: &W,
    ) -> Vec<BuildGoalItem> {
        let mut list = GoalList::default();
        let mut visited = HashSet::new();

        for (kind, desired) in composition.iter() {
            let committed = roster.count_of_kind(kind, world);
            let available = world
                .owned_count(kind)
                .saturating_sub(committed)
                .saturating_add(world.queued_count(kind));
            let deficit = desired.saturating_sub(available);
            if deficit == 0 {
                continue;
            }

            let mut in_progress = HashSet::from([kind]);
            self.emit_prerequisites(kind, world, &mut visited, &mut in_progress, &mut list);
            list.push_or_raise(kind, deficit);
        }

        if !list.items.is_empty() {
            self.throttle_supply(&mut list, world);
        }
        list.into_vec()
    }

    /// Post-order walk: a prerequisite is emitted after its own
    /// prerequisites, and only when none exist or are queued.
    fn emit_prerequisites<W: WorldView + ?Sized>(
        &self,
        kind: UnitKindId,
        world: &W,
        visited: &mut HashSet<UnitKindId>,
        in_progress: &mut HashSet<UnitKindId>,
        list: &mut GoalList,
    ) {
        for &prereq in self.registry.prerequisites(kind) {
            if visited.contains(&prereq) {
                continue;
            }

            // Worker prerequisites are terminal and never part of a cycle.
            if !self.registry.role(prereq).contains(UnitRole::WORKER) {
                if !in_progress.insert(prereq) {
                    tracing::warn!(
                        "Prerequisite cycle through {}, skipping",
                        self.registry.string_id(prereq).unwrap_or("?")
                    );
                    continue;
                }
                self.emit_prerequisites(prereq, world, visited, in_progress, list);
                in_progress.remove(&prereq);
            }

            visited.insert(prereq);
            if world.owned_count(prereq) + world.queued_count(prereq) == 0 {
                list.push_or_raise(prereq, 1);
            }
        }
    }

    fn throttle_supply<W: WorldView + ?Sized>(&self, list: &mut GoalList, world: &W) {
        let Some(provider) = self.registry.supply_provider(self.race) else {
            return;
        };
        let grant = self.registry.supply_provided(provider);
        if grant == 0 {
            return;
        }

        let demand: u32 = list
            .items
            .iter()
            .map(|item| item.count.saturating_mul(self.registry.supply_cost(item.kind)))
            .fold(0, u32::saturating_add);
        let projected = world.supply_used().saturating_add(demand);
        let capacity = world
            .supply_total()
            .saturating_add(world.queued_count(provider).saturating_mul(grant))
            .min(self.max_supply);
        if projected <= capacity {
            return;
        }

        let headroom = self.max_supply.saturating_sub(capacity);
        if headroom == 0 {
            tracing::debug!("Supply capped at {}, no providers added", self.max_supply);
            return;
        }
        let wanted = (projected - capacity).div_ceil(grant).min(headroom.div_ceil(grant));
        if list.contains(provider) {
            tracing::debug!("Raising supply providers to {wanted}");
        }
        list.push_or_raise(provider, wanted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::composition::CompositionSpec;
    use crate::math::Vec2Fixed;
    use crate::timeline::AttackGoal;
    use crate::world::{EnemyUnit, ScoreComponents, Side, UnitHandle};

    #[derive(Default)]
    struct Counts {
        owned: HashMap<UnitKindId, u32>,
        queued: HashMap<UnitKindId, u32>,
        units: HashMap<UnitHandle, UnitKindId>,
        supply_used: u32,
        supply_total: u32,
    }

    impl WorldView for Counts {
        fn frame(&self) -> u32 {
            0
        }
        fn owned_count(&self, kind: UnitKindId) -> u32 {
            self.owned.get(&kind).copied().unwrap_or(0)
        }
        fn completed_count(&self, kind: UnitKindId) -> u32 {
            self.owned_count(kind)
        }
        fn queued_count(&self, kind: UnitKindId) -> u32 {
            self.queued.get(&kind).copied().unwrap_or(0)
        }
        fn supply_used(&self) -> u32 {
            self.supply_used
        }
        fn supply_total(&self) -> u32 {
            self.supply_total
        }
        fn unit_kind(&self, handle: UnitHandle) -> Option<UnitKindId> {
            self.units.get(&handle).copied()
        }
        fn unit_health(&self, handle: UnitHandle) -> Option<i32> {
            self.units.get(&handle).map(|_| 100)
        }
        fn enemy_units(&self) -> Vec<EnemyUnit> {
            Vec::new()
        }
        fn home_position(&self) -> Option<Vec2Fixed> {
            None
        }
        fn score(&self, _side: Side) -> ScoreComponents {
            ScoreComponents::default()
        }
    }

    struct Kinds {
        probe: UnitKindId,
        nexus: UnitKindId,
        pylon: UnitKindId,
        gateway: UnitKindId,
        cyber: UnitKindId,
        zealot: UnitKindId,
        dragoon: UnitKindId,
    }

    fn registry() -> (UnitKindRegistry, Kinds) {
        let mut r = UnitKindRegistry::new();
        let probe = r.register(Race::Protoss, "probe", UnitRole::WORKER | UnitRole::GROUND);
        let nexus = r.register(
            Race::Protoss,
            "nexus",
            UnitRole::BUILDING | UnitRole::RESOURCE_DEPOT | UnitRole::SUPPLY_PROVIDER,
        );
        let pylon = r.register(Race::Protoss, "pylon", UnitRole::BUILDING | UnitRole::SUPPLY_PROVIDER);
        let gateway = r.register(Race::Protoss, "gateway", UnitRole::BUILDING);
        let cyber = r.register(Race::Protoss, "cybernetics_core", UnitRole::BUILDING);
        let zealot = r.register(Race::Protoss, "zealot", UnitRole::COMBATANT | UnitRole::GROUND);
        let dragoon = r.register(Race::Protoss, "dragoon", UnitRole::COMBATANT | UnitRole::GROUND);

        r.set_supply(probe, 2, 0);
        r.set_supply(nexus, 0, 18);
        r.set_supply(pylon, 0, 16);
        r.set_supply(zealot, 4, 0);
        r.set_supply(dragoon, 4, 0);
        r.add_prerequisite(pylon, probe);
        r.add_prerequisite(gateway, pylon);
        r.add_prerequisite(cyber, gateway);
        r.add_prerequisite(zealot, gateway);
        r.add_prerequisite(dragoon, gateway);
        r.add_prerequisite(dragoon, cyber);

        (
            r,
            Kinds {
                probe,
                nexus,
                pylon,
                gateway,
                cyber,
                zealot,
                dragoon,
            },
        )
    }

    fn roomy_world(k: &Kinds) -> Counts {
        let mut world = Counts {
            supply_used: 10,
            supply_total: 200,
            ..Counts::default()
        };
        world.owned.insert(k.probe, 5);
        world.owned.insert(k.nexus, 1);
        world
    }

    fn timeline(goals: &[(&str, &str)]) -> AttackPlanTimeline {
        AttackPlanTimeline::new(
            goals
                .iter()
                .map(|&(units, counts)| AttackGoal::new(0, CompositionSpec::new(units, counts)))
                .collect(),
        )
    }

    fn item(kind: UnitKindId, count: u32) -> BuildGoalItem {
        BuildGoalItem { kind, count }
    }

    #[test]
    fn test_deficit_subtracts_owned_and_queued() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.owned.insert(k.zealot, 2);
        world.queued.insert(k.zealot, 1);

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "6")]), &AttackRoster::new(), &world);

        assert_eq!(goal, vec![item(k.zealot, 3)]);
    }

    #[test]
    fn test_prerequisites_come_first_in_post_order() {
        let (r, k) = registry();
        let world = roomy_world(&k);

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("dragoon", "2")]), &AttackRoster::new(), &world);

        assert_eq!(
            goal,
            vec![
                item(k.pylon, 1),
                item(k.gateway, 1),
                item(k.cyber, 1),
                item(k.dragoon, 2),
            ]
        );
    }

    #[test]
    fn test_queued_prerequisite_not_emitted() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.queued.insert(k.pylon, 1);

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "1")]), &AttackRoster::new(), &world);

        assert_eq!(goal, vec![item(k.gateway, 1), item(k.zealot, 1)]);
    }

    #[test]
    fn test_roster_units_do_not_count_as_available() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.owned.insert(k.zealot, 4);
        let mut roster = AttackRoster::new();
        for i in 0..4 {
            world.units.insert(UnitHandle(i), k.zealot);
        }
        roster.extend([UnitHandle(0), UnitHandle(1)]);

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "4")]), &roster, &world);

        assert_eq!(goal, vec![item(k.zealot, 2)]);
    }

    #[test]
    fn test_kind_emitted_once_with_larger_count() {
        let (r, k) = registry();
        let world = roomy_world(&k);

        // Gateway is both a deficit and the zealot's prerequisite.
        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(
            &mut timeline(&[("zealot gateway", "1 3")]),
            &AttackRoster::new(),
            &world,
        );

        assert_eq!(
            goal,
            vec![item(k.pylon, 1), item(k.gateway, 3), item(k.zealot, 1)]
        );
    }

    #[test]
    fn test_supply_providers_appended() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.supply_used = 14;
        world.supply_total = 18;

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "3")]), &AttackRoster::new(), &world);
        assert_eq!(goal, vec![item(k.zealot, 3), item(k.pylon, 1)]);

        // 14 + 40 = 54 against 18: three more pylons.
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "10")]), &AttackRoster::new(), &world);
        assert_eq!(goal, vec![item(k.zealot, 10), item(k.pylon, 3)]);
    }

    #[test]
    fn test_queued_providers_count_toward_capacity() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.queued.insert(k.pylon, 1);
        world.supply_used = 14;
        world.supply_total = 18;

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "3")]), &AttackRoster::new(), &world);
        assert_eq!(goal, vec![item(k.zealot, 3)]);
    }

    #[test]
    fn test_provider_prerequisite_raised_not_duplicated() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.supply_used = 18;
        world.supply_total = 18;

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "10")]), &AttackRoster::new(), &world);

        assert_eq!(
            goal,
            vec![item(k.pylon, 3), item(k.gateway, 1), item(k.zealot, 10)]
        );
    }

    #[test]
    fn test_supply_never_exceeds_cap() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.supply_used = 390;
        world.supply_total = 396;

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "10")]), &AttackRoster::new(), &world);
        assert_eq!(goal, vec![item(k.zealot, 10), item(k.pylon, 1)]);

        world.supply_total = 400;
        let goal = resolver.compute_goal(&mut timeline(&[("zealot", "10")]), &AttackRoster::new(), &world);
        assert_eq!(goal, vec![item(k.zealot, 10)]);
    }

    #[test]
    fn test_satisfied_goal_advances_cursor() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.owned.insert(k.zealot, 2);
        let mut t = timeline(&[("zealot", "2"), ("zealot", "5")]);

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut t, &AttackRoster::new(), &world);

        assert_eq!(goal, vec![item(k.zealot, 3)]);
        assert_eq!(t.cursor(), 1);
    }

    #[test]
    fn test_satisfied_terminal_goal_is_empty() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.owned.insert(k.zealot, 5);
        let mut t = timeline(&[("zealot", "2"), ("zealot", "5")]);

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        assert!(resolver.compute_goal(&mut t, &AttackRoster::new(), &world).is_empty());
        assert_eq!(t.cursor(), 1);

        let mut empty = AttackPlanTimeline::default();
        assert!(resolver.compute_goal(&mut empty, &AttackRoster::new(), &world).is_empty());
    }

    #[test]
    fn test_look_ahead_keeps_cursor() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.owned.insert(k.zealot, 2);
        let mut t = timeline(&[("zealot", "2"), ("zealot", "5")]);
        let config = PlannerConfig {
            escalation: Escalation::LookAhead,
            ..PlannerConfig::default()
        };

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &config);
        let goal = resolver.compute_goal(&mut t, &AttackRoster::new(), &world);

        assert_eq!(goal, vec![item(k.zealot, 3)]);
        assert_eq!(t.cursor(), 0);
    }

    #[test]
    fn test_merge_pending_sums_remaining_goals() {
        let (r, k) = registry();
        let mut world = roomy_world(&k);
        world.owned.insert(k.pylon, 1);
        world.owned.insert(k.gateway, 1);
        world.owned.insert(k.cyber, 1);
        world.owned.insert(k.zealot, 2);
        let mut t = timeline(&[("zealot", "2"), ("zealot dragoon", "2 1")]);
        let config = PlannerConfig {
            composition_mode: CompositionMode::MergePending,
            ..PlannerConfig::default()
        };

        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &config);
        let goal = resolver.compute_goal(&mut t, &AttackRoster::new(), &world);

        assert_eq!(goal, vec![item(k.zealot, 2), item(k.dragoon, 1)]);
        assert_eq!(t.cursor(), 0);
    }

    #[test]
    fn test_worker_in_composition_is_terminal_prerequisite() {
        let (mut r, k) = registry();
        r.add_prerequisite(k.probe, k.nexus);
        r.add_prerequisite(k.nexus, k.probe);
        let world = Counts {
            supply_total: 200,
            ..Counts::default()
        };

        // The nexus still needs a probe even though probes are the goal.
        let resolver = BuildGoalResolver::new(&r, Race::Protoss, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("probe", "3")]), &AttackRoster::new(), &world);

        assert_eq!(goal, vec![item(k.probe, 3), item(k.nexus, 1)]);
    }

    #[test]
    fn test_prerequisite_cycle_terminates() {
        let mut r = UnitKindRegistry::new();
        let a = r.register(Race::Zerg, "a", UnitRole::BUILDING);
        let b = r.register(Race::Zerg, "b", UnitRole::BUILDING);
        let c = r.register(Race::Zerg, "c", UnitRole::COMBATANT);
        r.add_prerequisite(a, b);
        r.add_prerequisite(b, a);
        r.add_prerequisite(c, a);

        let resolver = BuildGoalResolver::new(&r, Race::Zerg, &PlannerConfig::default());
        let goal = resolver.compute_goal(&mut timeline(&[("c", "1")]), &AttackRoster::new(), &Counts::default());

        assert_eq!(goal.last(), Some(&item(c, 1)));
        let mut kinds: Vec<_> = goal.iter().map(|i| i.kind).collect();
        kinds.dedup();
        assert_eq!(kinds.len(), goal.len());
    }
}

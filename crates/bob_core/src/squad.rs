//! Attack squad assembly.
//!
//! When the active goal's frame arrives, the assembler tries to draft the
//! goal's whole composition from the free units. Either every military
//! kind is filled and the squad joins the roster, or nothing is drafted and
//! the goal is retried next tick.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::race::Race;
use crate::timeline::AttackPlanTimeline;
use crate::unit_kind::{UnitKindId, UnitKindRegistry};
use crate::world::{UnitHandle, WorldView};

/// Units cleared to attack.
///
/// Holds handles only. Units stay on the roster until they are destroyed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRoster {
    units: BTreeSet<UnitHandle>,
}

impl AttackRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a unit is on the roster.
    #[must_use]
    pub fn contains(&self, handle: UnitHandle) -> bool {
        self.units.contains(&handle)
    }

    /// Number of units on the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate handles in handle order.
    pub fn iter(&self) -> impl Iterator<Item = UnitHandle> + '_ {
        self.units.iter().copied()
    }

    /// Roster units of a kind that the world still knows.
    #[must_use]
    pub fn count_of_kind<W: WorldView + ?Sized>(&self, kind: UnitKindId, world: &W) -> u32 {
        self.units
            .iter()
            .filter(|&&handle| world.unit_kind(handle) == Some(kind))
            .count() as u32
    }

    /// Add units. Already present units are left alone.
    pub fn extend(&mut self, handles: impl IntoIterator<Item = UnitHandle>) {
        self.units.extend(handles);
    }

    /// Drop units that are dead or no longer known to the world.
    ///
    /// Returns the number of units removed.
    pub fn prune_destroyed<W: WorldView + ?Sized>(&mut self, world: &W) -> usize {
        let before = self.units.len();
        self.units
            .retain(|&handle| world.unit_health(handle).is_some_and(|hp| hp > 0));
        before - self.units.len()
    }
}

/// Result of one assembly attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    /// The active goal's frame has not been reached.
    NotYet {
        /// Frame the goal activates at.
        activation_frame: u32,
    },
    /// A kind could not be filled; nothing was drafted.
    Insufficient {
        /// First kind that fell short.
        kind: UnitKindId,
        /// Units wanted.
        wanted: u32,
        /// Units available.
        found: u32,
    },
    /// The squad was drafted and the timeline advanced.
    Committed {
        /// Units newly added to the roster.
        drafted: usize,
        /// Dead units pruned from the roster.
        pruned: usize,
    },
    /// There is no goal to assemble for.
    NoGoal,
}

/// Drafts squads for the active attack goal.
#[derive(Debug, Clone, Copy)]
pub struct AttackSquadAssembler<'a> {
    registry: &'a UnitKindRegistry,
    race: Race,
}

impl<'a> AttackSquadAssembler<'a> {
    /// Create an assembler over a registry.
    #[must_use]
    pub const fn new(registry: &'a UnitKindRegistry, race: Race) -> Self {
        Self { registry, race }
    }

    /// Try to draft the active goal's squad from `free_pool`.
    ///
    /// Units are taken in pool order. Buildings, add-ons, spells and workers
    /// in the composition are ignored. On success the roster is pruned of
    /// dead units, the squad is added, and the timeline advances; otherwise
    /// the roster is left exactly as it was.
    pub fn assemble<W: WorldView + ?Sized>(
        &self,
        timeline: &mut AttackPlanTimeline,
        roster: &mut AttackRoster,
        free_pool: &[UnitHandle],
        world: &W,
    ) -> Assembly {
        let Some(activation_frame) = timeline.desired_activation_frame() else {
            return Assembly::NoGoal;
        };
        if world.frame() < activation_frame {
            return Assembly::NotYet { activation_frame };
        }

        let wanted = timeline.active_composition(self.race, self.registry);
        let mut squad: Vec<UnitHandle> = Vec::new();

        for (kind, count) in wanted.iter() {
            if !self.registry.is_military(kind) {
                continue;
            }
            let drafted: Vec<UnitHandle> = free_pool
                .iter()
                .copied()
                .filter(|&handle| world.unit_kind(handle) == Some(kind))
                .take(count as usize)
                .collect();

            let found = drafted.len() as u32;
            if found < count {
                tracing::debug!(
                    "Squad short of {}: want {count}, have {found}",
                    self.registry.string_id(kind).unwrap_or("?")
                );
                return Assembly::Insufficient {
                    kind,
                    wanted: count,
                    found,
                };
            }
            squad.extend(drafted);
        }

        let pruned = roster.prune_destroyed(world);
        let before = roster.len();
        roster.extend(squad);
        let drafted = roster.len() - before;
        timeline.advance();

        tracing::info!(
            "Attack squad committed at frame {}: {drafted} drafted, roster {}",
            world.frame(),
            roster.len()
        );
        Assembly::Committed { drafted, pruned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::composition::CompositionSpec;
    use crate::math::Vec2Fixed;
    use crate::timeline::AttackGoal;
    use crate::unit_kind::UnitRole;
    use crate::world::{EnemyUnit, ScoreComponents, Side};

    #[derive(Default)]
    struct Units {
        frame: u32,
        units: HashMap<UnitHandle, (UnitKindId, i32)>,
    }

    impl WorldView for Units {
        fn frame(&self) -> u32 {
            self.frame
        }
        fn owned_count(&self, kind: UnitKindId) -> u32 {
            self.units.values().filter(|(k, _)| *k == kind).count() as u32
        }
        fn completed_count(&self, kind: UnitKindId) -> u32 {
            self.owned_count(kind)
        }
        fn queued_count(&self, _kind: UnitKindId) -> u32 {
            0
        }
        fn supply_used(&self) -> u32 {
            0
        }
        fn supply_total(&self) -> u32 {
            0
        }
        fn unit_kind(&self, handle: UnitHandle) -> Option<UnitKindId> {
            self.units.get(&handle).map(|(k, _)| *k)
        }
        fn unit_health(&self, handle: UnitHandle) -> Option<i32> {
            self.units.get(&handle).map(|(_, hp)| *hp)
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

    struct Fixture {
        registry: UnitKindRegistry,
        zealot: UnitKindId,
        dragoon: UnitKindId,
        world: Units,
    }

    fn fixture(frame: u32) -> Fixture {
        let mut registry = UnitKindRegistry::new();
        let probe = registry.register(Race::Protoss, "probe", UnitRole::WORKER);
        let zealot = registry.register(Race::Protoss, "zealot", UnitRole::COMBATANT);
        let dragoon = registry.register(Race::Protoss, "dragoon", UnitRole::COMBATANT);
        registry.register(Race::Protoss, "pylon", UnitRole::BUILDING);

        let mut world = Units {
            frame,
            ..Units::default()
        };
        for i in 1..=3 {
            world.units.insert(UnitHandle(i), (zealot, 100));
        }
        world.units.insert(UnitHandle(10), (dragoon, 100));
        world.units.insert(UnitHandle(20), (probe, 40));

        Fixture {
            registry,
            zealot,
            dragoon,
            world,
        }
    }

    fn timeline(goals: &[(u32, &str, &str)]) -> AttackPlanTimeline {
        AttackPlanTimeline::new(
            goals
                .iter()
                .map(|&(frame, units, counts)| AttackGoal::new(frame, CompositionSpec::new(units, counts)))
                .collect(),
        )
    }

    fn pool() -> Vec<UnitHandle> {
        vec![
            UnitHandle(1),
            UnitHandle(2),
            UnitHandle(3),
            UnitHandle(10),
            UnitHandle(20),
        ]
    }

    #[test]
    fn test_assembly_success_takes_first_in_pool_order() {
        let f = fixture(1000);
        let mut t = timeline(&[(900, "zealot", "2"), (5000, "dragoon", "1")]);
        let mut roster = AttackRoster::new();

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &pool(),
            &f.world,
        );

        assert_eq!(
            result,
            Assembly::Committed {
                drafted: 2,
                pruned: 0
            }
        );
        assert_eq!(
            roster.iter().collect::<Vec<_>>(),
            vec![UnitHandle(1), UnitHandle(2)]
        );
        assert_eq!(t.cursor(), 1);
        assert_eq!(roster.count_of_kind(f.zealot, &f.world), 2);
    }

    #[test]
    fn test_assembly_insufficient_leaves_roster_unchanged() {
        let f = fixture(1000);
        let mut t = timeline(&[(900, "zealot", "5")]);
        let mut roster = AttackRoster::new();

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &pool(),
            &f.world,
        );

        assert_eq!(
            result,
            Assembly::Insufficient {
                kind: f.zealot,
                wanted: 5,
                found: 3
            }
        );
        assert!(roster.is_empty());
        assert_eq!(t.cursor(), 0);
    }

    #[test]
    fn test_all_or_nothing_across_kinds() {
        let f = fixture(1000);
        let mut t = timeline(&[(900, "zealot dragoon", "2 2")]);
        let mut roster = AttackRoster::new();
        roster.extend([UnitHandle(3)]);

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &[UnitHandle(1), UnitHandle(2), UnitHandle(10)],
            &f.world,
        );

        assert!(matches!(result, Assembly::Insufficient { kind, .. } if kind == f.dragoon));
        assert_eq!(roster.iter().collect::<Vec<_>>(), vec![UnitHandle(3)]);
    }

    #[test]
    fn test_not_yet_before_activation_frame() {
        let f = fixture(899);
        let mut t = timeline(&[(900, "zealot", "1")]);
        let mut roster = AttackRoster::new();

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &pool(),
            &f.world,
        );

        assert_eq!(
            result,
            Assembly::NotYet {
                activation_frame: 900
            }
        );
        assert!(roster.is_empty());
    }

    #[test]
    fn test_non_military_kinds_ignored() {
        let f = fixture(1000);
        let mut t = timeline(&[(0, "probe pylon zealot", "10 3 1")]);
        let mut roster = AttackRoster::new();

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &pool(),
            &f.world,
        );

        assert!(matches!(result, Assembly::Committed { drafted: 1, .. }));
        assert!(!roster.contains(UnitHandle(20)));
    }

    #[test]
    fn test_success_prunes_dead_and_keeps_survivors() {
        let mut f = fixture(1000);
        f.world.units.insert(UnitHandle(50), (f.zealot, 0));
        let mut t = timeline(&[(0, "dragoon", "1")]);
        let mut roster = AttackRoster::new();
        roster.extend([UnitHandle(50), UnitHandle(51), UnitHandle(1)]);

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &[UnitHandle(10)],
            &f.world,
        );

        // 50 is dead, 51 is unknown to the world.
        assert_eq!(
            result,
            Assembly::Committed {
                drafted: 1,
                pruned: 2
            }
        );
        assert_eq!(
            roster.iter().collect::<Vec<_>>(),
            vec![UnitHandle(1), UnitHandle(10)]
        );
    }

    #[test]
    fn test_union_is_idempotent() {
        let f = fixture(1000);
        let mut t = timeline(&[(0, "zealot", "1"), (0, "zealot", "1")]);
        let mut roster = AttackRoster::new();
        roster.extend([UnitHandle(1)]);

        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &[UnitHandle(1)],
            &f.world,
        );
        assert_eq!(
            result,
            Assembly::Committed {
                drafted: 0,
                pruned: 0
            }
        );
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_terminal_goal_keeps_assembling() {
        let f = fixture(1000);
        let mut t = timeline(&[(0, "zealot", "1")]);
        let mut roster = AttackRoster::new();
        let assembler = AttackSquadAssembler::new(&f.registry, Race::Protoss);

        assembler.assemble(&mut t, &mut roster, &[UnitHandle(1)], &f.world);
        assembler.assemble(&mut t, &mut roster, &[UnitHandle(2)], &f.world);

        assert_eq!(t.cursor(), 0);
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_empty_timeline_has_no_goal() {
        let f = fixture(1000);
        let mut t = AttackPlanTimeline::default();
        let mut roster = AttackRoster::new();
        let result = AttackSquadAssembler::new(&f.registry, Race::Protoss).assemble(
            &mut t,
            &mut roster,
            &pool(),
            &f.world,
        );
        assert_eq!(result, Assembly::NoGoal);
    }
}

//! A toy match the planner can be run against.
//!
//! The sandbox knows just enough about the game to give the planner
//! realistic answers: production takes time and supply, prerequisites must
//! be complete, and a scripted opponent raids early and grows an abstract
//! army. Fights are settled by comparing supply-weighted power. It is a
//! test bench for the decision core, not a game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bob_core::build_goal::BuildGoalItem;
use bob_core::math::Vec2Fixed;
use bob_core::race::Race;
use bob_core::squad::AttackRoster;
use bob_core::unit_kind::{UnitKindId, UnitKindRegistry, UnitRole};
use bob_core::world::{EnemyUnit, ScoreComponents, Side, UnitHandle, WorldView};

/// Frames per game minute.
pub const FRAMES_PER_MINUTE: u32 = 24 * 60;

const UNIT_BUILD_FRAMES: u32 = 480;
const BUILDING_BUILD_FRAMES: u32 = 720;
const RAID_DURATION: u32 = 480;
const STARTING_WORKERS: u32 = 4;
const ENEMY_HANDLE_BASE: u32 = 1_000_000;

/// Scripted opponent behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentProfile {
    /// Opponent name, used as the outcome record key.
    pub name: String,
    /// Opponent race.
    pub race: Race,
    /// Unit kind the opponent raids and fights with.
    pub raid_kind: String,
    /// Frame of the early raid.
    pub raid_frame: u32,
    /// Number of raiders; 0 disables the raid.
    pub raid_size: u32,
    /// Army power the opponent gains per game minute.
    pub growth_per_minute: u32,
}

impl OpponentProfile {
    /// Names of the built-in profiles.
    pub const NAMES: [&'static str; 3] = ["zerg_rush", "zerg_macro", "terran_turtle"];

    /// A built-in profile by name.
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        let (race, raid_kind, raid_frame, raid_size, growth_per_minute) = match name {
            "zerg_rush" => (Race::Zerg, "zergling", 2 * FRAMES_PER_MINUTE, 8, 3),
            "zerg_macro" => (Race::Zerg, "zergling", 6 * FRAMES_PER_MINUTE, 4, 8),
            "terran_turtle" => (Race::Terran, "marine", 0, 0, 6),
            _ => return None,
        };
        Some(Self {
            name: name.to_string(),
            race,
            raid_kind: raid_kind.to_string(),
            raid_frame,
            raid_size,
            growth_per_minute,
        })
    }
}

/// How a sandbox match ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SandboxResult {
    /// The attack broke the opponent.
    Victory,
    /// The base was overrun.
    Defeat,
}

#[derive(Debug, Clone, Copy)]
struct SandboxUnit {
    kind: UnitKindId,
    health: i32,
    completed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Production {
    kind: UnitKindId,
    handle: UnitHandle,
    remaining: u32,
}

/// The sandbox world.
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    registry: UnitKindRegistry,
    race: Race,
    opponent: OpponentProfile,
    raid_kind: Option<UnitKindId>,
    frame: u32,
    units: BTreeMap<UnitHandle, SandboxUnit>,
    production: Vec<Production>,
    next_handle: u32,
    enemies: Vec<EnemyUnit>,
    enemy_power: u32,
    own_score: ScoreComponents,
    enemy_score: ScoreComponents,
    result: Option<SandboxResult>,
}

impl SandboxWorld {
    /// Start a match: one resource depot and a few workers for `race`.
    #[must_use]
    pub fn new(registry: UnitKindRegistry, race: Race, opponent: OpponentProfile) -> Self {
        let raid_kind = registry.resolve_token(opponent.race, &opponent.raid_kind);
        let mut world = Self {
            registry,
            race,
            opponent,
            raid_kind,
            frame: 0,
            units: BTreeMap::new(),
            production: Vec::new(),
            next_handle: 1,
            enemies: Vec::new(),
            enemy_power: 0,
            own_score: ScoreComponents::default(),
            enemy_score: ScoreComponents::default(),
            result: None,
        };

        let depot = world.first_with_role(UnitRole::RESOURCE_DEPOT);
        let worker = world.first_with_role(UnitRole::WORKER);
        if let Some(depot) = depot {
            world.spawn(depot, true);
        }
        if let Some(worker) = worker {
            for _ in 0..STARTING_WORKERS {
                world.spawn(worker, true);
            }
        }
        world
    }

    fn first_with_role(&self, role: UnitRole) -> Option<UnitKindId> {
        self.registry
            .by_race(self.race)
            .find(|info| info.role.contains(role))
            .map(|info| info.id)
    }

    fn spawn(&mut self, kind: UnitKindId, completed: bool) -> UnitHandle {
        let handle = UnitHandle(self.next_handle);
        self.next_handle += 1;
        self.units.insert(
            handle,
            SandboxUnit {
                kind,
                health: 100,
                completed,
            },
        );
        handle
    }

    /// The opponent being played.
    #[must_use]
    pub fn opponent(&self) -> &OpponentProfile {
        &self.opponent
    }

    /// How the match ended, if it has.
    #[must_use]
    pub const fn result(&self) -> Option<SandboxResult> {
        self.result
    }

    /// Opponent army power.
    #[must_use]
    pub const fn enemy_power(&self) -> u32 {
        self.enemy_power
    }

    /// Number of units and buildings in production.
    #[must_use]
    pub fn in_production(&self) -> usize {
        self.production.len()
    }

    fn alive(&self) -> impl Iterator<Item = (UnitHandle, &SandboxUnit)> + '_ {
        self.units
            .iter()
            .filter(|(_, unit)| unit.health > 0)
            .map(|(&handle, unit)| (handle, unit))
    }

    fn production_slots(&self) -> usize {
        let producers = self
            .alive()
            .filter(|(_, unit)| unit.completed && self.registry.role(unit.kind).contains(UnitRole::BUILDING))
            .count();
        1 + producers
    }

    fn prerequisites_met(&self, kind: UnitKindId) -> bool {
        self.registry
            .prerequisites(kind)
            .iter()
            .all(|&prereq| self.completed_count(prereq) > 0)
    }

    fn queued_supply(&self) -> u32 {
        self.production
            .iter()
            .map(|p| self.registry.supply_cost(p.kind))
            .sum()
    }

    /// Start producing the build goal, front to back.
    ///
    /// Stops at the first item that cannot be started, so later items never
    /// jump ahead of their prerequisites. Returns the number started.
    pub fn produce(&mut self, goal: &[BuildGoalItem]) -> usize {
        let mut started = 0;
        for item in goal {
            for _ in 0..item.count {
                let cost = self.registry.supply_cost(item.kind);
                let fits = cost == 0 || self.supply_used() + self.queued_supply() + cost <= self.supply_total();
                if self.production.len() >= self.production_slots()
                    || !fits
                    || !self.prerequisites_met(item.kind)
                {
                    return started;
                }

                let building = self.registry.role(item.kind).contains(UnitRole::BUILDING);
                let handle = self.spawn(item.kind, false);
                self.production.push(Production {
                    kind: item.kind,
                    handle,
                    remaining: if building {
                        BUILDING_BUILD_FRAMES
                    } else {
                        UNIT_BUILD_FRAMES
                    },
                });
                started += 1;
            }
        }
        started
    }

    /// Advance time: finish production and run the opponent's script.
    pub fn advance(&mut self, frames: u32) {
        let before = self.frame;
        self.frame += frames;

        let mut finished = Vec::new();
        self.production.retain_mut(|p| {
            p.remaining = p.remaining.saturating_sub(frames);
            if p.remaining == 0 {
                finished.push((p.handle, p.kind));
                false
            } else {
                true
            }
        });
        for (handle, kind) in finished {
            if let Some(unit) = self.units.get_mut(&handle) {
                unit.completed = true;
            }
            if self.registry.role(kind).contains(UnitRole::BUILDING) {
                self.own_score.building += 50;
            } else {
                self.own_score.unit += i64::from(self.registry.supply_cost(kind).max(1)) * 25;
            }
        }

        let minutes = self.frame / FRAMES_PER_MINUTE - before / FRAMES_PER_MINUTE;
        self.enemy_power += minutes * self.opponent.growth_per_minute;
        self.enemy_score.unit += i64::from(minutes * self.opponent.growth_per_minute) * 25;

        self.run_raid(before);
    }

    fn run_raid(&mut self, before: u32) {
        if self.opponent.raid_size == 0 {
            return;
        }
        let Some(raid_kind) = self.raid_kind else {
            return;
        };

        let start = self.opponent.raid_frame;
        if before < start && self.frame >= start {
            tracing::debug!(frame = self.frame, size = self.opponent.raid_size, "Enemy raid arrives");
            self.enemies = (0..self.opponent.raid_size)
                .map(|i| EnemyUnit {
                    handle: UnitHandle(ENEMY_HANDLE_BASE + i),
                    kind: raid_kind,
                    position: Vec2Fixed::from_pixels(120 + 10 * i as i32, 80),
                })
                .collect();
        }

        let end = start + RAID_DURATION;
        if before < end && self.frame >= end && !self.enemies.is_empty() {
            self.settle_raid();
        }
    }

    fn settle_raid(&mut self) {
        let raiders = self.enemies.len() as u32;
        let defenders: u32 = self
            .alive()
            .filter(|(_, unit)| unit.completed && self.registry.is_military(unit.kind))
            .map(|(_, unit)| self.registry.supply_cost(unit.kind).max(1))
            .sum();
        self.enemies.clear();

        if defenders >= raiders * 2 {
            tracing::debug!(defenders, raiders, "Raid repelled");
            self.own_score.kill += i64::from(raiders) * 50;
            return;
        }

        tracing::debug!(defenders, raiders, "Raid broke through");
        self.enemy_power += raiders;
        let workers: Vec<UnitHandle> = self
            .alive()
            .filter(|(_, unit)| self.registry.role(unit.kind).contains(UnitRole::WORKER))
            .map(|(handle, _)| handle)
            .collect();
        let killed = workers.len().div_ceil(2);
        for handle in workers.iter().take(killed) {
            self.kill(*handle);
        }
        self.enemy_score.kill += killed as i64 * 50;
        if defenders == 0 {
            self.result = Some(SandboxResult::Defeat);
        }
    }

    fn kill(&mut self, handle: UnitHandle) {
        if let Some(unit) = self.units.get_mut(&handle) {
            unit.health = 0;
        }
    }

    /// Completed military units not on the roster, in handle order.
    #[must_use]
    pub fn free_military(&self, roster: &AttackRoster) -> Vec<UnitHandle> {
        self.alive()
            .filter(|(handle, unit)| {
                unit.completed && self.registry.is_military(unit.kind) && !roster.contains(*handle)
            })
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Send the roster at the opponent's army.
    ///
    /// Enough power ends the match; otherwise both sides trade and some
    /// roster units die.
    pub fn engage(&mut self, roster: &AttackRoster) {
        if self.result.is_some() {
            return;
        }
        let attackers: Vec<(UnitHandle, u32)> = roster
            .iter()
            .filter_map(|handle| {
                let unit = self.units.get(&handle).filter(|unit| unit.health > 0)?;
                Some((handle, self.registry.supply_cost(unit.kind).max(1)))
            })
            .collect();
        let power: u32 = attackers.iter().map(|(_, p)| p).sum();
        if power == 0 {
            return;
        }

        if power > self.enemy_power * 2 {
            tracing::debug!(power, enemy = self.enemy_power, "Attack broke the opponent");
            self.own_score.razing += 1000;
            self.result = Some(SandboxResult::Victory);
            return;
        }

        let dealt = (power / 2).min(self.enemy_power);
        self.enemy_power -= dealt;
        self.own_score.kill += i64::from(dealt) * 25;

        let mut taken = 0;
        for &(handle, p) in &attackers {
            if taken >= dealt {
                break;
            }
            self.kill(handle);
            taken += p;
        }
        self.enemy_score.kill += i64::from(taken) * 25;
    }
}

impl WorldView for SandboxWorld {
    fn frame(&self) -> u32 {
        self.frame
    }

    fn owned_count(&self, kind: UnitKindId) -> u32 {
        self.alive()
            .filter(|(handle, unit)| {
                unit.kind == kind && !self.production.iter().any(|p| p.handle == *handle)
            })
            .count() as u32
    }

    fn completed_count(&self, kind: UnitKindId) -> u32 {
        self.alive()
            .filter(|(_, unit)| unit.kind == kind && unit.completed)
            .count() as u32
    }

    fn queued_count(&self, kind: UnitKindId) -> u32 {
        self.production.iter().filter(|p| p.kind == kind).count() as u32
    }

    fn supply_used(&self) -> u32 {
        self.alive()
            .filter(|(_, unit)| unit.completed)
            .map(|(_, unit)| self.registry.supply_cost(unit.kind))
            .sum()
    }

    fn supply_total(&self) -> u32 {
        let total: u32 = self
            .alive()
            .filter(|(_, unit)| unit.completed)
            .map(|(_, unit)| self.registry.supply_provided(unit.kind))
            .sum();
        total.min(400)
    }

    fn unit_kind(&self, handle: UnitHandle) -> Option<UnitKindId> {
        self.units.get(&handle).map(|unit| unit.kind)
    }

    fn unit_health(&self, handle: UnitHandle) -> Option<i32> {
        self.units.get(&handle).map(|unit| unit.health)
    }

    fn enemy_units(&self) -> Vec<EnemyUnit> {
        self.enemies.clone()
    }

    fn home_position(&self) -> Option<Vec2Fixed> {
        Some(Vec2Fixed::ZERO)
    }

    fn score(&self, side: Side) -> ScoreComponents {
        match side {
            Side::Own => self.own_score,
            Side::Enemy => self.enemy_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bob_test_utils::fixtures::{full_registry, kind};

    fn world(opponent: &str) -> SandboxWorld {
        let profile = OpponentProfile::named(opponent).unwrap();
        SandboxWorld::new(full_registry(), Race::Protoss, profile)
    }

    #[test]
    fn test_starting_base() {
        let w = world("terran_turtle");
        let registry = full_registry();
        assert_eq!(w.completed_count(kind(&registry, "nexus")), 1);
        assert_eq!(w.completed_count(kind(&registry, "probe")), 4);
        assert_eq!(w.supply_used(), 8);
        assert_eq!(w.supply_total(), 18);
    }

    #[test]
    fn test_production_respects_prerequisites_and_time() {
        let mut w = world("terran_turtle");
        let registry = full_registry();
        let pylon = kind(&registry, "pylon");
        let gateway = kind(&registry, "gateway");

        let goal = [
            BuildGoalItem { kind: pylon, count: 1 },
            BuildGoalItem { kind: gateway, count: 1 },
        ];
        assert_eq!(w.produce(&goal), 1);
        assert_eq!(w.queued_count(pylon), 1);
        assert_eq!(w.owned_count(pylon), 0);

        w.advance(BUILDING_BUILD_FRAMES);
        assert_eq!(w.completed_count(pylon), 1);
        assert_eq!(w.supply_total(), 34);
        assert_eq!(w.produce(&goal[1..]), 1);
    }

    #[test]
    fn test_unknown_profile() {
        assert!(OpponentProfile::named("nobody").is_none());
        for name in OpponentProfile::NAMES {
            assert!(OpponentProfile::named(name).is_some());
        }
    }

    #[test]
    fn test_undefended_raid_is_defeat() {
        let mut w = world("zerg_rush");
        w.advance(2 * FRAMES_PER_MINUTE);
        assert_eq!(w.enemy_units().len(), 8);
        w.advance(RAID_DURATION);
        assert!(w.enemy_units().is_empty());
        assert_eq!(w.result(), Some(SandboxResult::Defeat));
    }

    #[test]
    fn test_strong_attack_wins() {
        let mut w = world("terran_turtle");
        let registry = full_registry();
        let zealot = kind(&registry, "zealot");
        let mut roster = AttackRoster::new();
        roster.extend((0..4).map(|_| w.spawn(zealot, true)));

        w.advance(FRAMES_PER_MINUTE);
        assert_eq!(w.enemy_power(), 6);
        w.engage(&roster);
        assert_eq!(w.result(), Some(SandboxResult::Victory));
    }

    #[test]
    fn test_weak_attack_trades() {
        let mut w = world("terran_turtle");
        let registry = full_registry();
        let zealot = kind(&registry, "zealot");
        let mut roster = AttackRoster::new();
        roster.extend([w.spawn(zealot, true)]);

        w.advance(3 * FRAMES_PER_MINUTE);
        w.engage(&roster);
        assert_eq!(w.result(), None);
        assert_eq!(w.enemy_power(), 16);
        assert_eq!(w.free_military(&AttackRoster::new()), Vec::<UnitHandle>::new());
    }
}

//! Test fixtures and helpers.
//!
//! A scriptable world, the shipped unit data and an in-memory outcome
//! store, for consistent testing.

use std::collections::{BTreeMap, HashMap};

use fixed::types::I32F32;

use bob_core::data::RaceUnitData;
use bob_core::error::{PlannerError, Result};
use bob_core::math::Vec2Fixed;
use bob_core::race::Race;
use bob_core::strategy::{OutcomeStore, StrategyRecord};
use bob_core::unit_kind::{UnitKindId, UnitKindRegistry};
use bob_core::world::{EnemyUnit, ScoreComponents, Side, UnitHandle, WorldView};

/// Shipped Protoss unit data.
pub const PROTOSS_UNITS: &str = include_str!("../../../assets/data/units/protoss.ron");
/// Shipped Terran unit data.
pub const TERRAN_UNITS: &str = include_str!("../../../assets/data/units/terran.ron");
/// Shipped Zerg unit data.
pub const ZERG_UNITS: &str = include_str!("../../../assets/data/units/zerg.ron");

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

fn parse_units(ron: &str) -> RaceUnitData {
    ron::from_str(ron).unwrap_or_else(|e| panic!("shipped unit data does not parse: {e}"))
}

/// Registry holding the shipped Protoss kinds only.
///
/// # Panics
///
/// Panics if the shipped data is invalid.
#[must_use]
pub fn protoss_registry() -> UnitKindRegistry {
    UnitKindRegistry::from_data(&[parse_units(PROTOSS_UNITS)])
        .unwrap_or_else(|e| panic!("shipped Protoss data is invalid: {e}"))
}

/// Registry holding the shipped kinds of every race.
///
/// # Panics
///
/// Panics if the shipped data is invalid.
#[must_use]
pub fn full_registry() -> UnitKindRegistry {
    let sets = [
        parse_units(PROTOSS_UNITS),
        parse_units(TERRAN_UNITS),
        parse_units(ZERG_UNITS),
    ];
    UnitKindRegistry::from_data(&sets).unwrap_or_else(|e| panic!("shipped data is invalid: {e}"))
}

/// Look up a kind by name in any race.
///
/// # Panics
///
/// Panics if no race defines `name`.
#[must_use]
pub fn kind(registry: &UnitKindRegistry, name: &str) -> UnitKindId {
    Race::ALL
        .into_iter()
        .find_map(|race| registry.find(race, name))
        .unwrap_or_else(|| panic!("no unit kind named '{name}'"))
}

#[derive(Debug, Clone, Copy)]
struct OwnUnit {
    kind: UnitKindId,
    health: i32,
    completed: bool,
}

/// A scriptable [`WorldView`].
///
/// Handles are assigned in spawn order starting at 1.
#[derive(Debug, Clone)]
pub struct FixtureWorld {
    frame: u32,
    units: BTreeMap<UnitHandle, OwnUnit>,
    queued: HashMap<UnitKindId, u32>,
    supply_used: u32,
    supply_total: u32,
    enemies: Vec<EnemyUnit>,
    home: Option<Vec2Fixed>,
    own_score: ScoreComponents,
    enemy_score: ScoreComponents,
    next_handle: u32,
}

impl Default for FixtureWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureWorld {
    /// Empty world at frame 0 with 400 supply available.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame: 0,
            units: BTreeMap::new(),
            queued: HashMap::new(),
            supply_used: 0,
            supply_total: 400,
            enemies: Vec::new(),
            home: Some(Vec2Fixed::ZERO),
            own_score: ScoreComponents::default(),
            enemy_score: ScoreComponents::default(),
            next_handle: 1,
        }
    }

    /// Set the current frame.
    pub fn set_frame(&mut self, frame: u32) -> &mut Self {
        self.frame = frame;
        self
    }

    /// Add a completed unit with 100 hit points.
    pub fn spawn(&mut self, kind: UnitKindId) -> UnitHandle {
        self.insert(kind, true)
    }

    /// Add `count` completed units.
    pub fn spawn_many(&mut self, kind: UnitKindId, count: u32) -> Vec<UnitHandle> {
        (0..count).map(|_| self.spawn(kind)).collect()
    }

    /// Add a unit still under construction.
    pub fn spawn_incomplete(&mut self, kind: UnitKindId) -> UnitHandle {
        self.insert(kind, false)
    }

    fn insert(&mut self, kind: UnitKindId, completed: bool) -> UnitHandle {
        let handle = UnitHandle(self.next_handle);
        self.next_handle += 1;
        self.units.insert(
            handle,
            OwnUnit {
                kind,
                health: 100,
                completed,
            },
        );
        handle
    }

    /// Set a unit's hit points. Zero or less reads as dead.
    pub fn set_health(&mut self, handle: UnitHandle, health: i32) -> &mut Self {
        if let Some(unit) = self.units.get_mut(&handle) {
            unit.health = health;
        }
        self
    }

    /// Remove a unit entirely, as if the game forgot it.
    pub fn remove(&mut self, handle: UnitHandle) -> &mut Self {
        self.units.remove(&handle);
        self
    }

    /// Set how many of a kind are queued.
    pub fn queue(&mut self, kind: UnitKindId, count: u32) -> &mut Self {
        self.queued.insert(kind, count);
        self
    }

    /// Set supply used and available.
    pub fn set_supply(&mut self, used: u32, total: u32) -> &mut Self {
        self.supply_used = used;
        self.supply_total = total;
        self
    }

    /// Place an enemy unit at pixel coordinates.
    pub fn add_enemy(&mut self, kind: UnitKindId, x: i32, y: i32) -> &mut Self {
        let handle = UnitHandle(10_000 + self.enemies.len() as u32);
        self.enemies.push(EnemyUnit {
            handle,
            kind,
            position: Vec2Fixed::from_pixels(x, y),
        });
        self
    }

    /// Remove every enemy unit.
    pub fn clear_enemies(&mut self) -> &mut Self {
        self.enemies.clear();
        self
    }

    /// Set or clear the home position.
    pub fn set_home(&mut self, home: Option<Vec2Fixed>) -> &mut Self {
        self.home = home;
        self
    }

    /// Set the score of one side.
    pub fn set_score(&mut self, side: Side, score: ScoreComponents) -> &mut Self {
        match side {
            Side::Own => self.own_score = score,
            Side::Enemy => self.enemy_score = score,
        }
        self
    }

    /// Handles of all living own units, in handle order.
    #[must_use]
    pub fn handles(&self) -> Vec<UnitHandle> {
        self.units
            .iter()
            .filter(|(_, unit)| unit.health > 0)
            .map(|(&handle, _)| handle)
            .collect()
    }
}

impl WorldView for FixtureWorld {
    fn frame(&self) -> u32 {
        self.frame
    }

    fn owned_count(&self, kind: UnitKindId) -> u32 {
        self.units
            .values()
            .filter(|unit| unit.kind == kind && unit.health > 0)
            .count() as u32
    }

    fn completed_count(&self, kind: UnitKindId) -> u32 {
        self.units
            .values()
            .filter(|unit| unit.kind == kind && unit.health > 0 && unit.completed)
            .count() as u32
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
        self.units.get(&handle).map(|unit| unit.kind)
    }

    fn unit_health(&self, handle: UnitHandle) -> Option<i32> {
        self.units.get(&handle).map(|unit| unit.health)
    }

    fn enemy_units(&self) -> Vec<EnemyUnit> {
        self.enemies.clone()
    }

    fn home_position(&self) -> Option<Vec2Fixed> {
        self.home
    }

    fn score(&self, side: Side) -> ScoreComponents {
        match side {
            Side::Own => self.own_score,
            Side::Enemy => self.enemy_score,
        }
    }
}

/// [`OutcomeStore`] kept in memory.
///
/// Stores what the file store writes, loss counts only, so round trips
/// behave the same way.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutcomeStore {
    losses: HashMap<String, Vec<u32>>,
    saves: usize,
    failing: bool,
}

impl MemoryOutcomeStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Seed the stored losses for an opponent.
    pub fn insert(&mut self, opponent: &str, losses: Vec<u32>) {
        self.losses.insert(opponent.to_string(), losses);
    }

    /// Stored losses for an opponent.
    #[must_use]
    pub fn losses(&self, opponent: &str) -> Option<&[u32]> {
        self.losses.get(opponent).map(Vec::as_slice)
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl OutcomeStore for MemoryOutcomeStore {
    fn load_losses(&mut self, opponent: &str) -> Result<Option<Vec<u32>>> {
        if self.failing {
            return Err(PlannerError::Store(format!("cannot read record for {opponent}")));
        }
        Ok(self.losses.get(opponent).cloned())
    }

    fn save(&mut self, opponent: &str, records: &[StrategyRecord]) -> Result<()> {
        if self.failing {
            return Err(PlannerError::Store(format!("cannot write record for {opponent}")));
        }
        tracing::debug!("Storing {} records for {opponent}", records.len());
        self.losses.insert(
            opponent.to_string(),
            records.iter().map(|record| record.losses).collect(),
        );
        self.saves += 1;
        Ok(())
    }
}

//! Coarse tactical decisions: when to start attacking, when workers must
//! fight, whether an early rush is underway, and when a squad should
//! regroup.

use crate::config::TacticsConfig;
use crate::race::Race;
use crate::unit_kind::{UnitKindId, UnitKindRegistry};
use crate::world::{UnitHandle, WorldView};

fn resolve_kinds(registry: &UnitKindRegistry, race: Race, names: &[String]) -> Vec<UnitKindId> {
    names
        .iter()
        .filter_map(|name| {
            let kind = registry.resolve_token(race, name);
            if kind.is_none() {
                tracing::warn!("Unknown unit kind '{name}' in tactics config, ignored");
            }
            kind
        })
        .collect()
}

/// Decides when the bot goes on the offensive.
///
/// Once it says yes it keeps saying yes for the rest of the match.
#[derive(Debug, Clone)]
pub struct AttackTrigger {
    trigger_kinds: Vec<UnitKindId>,
    min_force: usize,
    latched: bool,
}

impl AttackTrigger {
    /// Create a trigger from the tactics config.
    #[must_use]
    pub fn new(registry: &UnitKindRegistry, race: Race, config: &TacticsConfig) -> Self {
        Self {
            trigger_kinds: resolve_kinds(registry, race, &config.attack_trigger_kinds),
            min_force: config.min_attack_force,
            latched: false,
        }
    }

    /// Whether attacking has been triggered.
    #[must_use]
    pub const fn is_latched(&self) -> bool {
        self.latched
    }

    /// Check the trigger: a trigger kind has completed, or the free
    /// military force has reached the configured size.
    pub fn should_attack<W: WorldView + ?Sized>(
        &mut self,
        registry: &UnitKindRegistry,
        free_units: &[UnitHandle],
        world: &W,
    ) -> bool {
        if self.latched {
            return true;
        }

        let trigger_ready = self
            .trigger_kinds
            .iter()
            .any(|&kind| world.completed_count(kind) > 0);
        let force = free_units
            .iter()
            .filter(|&&handle| {
                world
                    .unit_kind(handle)
                    .is_some_and(|kind| registry.is_military(kind))
            })
            .count();

        if trigger_ready || (self.min_force > 0 && force >= self.min_force) {
            tracing::info!(
                frame = world.frame(),
                force,
                "Attack triggered"
            );
            self.latched = true;
        }
        self.latched
    }
}

/// Watches the area around home for threats.
#[derive(Debug, Clone)]
pub struct ThreatAssessor {
    worker_defense: bool,
    defense_radius: i32,
    threat_kinds: Vec<UnitKindId>,
    rush_window_frame: u32,
    rush_radius: i32,
}

impl ThreatAssessor {
    /// Create an assessor from the tactics config.
    ///
    /// Threat kinds belong to the enemy, so they may resolve to any race.
    #[must_use]
    pub fn new(registry: &UnitKindRegistry, race: Race, config: &TacticsConfig) -> Self {
        Self {
            worker_defense: config.worker_defense,
            defense_radius: config.defense_radius,
            threat_kinds: resolve_kinds(registry, race, &config.worker_threat_kinds),
            rush_window_frame: config.rush_window_frame,
            rush_radius: config.rush_radius,
        }
    }

    /// Number of threatening enemies close enough that workers should
    /// fight. Zero when worker defense is disabled or home is unknown.
    #[must_use]
    pub fn worker_defense_threat<W: WorldView + ?Sized>(&self, world: &W) -> usize {
        if !self.worker_defense {
            return 0;
        }
        let Some(home) = world.home_position() else {
            return 0;
        };
        world
            .enemy_units()
            .iter()
            .filter(|enemy| self.threat_kinds.contains(&enemy.kind))
            .filter(|enemy| enemy.position.within(home, self.defense_radius))
            .count()
    }

    /// Whether enemy combatants are near home before the rush window
    /// closes.
    #[must_use]
    pub fn rush_detected<W: WorldView + ?Sized>(&self, registry: &UnitKindRegistry, world: &W) -> bool {
        if world.frame() >= self.rush_window_frame {
            return false;
        }
        let Some(home) = world.home_position() else {
            return false;
        };
        world.enemy_units().iter().any(|enemy| {
            registry.is_military(enemy.kind) && enemy.position.within(home, self.rush_radius)
        })
    }
}

/// Whether a squad is too spread out to keep advancing.
///
/// True when fewer than `percent` percent of `squad_size` units are inside
/// the gathering radius. An empty squad never regroups.
#[must_use]
pub fn should_regroup(in_radius: usize, squad_size: usize, percent: u32) -> bool {
    if squad_size == 0 {
        return false;
    }
    (in_radius as u64) * 100 < (squad_size as u64) * u64::from(percent)
}

//! Unit kind identity, classification and tech requirements.
//!
//! - [`UnitKindId`]: Numeric ID used everywhere at runtime
//! - [`UnitRole`]: Bitflags for fast classification queries
//! - [`UnitKindRegistry`]: Maps between IDs and provides supply and
//!   prerequisite metadata
//!
//! Buildings, add-ons and spells are unit kinds as well. The planner builds
//! them like anything else but never drafts them into an attack squad.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::data::RaceUnitData;
use crate::error::{PlannerError, Result};
use crate::race::Race;

/// Numeric identifier for a unit kind.
///
/// Assigned in registration order, so the ordering of IDs is the stable
/// type-identity order every composition is iterated in.
///
/// # Example
///
/// ```
/// use bob_core::unit_kind::UnitKindId;
///
/// let id = UnitKindId::new(42);
/// assert_eq!(id.as_u16(), 42);
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct UnitKindId(u16);

impl UnitKindId {
    /// Sentinel value indicating no unit kind.
    pub const NONE: Self = Self(u16::MAX);

    /// Create a new unit kind ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Check if this is a valid ID (not NONE).
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u16::MAX
    }
}

impl std::fmt::Display for UnitKindId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bitflags for fast unit classification queries.
///
/// # Example
///
/// ```
/// use bob_core::unit_kind::UnitRole;
///
/// let role = UnitRole::GROUND.union(UnitRole::WORKER);
/// assert!(role.contains(UnitRole::WORKER));
/// assert!(role.intersects(UnitRole::NON_MILITARY));
/// assert!(!role.contains(UnitRole::AIR));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitRole(u32);

impl UnitRole {
    /// Unit moves on ground.
    pub const GROUND: Self = Self(1 << 0);
    /// Unit flies.
    pub const AIR: Self = Self(1 << 1);
    /// Gathers resources and constructs buildings.
    pub const WORKER: Self = Self(1 << 2);
    /// Immobile structure.
    pub const BUILDING: Self = Self(1 << 3);
    /// Structure attached to another building.
    pub const ADDON: Self = Self(1 << 4);
    /// Spell effect or research, not a real unit.
    pub const SPELL: Self = Self(1 << 5);
    /// Raises supply capacity.
    pub const SUPPLY_PROVIDER: Self = Self(1 << 6);
    /// Can attack.
    pub const COMBATANT: Self = Self(1 << 7);
    /// Can see cloaked units.
    pub const DETECTOR: Self = Self(1 << 8);
    /// Main base building (accepts resources).
    pub const RESOURCE_DEPOT: Self = Self(1 << 9);

    /// Kinds that are never drafted into an attack squad.
    pub const NON_MILITARY: Self =
        Self(Self::BUILDING.0 | Self::ADDON.0 | Self::SPELL.0 | Self::WORKER.0);

    /// Empty role (no flags set).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if all flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any flags in `other` are set in `self`.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two roles (union of flags).
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Get raw bits for serialization.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Create from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Build role flags from RON tags. Unknown tags are ignored.
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Self {
        tags.iter().fold(Self::empty(), |role, tag| {
            role.union(match tag.as_str() {
                "ground" => Self::GROUND,
                "air" => Self::AIR,
                "worker" => Self::WORKER,
                "building" => Self::BUILDING,
                "addon" => Self::ADDON,
                "spell" => Self::SPELL,
                "supply" => Self::SUPPLY_PROVIDER,
                "combatant" => Self::COMBATANT,
                "detector" => Self::DETECTOR,
                "depot" => Self::RESOURCE_DEPOT,
                _ => Self::empty(),
            })
        })
    }
}

impl std::ops::BitOr for UnitRole {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for UnitRole {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Metadata about a unit kind, stored in the registry.
#[derive(Clone, Debug)]
pub struct UnitKindInfo {
    /// Numeric ID (index in registry).
    pub id: UnitKindId,
    /// String ID from RON data (e.g., "zealot").
    pub string_id: String,
    /// Race this kind belongs to.
    pub race: Race,
    /// Cached role flags.
    pub role: UnitRole,
    /// Supply consumed per unit.
    pub supply_cost: u32,
    /// Supply capacity granted per unit.
    pub supply_provided: u32,
    /// Kinds that must exist before this kind can be produced.
    pub prerequisites: Vec<UnitKindId>,
}

/// Central registry of unit kinds.
///
/// Built once at data load time, immutable afterwards.
#[derive(Default, Debug, Clone)]
pub struct UnitKindRegistry {
    /// Lookup by numeric ID (O(1) array index).
    by_id: Vec<UnitKindInfo>,
    /// Lookup by (race, string_id) → numeric ID.
    by_string: HashMap<(Race, String), UnitKindId>,
}

impl UnitKindRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from loaded race data.
    ///
    /// Kinds are registered first, then prerequisites are resolved, so a
    /// kind may name a prerequisite that appears later in the file.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::UnknownUnitKind`] if a prerequisite names a
    /// kind that the data does not define.
    pub fn from_data(sets: &[RaceUnitData]) -> Result<Self> {
        let mut registry = Self::new();

        for set in sets {
            for unit in &set.units {
                let id = registry.register(set.race, &unit.id, UnitRole::from_tags(&unit.tags));
                registry.set_supply(id, unit.supply_cost, unit.supply_provided);
            }
        }

        for set in sets {
            for unit in &set.units {
                let Some(id) = registry.find(set.race, &unit.id) else {
                    continue;
                };
                for prereq in &unit.prerequisites {
                    let prereq_id = registry.find(set.race, prereq).ok_or_else(|| {
                        PlannerError::UnknownUnitKind(format!("{} (required by {})", prereq, unit.id))
                    })?;
                    registry.add_prerequisite(id, prereq_id);
                }
            }
        }

        Ok(registry)
    }

    /// Register a unit kind and return its assigned numeric ID.
    ///
    /// Registering the same (race, string_id) twice returns the existing ID.
    pub fn register(&mut self, race: Race, string_id: &str, role: UnitRole) -> UnitKindId {
        if let Some(&existing) = self.by_string.get(&(race, string_id.to_string())) {
            return existing;
        }

        let id = UnitKindId::new(self.by_id.len() as u16);
        self.by_id.push(UnitKindInfo {
            id,
            string_id: string_id.to_string(),
            race,
            role,
            supply_cost: 0,
            supply_provided: 0,
            prerequisites: Vec::new(),
        });
        self.by_string.insert((race, string_id.to_string()), id);

        id
    }

    /// Set supply cost and supply grant for a kind.
    pub fn set_supply(&mut self, id: UnitKindId, cost: u32, provided: u32) {
        if let Some(info) = self.get_mut(id) {
            info.supply_cost = cost;
            info.supply_provided = provided;
        }
    }

    /// Record that `prereq` must exist before `id` can be produced.
    pub fn add_prerequisite(&mut self, id: UnitKindId, prereq: UnitKindId) {
        if self.get(prereq).is_none() {
            return;
        }
        if let Some(info) = self.get_mut(id) {
            if !info.prerequisites.contains(&prereq) {
                info.prerequisites.push(prereq);
            }
        }
    }

    /// Get unit info by numeric ID. O(1) array lookup.
    #[inline]
    #[must_use]
    pub fn get(&self, id: UnitKindId) -> Option<&UnitKindInfo> {
        if !id.is_valid() {
            return None;
        }
        self.by_id.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: UnitKindId) -> Option<&mut UnitKindInfo> {
        if !id.is_valid() {
            return None;
        }
        self.by_id.get_mut(id.0 as usize)
    }

    /// Find a unit's numeric ID by race and string ID.
    #[must_use]
    pub fn find(&self, race: Race, string_id: &str) -> Option<UnitKindId> {
        self.by_string.get(&(race, string_id.to_string())).copied()
    }

    /// Resolve a composition or opening token.
    ///
    /// A numeric token is a raw [`UnitKindId`]; anything else is looked up
    /// as a string ID, preferring `race`.
    #[must_use]
    pub fn resolve_token(&self, race: Race, token: &str) -> Option<UnitKindId> {
        if let Ok(raw) = token.parse::<u16>() {
            let id = UnitKindId::new(raw);
            return self.get(id).map(|info| info.id);
        }
        self.find(race, token).or_else(|| {
            Race::ALL
                .into_iter()
                .find_map(|other| self.find(other, token))
        })
    }

    /// Get role flags for a unit kind. O(1).
    ///
    /// Returns `UnitRole::empty()` if the ID is invalid.
    #[inline]
    #[must_use]
    pub fn role(&self, id: UnitKindId) -> UnitRole {
        self.get(id).map_or(UnitRole::empty(), |info| info.role)
    }

    /// Whether this kind may be drafted into an attack squad.
    #[must_use]
    pub fn is_military(&self, id: UnitKindId) -> bool {
        self.get(id).is_some() && !self.role(id).intersects(UnitRole::NON_MILITARY)
    }

    /// Get the string ID for a unit kind. O(1).
    #[must_use]
    pub fn string_id(&self, id: UnitKindId) -> Option<&str> {
        self.get(id).map(|info| info.string_id.as_str())
    }

    /// Direct prerequisites of a kind.
    #[must_use]
    pub fn prerequisites(&self, id: UnitKindId) -> &[UnitKindId] {
        self.get(id).map_or(&[], |info| info.prerequisites.as_slice())
    }

    /// Supply consumed per unit of this kind.
    #[must_use]
    pub fn supply_cost(&self, id: UnitKindId) -> u32 {
        self.get(id).map_or(0, |info| info.supply_cost)
    }

    /// Supply capacity granted per unit of this kind.
    #[must_use]
    pub fn supply_provided(&self, id: UnitKindId) -> u32 {
        self.get(id).map_or(0, |info| info.supply_provided)
    }

    /// The kind a race builds to raise supply: the lowest-ID supply
    /// provider that is not a resource depot.
    #[must_use]
    pub fn supply_provider(&self, race: Race) -> Option<UnitKindId> {
        self.by_race(race)
            .find(|info| {
                info.role.contains(UnitRole::SUPPLY_PROVIDER)
                    && !info.role.contains(UnitRole::RESOURCE_DEPOT)
                    && info.supply_provided > 0
            })
            .map(|info| info.id)
    }

    /// Get all registered unit kinds.
    pub fn all(&self) -> impl Iterator<Item = &UnitKindInfo> {
        self.by_id.iter()
    }

    /// Get all unit kinds for a specific race.
    pub fn by_race(&self, race: Race) -> impl Iterator<Item = &UnitKindInfo> {
        self.by_id.iter().filter(move |info| info.race == race)
    }

    /// Total number of registered unit kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Find a prerequisite cycle, if any.
    ///
    /// Returns the kinds along the cycle with the first kind repeated at the
    /// end. The build goal walk tolerates cycles, but data with one will
    /// never produce the kinds on it.
    #[must_use]
    pub fn find_prerequisite_cycle(&self) -> Option<Vec<UnitKindId>> {
        let mut done = HashSet::new();
        for info in &self.by_id {
            let mut path = Vec::new();
            if let Some(cycle) = self.cycle_from(info.id, &mut path, &mut done) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_from(
        &self,
        id: UnitKindId,
        path: &mut Vec<UnitKindId>,
        done: &mut HashSet<UnitKindId>,
    ) -> Option<Vec<UnitKindId>> {
        if done.contains(&id) {
            return None;
        }
        if let Some(start) = path.iter().position(|&p| p == id) {
            let mut cycle = path[start..].to_vec();
            cycle.push(id);
            return Some(cycle);
        }

        path.push(id);
        for &prereq in self.prerequisites(id) {
            if let Some(cycle) = self.cycle_from(prereq, path, done) {
                return Some(cycle);
            }
        }
        path.pop();
        done.insert(id);
        None
    }

    /// Validate that prerequisites form an acyclic graph.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::PrerequisiteCycle`] naming the kinds on the
    /// first cycle found.
    pub fn validate(&self) -> Result<()> {
        match self.find_prerequisite_cycle() {
            Some(cycle) => Err(PlannerError::PrerequisiteCycle(
                cycle
                    .into_iter()
                    .map(|id| self.string_id(id).unwrap_or("?").to_string())
                    .collect(),
            )),
            None => Ok(()),
        }
    }
}

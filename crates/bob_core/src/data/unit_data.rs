//! Unit data structures for data-driven unit kind definitions.

use serde::{Deserialize, Serialize};

use crate::race::Race;

/// Data-driven unit kind definition.
///
/// Buildings, add-ons and spells are unit kinds too; their tags tell the
/// planner not to draft them into squads.
///
/// # Example RON
///
/// ```ron
/// UnitKindData(
///     id: "zealot",
///     tags: ["ground", "combatant"],
///     supply_cost: 4,
///     prerequisites: ["gateway"],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitKindData {
    /// Unique string identifier within the race.
    pub id: String,

    /// Classification tags (see [`crate::unit_kind::UnitRole::from_tags`]).
    #[serde(default)]
    pub tags: Vec<String>,

    /// Supply consumed by one unit of this kind.
    #[serde(default)]
    pub supply_cost: u32,

    /// Supply capacity granted by one unit of this kind.
    #[serde(default)]
    pub supply_provided: u32,

    /// String ids of the kinds that must exist before this one can be made.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl UnitKindData {
    /// Check if this kind carries a tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// All unit kinds of one race, as stored in `units/<race>.ron`.
///
/// # Example RON
///
/// ```ron
/// RaceUnitData(
///     race: Protoss,
///     units: [
///         UnitKindData(id: "probe", tags: ["worker"], supply_cost: 2),
///         UnitKindData(id: "pylon", tags: ["building", "supply"], supply_provided: 16, prerequisites: ["probe"]),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaceUnitData {
    /// Race these kinds belong to.
    pub race: Race,

    /// Unit kinds, in registration order.
    pub units: Vec<UnitKindData>,
}

impl RaceUnitData {
    /// Parse from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(ron)
    }

    /// Look up a kind definition by string id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&UnitKindData> {
        self.units.iter().find(|u| u.id == id)
    }
}

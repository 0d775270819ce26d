//! Playable race identifiers.

use serde::{Deserialize, Serialize};

/// The race a player is playing.
///
/// Catalog, timeline and unit data files are all keyed by the self race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    /// Protoss.
    Protoss,
    /// Terran.
    Terran,
    /// Zerg.
    Zerg,
}

impl Race {
    /// All races, in a stable order.
    pub const ALL: [Self; 3] = [Self::Protoss, Self::Terran, Self::Zerg];

    /// Name used in data file names (e.g. `Protoss_strats.txt`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Protoss => "Protoss",
            Self::Terran => "Terran",
            Self::Zerg => "Zerg",
        }
    }

    /// Lowercase name used for RON unit data files.
    #[must_use]
    pub const fn file_stem(&self) -> &'static str {
        match self {
            Self::Protoss => "protoss",
            Self::Terran => "terran",
            Self::Zerg => "zerg",
        }
    }

    /// Parse a race from its name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|race| race.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Race {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Race::from_name("protoss"), Some(Race::Protoss));
        assert_eq!(Race::from_name(" ZERG "), Some(Race::Zerg));
        assert_eq!(Race::from_name("random"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Race::Terran.name(), "Terran");
        assert_eq!(Race::Terran.file_stem(), "terran");
        assert_eq!(Race::Protoss.to_string(), "Protoss");
    }
}

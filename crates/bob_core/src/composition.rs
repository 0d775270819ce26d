//! Army compositions: what force shape a goal asks for.
//!
//! A composition is authored as two parallel token lines, unit kinds and
//! counts, e.g. `"zealot dragoon 17"` / `"6 4 1"`. [`resolve`] pairs them
//! positionally into an [`ArmyComposition`]; [`merge`] sums two of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::race::Race;
use crate::unit_kind::{UnitKindId, UnitKindRegistry};

/// Raw, unresolved composition as read from the timeline file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompositionSpec {
    /// Whitespace-separated unit kind tokens.
    pub unit_tokens: String,
    /// Whitespace-separated count tokens, parallel to `unit_tokens`.
    pub count_tokens: String,
}

impl CompositionSpec {
    /// Create a spec from its two token lines.
    #[must_use]
    pub fn new(unit_tokens: impl Into<String>, count_tokens: impl Into<String>) -> Self {
        Self {
            unit_tokens: unit_tokens.into(),
            count_tokens: count_tokens.into(),
        }
    }

    /// Check that both token lines have the same length.
    ///
    /// [`resolve`] never fails on a mismatch, it truncates. This is for
    /// tooling that wants to flag the data.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::ParseMismatch`] when the lengths differ.
    pub fn check_lengths(&self) -> Result<()> {
        let units = self.unit_tokens.split_whitespace().count();
        let counts = self.count_tokens.split_whitespace().count();
        if units == counts {
            Ok(())
        } else {
            Err(PlannerError::ParseMismatch { units, counts })
        }
    }
}

/// Desired unit counts, keyed by unit kind.
///
/// Backed by a `BTreeMap` so iteration always follows [`UnitKindId`] order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArmyComposition {
    counts: BTreeMap<UnitKindId, u32>,
}

impl ArmyComposition {
    /// Create an empty composition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Desired count for a kind (0 if absent).
    #[must_use]
    pub fn get(&self, kind: UnitKindId) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Whether a kind is present.
    #[must_use]
    pub fn contains(&self, kind: UnitKindId) -> bool {
        self.counts.contains_key(&kind)
    }

    /// Iterate `(kind, count)` in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitKindId, u32)> + '_ {
        self.counts.iter().map(|(&kind, &count)| (kind, count))
    }

    /// Number of distinct kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if the composition asks for nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of units across all kinds.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.counts.values().fold(0, |total, &count| total.saturating_add(count))
    }
}

impl FromIterator<(UnitKindId, u32)> for ArmyComposition {
    /// Later duplicates of a kind are ignored.
    fn from_iter<I: IntoIterator<Item = (UnitKindId, u32)>>(iter: I) -> Self {
        let mut counts = BTreeMap::new();
        for (kind, count) in iter {
            counts.entry(kind).or_insert(count);
        }
        Self { counts }
    }
}

/// Resolve a raw spec into a composition.
///
/// Tokens are paired positionally and pairing stops at the shorter list.
/// An unknown unit token or a count that is not a non-negative integer
/// drops its pair. The first pairing of a repeated kind wins.
#[must_use]
pub fn resolve(spec: &CompositionSpec, race: Race, registry: &UnitKindRegistry) -> ArmyComposition {
    let mut pairs = Vec::new();
    let mut counts = spec.count_tokens.split_whitespace();

    for unit_token in spec.unit_tokens.split_whitespace() {
        let Some(count_token) = counts.next() else {
            tracing::debug!("Composition truncated at unit token '{unit_token}'");
            break;
        };
        let Ok(count) = count_token.parse::<u32>() else {
            tracing::warn!("Composition count '{count_token}' for '{unit_token}' is not a count, skipped");
            continue;
        };
        match registry.resolve_token(race, unit_token) {
            Some(kind) => pairs.push((kind, count)),
            None => tracing::warn!("Unknown unit token '{unit_token}' in composition, skipped"),
        }
    }

    pairs.into_iter().collect()
}

/// Union of two compositions; overlapping kinds have their counts summed,
/// saturating at `u32::MAX`.
#[must_use]
pub fn merge(a: &ArmyComposition, b: &ArmyComposition) -> ArmyComposition {
    let mut counts = a.counts.clone();
    for (&kind, &count) in &b.counts {
        let total = counts.entry(kind).or_insert(0);
        *total = total.saturating_add(count);
    }
    ArmyComposition { counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_kind::UnitRole;

    fn registry() -> (UnitKindRegistry, UnitKindId, UnitKindId, UnitKindId) {
        let mut registry = UnitKindRegistry::new();
        let probe = registry.register(Race::Protoss, "probe", UnitRole::WORKER);
        let zealot = registry.register(Race::Protoss, "zealot", UnitRole::COMBATANT);
        let dragoon = registry.register(Race::Protoss, "dragoon", UnitRole::COMBATANT);
        (registry, probe, zealot, dragoon)
    }

    fn comp(pairs: &[(UnitKindId, u32)]) -> ArmyComposition {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_resolve_pairs_positionally() {
        let (registry, probe, zealot, dragoon) = registry();
        let spec = CompositionSpec::new("zealot 2 0", "6 4 10");
        let resolved = resolve(&spec, Race::Protoss, &registry);

        assert_eq!(resolved.get(zealot), 6);
        assert_eq!(resolved.get(dragoon), 4);
        assert_eq!(resolved.get(probe), 10);
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_resolve_stops_at_shorter_list() {
        let (registry, probe, zealot, dragoon) = registry();

        let more_units = resolve(
            &CompositionSpec::new("zealot dragoon probe", "5 3"),
            Race::Protoss,
            &registry,
        );
        assert_eq!(more_units, comp(&[(zealot, 5), (dragoon, 3)]));

        let more_counts = resolve(
            &CompositionSpec::new("zealot", "5 3 9"),
            Race::Protoss,
            &registry,
        );
        assert_eq!(more_counts, comp(&[(zealot, 5)]));
        assert!(!more_counts.contains(probe));
    }

    #[test]
    fn test_resolve_skips_unknown_unit_token() {
        let (registry, _, zealot, dragoon) = registry();
        let resolved = resolve(
            &CompositionSpec::new("zealot carrier dragoon", "1 8 2"),
            Race::Protoss,
            &registry,
        );
        assert_eq!(resolved, comp(&[(zealot, 1), (dragoon, 2)]));
    }

    #[test]
    fn test_resolve_drops_bad_count() {
        let (registry, _, zealot, _) = registry();
        let resolved = resolve(
            &CompositionSpec::new("dragoon zealot", "many 3"),
            Race::Protoss,
            &registry,
        );
        assert_eq!(resolved, comp(&[(zealot, 3)]));
    }

    #[test]
    fn test_resolve_first_duplicate_wins() {
        let (registry, _, zealot, _) = registry();
        let resolved = resolve(
            &CompositionSpec::new("zealot zealot", "3 7"),
            Race::Protoss,
            &registry,
        );
        assert_eq!(resolved.get(zealot), 3);
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_resolve_empty_spec() {
        let (registry, ..) = registry();
        assert!(resolve(&CompositionSpec::default(), Race::Protoss, &registry).is_empty());
    }

    #[test]
    fn test_check_lengths() {
        assert!(CompositionSpec::new("a b", "1 2").check_lengths().is_ok());
        assert!(matches!(
            CompositionSpec::new("a b c", "1 2").check_lengths(),
            Err(PlannerError::ParseMismatch {
                units: 3,
                counts: 2
            })
        ));
    }

    #[test]
    fn test_merge_sums_overlap_and_keeps_singles() {
        let (_, probe, zealot, dragoon) = registry();
        let a = comp(&[(zealot, 4), (probe, 2)]);
        let b = comp(&[(zealot, 3), (dragoon, 5)]);
        let merged = merge(&a, &b);

        assert_eq!(merged.get(zealot), 7);
        assert_eq!(merged.get(probe), 2);
        assert_eq!(merged.get(dragoon), 5);
        // Inputs untouched
        assert_eq!(a.get(zealot), 4);
        assert_eq!(b.get(zealot), 3);
    }

    #[test]
    fn test_merge_saturates_large_counts() {
        let (registry, probe, zealot, _) = registry();
        let a = resolve(
            &CompositionSpec::new("zealot probe", "4294967295 4294967295"),
            Race::Protoss,
            &registry,
        );
        let merged = merge(&a, &a);

        assert_eq!(merged.get(zealot), u32::MAX);
        assert_eq!(merged.get(probe), u32::MAX);
        assert_eq!(merged.total_units(), u32::MAX);
    }

    #[test]
    fn test_merge_identity() {
        let (_, _, zealot, _) = registry();
        let a = comp(&[(zealot, 4)]);
        assert_eq!(merge(&a, &ArmyComposition::new()), a);
        assert_eq!(merge(&ArmyComposition::new(), &a), a);
    }

    #[test]
    fn test_iteration_follows_kind_order() {
        let (_, probe, zealot, dragoon) = registry();
        let c = comp(&[(dragoon, 1), (probe, 1), (zealot, 1)]);
        let order: Vec<_> = c.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec![probe, zealot, dragoon]);
        assert_eq!(c.total_units(), 3);
    }
}

//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the planner makes identical
//! decisions given identical inputs.
//!
//! # Testing Strategy
//!
//! A bot whose decisions drift between runs cannot be debugged from a
//! replay. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Compositions iterate in `UnitKindId` order and rosters in handle order.
//!
//! - **System randomness**: Random opening selection uses a seeded
//!   generator from the planner config.
//!
//! - **Floating-point math**: Only the bandit score uses floats, and it is
//!   computed the same way on every run.
//!
//! Outputs are compared by hashing their `bincode` encoding, so any
//! serializable planner output can be checked.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks per run.
    pub ticks: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic planner).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the planner was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Planner is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Hash the `bincode` encoding of a value.
///
/// # Panics
///
/// Panics if the value cannot be encoded.
#[must_use]
pub fn hash_serialized<T: Serialize + ?Sized>(value: &T) -> u64 {
    let bytes = bincode::serialize(value)
        .unwrap_or_else(|e| panic!("value could not be encoded for hashing: {e}"));
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Run a scenario multiple times and verify determinism.
///
/// `step` is called once per tick and returns the tick's output, which is
/// folded into the run's hash.
///
/// # Example
///
/// ```ignore
/// let result = verify_determinism(
///     3,   // Run 3 times
///     200, // 200 ticks each
///     || setup_planner_and_world(),
///     |(planner, world), tick| {
///         world.set_frame(tick * 24);
///         planner.build_order_goal(world)
///     },
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, O, Setup, Step>(
    runs: usize,
    ticks: u32,
    setup: Setup,
    step: Step,
) -> DeterminismResult
where
    O: Serialize,
    Setup: Fn() -> S,
    Step: Fn(&mut S, u32) -> O,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        let mut hasher = DefaultHasher::new();

        for tick in 0..ticks {
            let output = step(&mut state, tick);
            hash_serialized(&output).hash(&mut hasher);
        }

        hashes.push(hasher.finish());
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Proptest strategies for planner inputs.
pub mod strategies {
    use proptest::prelude::*;

    use bob_core::composition::ArmyComposition;
    use bob_core::unit_kind::UnitKindId;

    /// Generate a unit kind id below `max_kind`.
    pub fn arb_kind(max_kind: u16) -> impl Strategy<Value = UnitKindId> {
        (0..max_kind).prop_map(UnitKindId::new)
    }

    /// Generate a composition over kinds below `max_kind`.
    pub fn arb_composition(max_kind: u16) -> impl Strategy<Value = ArmyComposition> {
        proptest::collection::btree_map(arb_kind(max_kind), 0u32..50, 0..6)
            .prop_map(|counts| counts.into_iter().collect())
    }

    /// Generate win/loss history for `len` openings.
    pub fn arb_history(len: usize) -> impl Strategy<Value = Vec<(u32, u32)>> {
        proptest::collection::vec((0u32..30, 0u32..30), len)
    }

    /// Generate a whitespace-separated token line from `names`.
    pub fn arb_unit_tokens(names: Vec<&'static str>) -> impl Strategy<Value = String> {
        proptest::collection::vec(proptest::sample::select(names), 0..6)
            .prop_map(|tokens| tokens.join(" "))
    }

    /// Generate a whitespace-separated count line.
    pub fn arb_count_tokens() -> impl Strategy<Value = String> {
        proptest::collection::vec(0u32..40, 0..6).prop_map(|counts| {
            counts
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_serialized_is_stable() {
        assert_eq!(hash_serialized(&vec![1u32, 2, 3]), hash_serialized(&vec![1u32, 2, 3]));
        assert_ne!(hash_serialized(&vec![1u32, 2, 3]), hash_serialized(&vec![3u32, 2, 1]));
    }

    #[test]
    fn test_verify_determinism_detects_drift() {
        let stable = verify_determinism(3, 10, || 0u32, |n, tick| {
            *n += tick;
            *n
        });
        stable.assert_deterministic();
        assert_eq!(stable.unique_hashes().len(), 1);

        let counter = std::cell::Cell::new(0u32);
        let drifting = verify_determinism(
            2,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |n, _| *n,
        );
        assert!(!drifting.is_deterministic);
    }
}

//! The attack plan: an ordered list of timed composition goals.
//!
//! Goals are consumed through a cursor rather than popped, so goals ahead
//! of the cursor can be merged or looked ahead into. The cursor only moves
//! forward and stops on the last goal, which stays active for the rest of
//! the match.

use serde::{Deserialize, Serialize};

use crate::composition::{self, ArmyComposition, CompositionSpec};
use crate::race::Race;
use crate::unit_kind::UnitKindRegistry;

/// One timed goal: from `activation_frame` on, attack with this composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackGoal {
    activation_frame: u32,
    spec: CompositionSpec,
    #[serde(skip)]
    resolved: Option<ArmyComposition>,
}

impl AttackGoal {
    /// Create a goal from its activation frame and raw composition.
    #[must_use]
    pub fn new(activation_frame: u32, spec: CompositionSpec) -> Self {
        Self {
            activation_frame,
            spec,
            resolved: None,
        }
    }

    /// Frame from which this goal may be executed.
    #[must_use]
    pub const fn activation_frame(&self) -> u32 {
        self.activation_frame
    }

    /// The raw composition spec.
    #[must_use]
    pub fn spec(&self) -> &CompositionSpec {
        &self.spec
    }

    /// The cached composition, if it has been resolved.
    #[must_use]
    pub fn cached(&self) -> Option<&ArmyComposition> {
        self.resolved.as_ref()
    }

    fn resolve(&mut self, race: Race, registry: &UnitKindRegistry) -> &ArmyComposition {
        self.resolved
            .insert(composition::resolve(&self.spec, race, registry))
    }

    fn composition(&mut self, race: Race, registry: &UnitKindRegistry) -> ArmyComposition {
        match &self.resolved {
            Some(cached) => cached.clone(),
            None => self.resolve(race, registry).clone(),
        }
    }
}

/// Authored-order sequence of attack goals plus the current cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttackPlanTimeline {
    goals: Vec<AttackGoal>,
    cursor: usize,
    fresh_goal: bool,
}

impl AttackPlanTimeline {
    /// Create a timeline positioned on the first goal.
    #[must_use]
    pub fn new(goals: Vec<AttackGoal>) -> Self {
        Self {
            goals,
            cursor: 0,
            fresh_goal: true,
        }
    }

    /// Number of goals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// An empty timeline is the degraded state after a missing config.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Index of the current goal.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the current goal's composition still needs resolving.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.fresh_goal
    }

    /// Whether the cursor sits on the terminal goal.
    #[must_use]
    pub fn is_at_last(&self) -> bool {
        self.cursor + 1 >= self.goals.len()
    }

    /// All goals, in authored order.
    #[must_use]
    pub fn goals(&self) -> &[AttackGoal] {
        &self.goals
    }

    /// The goal at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&AttackGoal> {
        self.goals.get(self.cursor)
    }

    /// Activation frame of the current goal.
    #[must_use]
    pub fn desired_activation_frame(&self) -> Option<u32> {
        self.current().map(AttackGoal::activation_frame)
    }

    /// Goals from the cursor to the end.
    pub fn pending(&self) -> impl Iterator<Item = &AttackGoal> {
        self.goals.iter().skip(self.cursor)
    }

    /// Move to the next goal.
    ///
    /// Does nothing on the last goal. Returns whether the cursor moved.
    pub fn advance(&mut self) -> bool {
        if self.is_at_last() {
            return false;
        }
        self.cursor += 1;
        self.fresh_goal = true;
        tracing::debug!(
            "Attack goal {} of {} now active",
            self.cursor + 1,
            self.goals.len()
        );
        true
    }

    /// Composition of the current goal.
    ///
    /// Re-resolved only after the cursor moved; otherwise the cached value is
    /// returned. Empty for an empty timeline.
    pub fn active_composition(&mut self, race: Race, registry: &UnitKindRegistry) -> ArmyComposition {
        let fresh = self.fresh_goal;
        let Some(goal) = self.goals.get_mut(self.cursor) else {
            return ArmyComposition::new();
        };
        let composition = if fresh {
            goal.resolve(race, registry).clone()
        } else {
            goal.composition(race, registry)
        };
        self.fresh_goal = false;
        composition
    }

    /// Composition of the goal at `index`, resolved and cached on first use.
    pub fn composition_at(
        &mut self,
        index: usize,
        race: Race,
        registry: &UnitKindRegistry,
    ) -> ArmyComposition {
        if index == self.cursor {
            return self.active_composition(race, registry);
        }
        self.goals
            .get_mut(index)
            .map(|goal| goal.composition(race, registry))
            .unwrap_or_default()
    }

    /// Merge of every goal from `index` to the end.
    pub fn merged_from(
        &mut self,
        index: usize,
        race: Race,
        registry: &UnitKindRegistry,
    ) -> ArmyComposition {
        (index..self.goals.len()).fold(ArmyComposition::new(), |acc, i| {
            let next = self.composition_at(i, race, registry);
            composition::merge(&acc, &next)
        })
    }
}

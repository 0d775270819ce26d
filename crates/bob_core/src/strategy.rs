//! Opening selection across matches.
//!
//! Each opening in the catalog is an arm of a multi-armed bandit. Every arm
//! is tried once before any scoring; after that the arm with the highest
//! UCB1 value is played. Outcomes are recorded once at match end and
//! persisted per opponent through an [`OutcomeStore`].

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::race::Race;
use crate::rng::DeterministicRng;
use crate::unit_kind::{UnitKindId, UnitKindRegistry};
use crate::world::ScoreComponents;

/// Exploration constant of the UCB1 score.
pub const UCB_EXPLORATION: f64 = 0.7;

/// History of one opening against the current opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRecord {
    /// Position in the catalog.
    pub index: usize,
    /// Opening label as authored in the catalog file.
    pub label: String,
    /// Matches won with this opening.
    pub wins: u32,
    /// Matches lost with this opening.
    pub losses: u32,
}

impl StrategyRecord {
    /// Matches played with this opening.
    #[must_use]
    pub const fn trials(&self) -> u32 {
        self.wins.saturating_add(self.losses)
    }
}

/// Ordered openings available to the self race.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningCatalog {
    records: Vec<StrategyRecord>,
}

impl OpeningCatalog {
    /// Build a catalog with zeroed history from opening labels.
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| StrategyRecord {
                index,
                label: label.into(),
                wins: 0,
                losses: 0,
            })
            .collect();
        Self { records }
    }

    /// Number of openings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// An empty catalog means no opening can be selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at an index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StrategyRecord> {
        self.records.get(index)
    }

    /// All records, in catalog order.
    #[must_use]
    pub fn records(&self) -> &[StrategyRecord] {
        &self.records
    }

    /// Trials summed over the whole catalog.
    #[must_use]
    pub fn total_trials(&self) -> u32 {
        self.records
            .iter()
            .map(StrategyRecord::trials)
            .fold(0, u32::saturating_add)
    }

    /// Overwrite loss counts from a persisted record.
    ///
    /// Entries the record does not cover are reset to zero; extra values
    /// are ignored.
    pub fn apply_losses(&mut self, losses: &[u32]) {
        for (i, record) in self.records.iter_mut().enumerate() {
            record.losses = losses.get(i).copied().unwrap_or(0);
        }
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut StrategyRecord> {
        self.records.get_mut(index)
    }
}

/// Persistence for per-opponent outcome history.
///
/// Implemented by the IO layer; the core only calls it.
pub trait OutcomeStore {
    /// Persisted loss counts for an opponent, `None` if nothing was stored.
    fn load_losses(&mut self, opponent: &str) -> Result<Option<Vec<u32>>>;

    /// Persist the full record for an opponent.
    fn save(&mut self, opponent: &str, records: &[StrategyRecord]) -> Result<()>;
}

/// How a match ended, as reported at match end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Result reported by the game.
    pub won: bool,
    /// Frame at which the match ended.
    pub frame: u32,
    /// Own score.
    pub own_score: ScoreComponents,
    /// Opponent score.
    pub enemy_score: ScoreComponents,
}

impl MatchOutcome {
    /// Whether the match counts as a win.
    ///
    /// Before the time limit the reported result decides. At or past the
    /// limit the aggregate scores decide, and a tie is a loss.
    #[must_use]
    pub fn counts_as_win(&self, game_end_frame: u32) -> bool {
        if self.frame < game_end_frame {
            self.won
        } else {
            self.own_score.total() > self.enemy_score.total()
        }
    }
}

/// UCB1 score of an arm.
///
/// `wins / trials + C * sqrt(ln(total_trials) / trials)`. Callers must not
/// pass `trials == 0`; untried arms are selected before scoring.
#[must_use]
pub fn ucb_score(wins: u32, trials: u32, total_trials: u32) -> f64 {
    let wins = f64::from(wins);
    let trials = f64::from(trials);
    let total = f64::from(total_trials);
    wins / trials + UCB_EXPLORATION * (total.ln() / trials).sqrt()
}

/// Chooses and scores openings.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    catalog: OpeningCatalog,
    opponent: String,
    use_strategy_io: bool,
    game_end_frame: u32,
    rng: DeterministicRng,
    selected: Option<usize>,
}

impl StrategySelector {
    /// Create a selector for one opponent.
    #[must_use]
    pub fn new(catalog: OpeningCatalog, opponent: impl Into<String>, config: &PlannerConfig) -> Self {
        Self {
            catalog,
            opponent: opponent.into(),
            use_strategy_io: config.use_strategy_io,
            game_end_frame: config.game_end_frame,
            rng: DeterministicRng::new(config.random_seed),
            selected: None,
        }
    }

    /// The catalog with its current history.
    #[must_use]
    pub fn catalog(&self) -> &OpeningCatalog {
        &self.catalog
    }

    /// Opponent this selector keeps history for.
    #[must_use]
    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    /// Index chosen by [`Self::select_strategy`], if any.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Label of the selected opening.
    #[must_use]
    pub fn opening(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.catalog.get(i))
            .map(|record| record.label.as_str())
    }

    /// Unit kinds named by the selected opening label, in order.
    ///
    /// Unknown tokens are skipped.
    #[must_use]
    pub fn opening_build_order(&self, race: Race, registry: &UnitKindRegistry) -> Vec<UnitKindId> {
        self.opening()
            .map(|label| {
                label
                    .split_whitespace()
                    .filter_map(|token| registry.resolve_token(race, token))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Load persisted history for the opponent.
    ///
    /// A missing record is a cold start; a failing store is logged and also
    /// treated as a cold start.
    pub fn load_history(&mut self, store: &mut dyn OutcomeStore) {
        if !self.use_strategy_io {
            return;
        }
        match store.load_losses(&self.opponent) {
            Ok(Some(losses)) => {
                if losses.len() < self.catalog.len() {
                    tracing::warn!(
                        "Outcome record for {} covers {} of {} openings, rest defaults to zero",
                        self.opponent,
                        losses.len(),
                        self.catalog.len()
                    );
                }
                self.catalog.apply_losses(&losses);
            }
            Ok(None) => {
                tracing::info!("No outcome record for {}, cold start", self.opponent);
                self.catalog.apply_losses(&[]);
            }
            Err(e) => {
                tracing::warn!("Failed to load outcomes for {}: {e}", self.opponent);
                self.catalog.apply_losses(&[]);
            }
        }
    }

    /// Choose the opening for this match.
    ///
    /// Returns `None` for an empty catalog.
    pub fn select_strategy(&mut self) -> Option<usize> {
        let choice = if self.use_strategy_io {
            self.select_by_ucb()
        } else {
            self.rng.next_index(self.catalog.len())
        };

        match choice {
            Some(index) => tracing::info!(
                "Selected opening {index} ({}) against {}",
                self.catalog.get(index).map_or("", |r| r.label.as_str()),
                self.opponent
            ),
            None => tracing::warn!("Opening catalog is empty, no opening selected"),
        }

        self.selected = choice;
        choice
    }

    fn select_by_ucb(&self) -> Option<usize> {
        let records = self.catalog.records();

        if let Some(untried) = records.iter().find(|r| r.trials() == 0) {
            return Some(untried.index);
        }

        let total = self.catalog.total_trials();
        let mut best: Option<(usize, f64)> = None;
        for record in records {
            let score = ucb_score(record.wins, record.trials(), total);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((record.index, score));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Record the match result against the selected opening and persist.
    ///
    /// Does nothing when outcome persistence is disabled. Safe to call when
    /// no opening was ever selected.
    pub fn record_outcome(&mut self, outcome: &MatchOutcome, store: &mut dyn OutcomeStore) {
        if !self.use_strategy_io {
            return;
        }

        let Some(index) = self.selected else {
            tracing::warn!("Match ended without a selected opening, nothing recorded");
            return;
        };
        let won = outcome.counts_as_win(self.game_end_frame);
        let Some(record) = self.catalog.get_mut(index) else {
            return;
        };
        if won {
            record.wins = record.wins.saturating_add(1);
        } else {
            record.losses = record.losses.saturating_add(1);
        }
        tracing::info!(
            "Recorded {} for opening {index} against {} ({}-{})",
            if won { "win" } else { "loss" },
            self.opponent,
            record.wins,
            record.losses
        );

        if let Err(e) = store.save(&self.opponent, self.catalog.records()) {
            tracing::warn!("Failed to persist outcomes for {}: {e}", self.opponent);
        }
    }
}

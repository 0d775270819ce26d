//! Batch runner for opening learning.
//!
//! Plays a series of sandbox matches against one opponent profile. Matches
//! run one after another because each selection depends on the outcomes
//! recorded by the matches before it.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bob_core::strategy::OutcomeStore;

use crate::runner::{play_match, MatchReport, MatchSettings, MatchSetup};
use crate::sandbox::OpponentProfile;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Opponent profile to play.
    pub opponent: OpponentProfile,
    /// Number of matches to play.
    pub match_count: u32,
    /// Seed of the first match; later matches add their index.
    pub seed_start: u64,
    /// Tick loop settings.
    pub settings: MatchSettings,
}

impl BatchConfig {
    /// Create config for `match_count` matches against `opponent`.
    #[must_use]
    pub fn new(opponent: OpponentProfile, match_count: u32) -> Self {
        Self {
            opponent,
            match_count,
            seed_start: 0,
            settings: MatchSettings::default(),
        }
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the frame limit.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u32) -> Self {
        self.settings.max_frames = max_frames;
        self
    }
}

/// Per-opening tally over a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSummary {
    /// Catalog index.
    pub index: usize,
    /// Opening label.
    pub label: String,
    /// Matches played with this opening.
    pub played: u32,
    /// Matches won with this opening.
    pub won: u32,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match reports.
    pub matches: Vec<MatchReport>,
    /// Tally per catalog opening.
    pub openings: Vec<OpeningSummary>,
    /// Total runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Total matches won.
    #[must_use]
    pub fn wins(&self) -> u32 {
        self.openings.iter().map(|o| o.won).sum()
    }

    /// Save results to JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Play the batch, recording every outcome in `store`.
pub fn run_batch(setup: &MatchSetup, config: &BatchConfig, store: &mut dyn OutcomeStore) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch: {} matches against {}",
        config.match_count, config.opponent.name
    );

    let mut openings: Vec<OpeningSummary> = setup
        .catalog
        .records()
        .iter()
        .map(|record| OpeningSummary {
            index: record.index,
            label: record.label.clone(),
            played: 0,
            won: 0,
        })
        .collect();

    let mut matches = Vec::with_capacity(config.match_count as usize);
    for i in 0..config.match_count {
        let mut setup = setup.clone();
        setup.config.random_seed = config.seed_start + u64::from(i);

        let mut planner = setup.planner(&config.opponent.name);
        let mut world = setup.world(config.opponent.clone());
        let report = play_match(&mut planner, &mut world, &config.settings, store);

        if let Some(summary) = report.opening_index.and_then(|index| openings.get_mut(index)) {
            summary.played += 1;
            if report.won {
                summary.won += 1;
            }
        }
        debug!(
            "Match {}/{}: opening {:?}, won {}",
            i + 1,
            config.match_count,
            report.opening_index,
            report.won
        );
        matches.push(report);
    }

    let results = BatchResults {
        config: config.clone(),
        matches,
        openings,
        duration_seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        "Batch complete: {}/{} won in {:.1}s",
        results.wins(),
        config.match_count,
        results.duration_seconds
    );
    results
}

//! File access for the planner's data and outcome history.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data>/openings/<Race>_strats.txt    opening catalog, one label per line
//! <data>/attack/<Race>_timings.txt     attack timeline, 3-line groups
//! <data>/units/<race>.ron              unit kinds
//! <data>/planner.ron                   planner config (optional)
//! ```
//!
//! Outcome records live in separate read and write directories, named by
//! an optional two-line settings file. Missing files never stop a match;
//! the loaders log and fall back to empty data.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use bob_core::config::PlannerConfig;
use bob_core::data::{format_outcome_record, parse_catalog, parse_outcome_record, parse_timeline, RaceUnitData};
use bob_core::error::PlannerError;
use bob_core::race::Race;
use bob_core::strategy::{OpeningCatalog, OutcomeStore, StrategyRecord};
use bob_core::timeline::AttackPlanTimeline;
use bob_core::unit_kind::UnitKindRegistry;

/// Outcome records are read from here when no settings file says otherwise.
pub const DEFAULT_READ_DIR: &str = "bwapi-data/testio/read/";
/// Outcome records are written here when no settings file says otherwise.
pub const DEFAULT_WRITE_DIR: &str = "bwapi-data/testio/write/";

/// Error type for file access.
#[derive(Error, Debug)]
pub enum StorageError {
    /// File does not exist.
    #[error("File not found: {0}")]
    NotFound(String),
    /// Failed to read a file.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Failed to write a file.
    #[error("Failed to write '{path}': {source}")]
    Write {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Failed to parse RON.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: ron::error::SpannedError,
    },
    /// Data was read but rejected by the planner.
    #[error(transparent)]
    Planner(#[from] PlannerError),
}

/// Read a whole text file, telling a missing file apart from other failures.
pub fn read_text(path: &Path) -> Result<String, StorageError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(path.display().to_string()))
        }
        Err(source) => Err(StorageError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Where the planner's files are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Root of catalog, timeline and unit data.
    pub data_dir: PathBuf,
    /// Directory outcome records are read from.
    pub read_dir: PathBuf,
    /// Directory outcome records are written to.
    pub write_dir: PathBuf,
}

impl DataPaths {
    /// Paths with the default outcome directories.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            read_dir: PathBuf::from(DEFAULT_READ_DIR),
            write_dir: PathBuf::from(DEFAULT_WRITE_DIR),
        }
    }

    /// Paths with outcome directories taken from a settings file.
    ///
    /// The file's first line is the read directory and its second the write
    /// directory. A missing file or blank line keeps the default.
    #[must_use]
    pub fn with_settings(data_dir: impl Into<PathBuf>, settings: &Path) -> Self {
        let mut paths = Self::new(data_dir);
        match read_text(settings) {
            Ok(text) => {
                let (read_dir, write_dir) = parse_settings(&text);
                if let Some(dir) = read_dir {
                    paths.read_dir = dir;
                }
                if let Some(dir) = write_dir {
                    paths.write_dir = dir;
                }
            }
            Err(e) => tracing::warn!("{e}, using default outcome directories"),
        }
        paths
    }

    /// Use one directory for both reading and writing records.
    #[must_use]
    pub fn with_outcome_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.read_dir.clone_from(&dir);
        self.write_dir = dir;
        self
    }

    /// Opening catalog file for a race.
    #[must_use]
    pub fn catalog_path(&self, race: Race) -> PathBuf {
        self.data_dir
            .join("openings")
            .join(format!("{}_strats.txt", race.name()))
    }

    /// Attack timeline file for a race.
    #[must_use]
    pub fn timeline_path(&self, race: Race) -> PathBuf {
        self.data_dir
            .join("attack")
            .join(format!("{}_timings.txt", race.name()))
    }

    /// Unit data file for a race.
    #[must_use]
    pub fn units_path(&self, race: Race) -> PathBuf {
        self.data_dir
            .join("units")
            .join(format!("{}.ron", race.file_stem()))
    }

    /// Planner config file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("planner.ron")
    }
}

/// Split a settings file into (read dir, write dir).
#[must_use]
pub fn parse_settings(text: &str) -> (Option<PathBuf>, Option<PathBuf>) {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r').trim())
        .map(|line| (!line.is_empty()).then(|| PathBuf::from(line)));
    let read_dir = lines.next().flatten();
    let write_dir = lines.next().flatten();
    (read_dir, write_dir)
}

/// Load the opening catalog for a race. Missing or unreadable → empty.
#[must_use]
pub fn load_catalog(paths: &DataPaths, race: Race) -> OpeningCatalog {
    match read_text(&paths.catalog_path(race)) {
        Ok(text) => {
            let catalog = OpeningCatalog::from_labels(parse_catalog(&text));
            tracing::info!("Loaded {} openings for {race}", catalog.len());
            catalog
        }
        Err(e) => {
            tracing::warn!("{}", PlannerError::ConfigMissing(e.to_string()));
            OpeningCatalog::default()
        }
    }
}

/// Load the attack timeline for a race. Missing or unreadable → empty.
#[must_use]
pub fn load_timeline(paths: &DataPaths, race: Race) -> AttackPlanTimeline {
    match read_text(&paths.timeline_path(race)) {
        Ok(text) => {
            let goals = parse_timeline(&text);
            tracing::info!("Loaded {} attack goals for {race}", goals.len());
            AttackPlanTimeline::new(goals)
        }
        Err(e) => {
            tracing::warn!("{}", PlannerError::ConfigMissing(e.to_string()));
            AttackPlanTimeline::default()
        }
    }
}

/// Read one race's unit data file.
pub fn read_unit_data(path: &Path) -> Result<RaceUnitData, StorageError> {
    let text = read_text(path)?;
    RaceUnitData::from_ron_str(&text).map_err(|source| StorageError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load unit data for every race that has a file.
///
/// Races whose file is missing or broken are skipped. If the remaining data
/// is inconsistent the registry is empty.
#[must_use]
pub fn load_registry(paths: &DataPaths) -> UnitKindRegistry {
    let sets: Vec<RaceUnitData> = Race::ALL
        .into_iter()
        .filter_map(|race| match read_unit_data(&paths.units_path(race)) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("Skipping {race} unit data: {e}");
                None
            }
        })
        .collect();

    match UnitKindRegistry::from_data(&sets) {
        Ok(registry) => {
            if let Err(e) = registry.validate() {
                tracing::warn!("{e}");
            }
            registry
        }
        Err(e) => {
            tracing::warn!("Unit data rejected: {e}");
            UnitKindRegistry::new()
        }
    }
}

/// Load the planner config. Missing or broken → defaults.
#[must_use]
pub fn load_config(path: &Path) -> PlannerConfig {
    let text = match read_text(path) {
        Ok(text) => text,
        Err(StorageError::NotFound(_)) => {
            tracing::debug!("No planner config at {}, using defaults", path.display());
            return PlannerConfig::default();
        }
        Err(e) => {
            tracing::warn!("{e}, using default planner config");
            return PlannerConfig::default();
        }
    };
    PlannerConfig::from_ron_str(&text).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse '{}': {e}, using defaults", path.display());
        PlannerConfig::default()
    })
}

/// Outcome records as text files, one per opponent.
#[derive(Debug, Clone)]
pub struct FileOutcomeStore {
    read_dir: PathBuf,
    write_dir: PathBuf,
}

impl FileOutcomeStore {
    /// Store reading and writing the directories in `paths`.
    #[must_use]
    pub fn new(paths: &DataPaths) -> Self {
        Self {
            read_dir: paths.read_dir.clone(),
            write_dir: paths.write_dir.clone(),
        }
    }

    /// File name of an opponent's record. Path separators are replaced.
    #[must_use]
    pub fn record_file_name(opponent: &str) -> String {
        let name: String = opponent
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        format!("{name}.txt")
    }

    /// Path an opponent's record is read from.
    #[must_use]
    pub fn read_path(&self, opponent: &str) -> PathBuf {
        self.read_dir.join(Self::record_file_name(opponent))
    }

    /// Path an opponent's record is written to.
    #[must_use]
    pub fn write_path(&self, opponent: &str) -> PathBuf {
        self.write_dir.join(Self::record_file_name(opponent))
    }
}

impl OutcomeStore for FileOutcomeStore {
    fn load_losses(&mut self, opponent: &str) -> bob_core::error::Result<Option<Vec<u32>>> {
        match read_text(&self.read_path(opponent)) {
            Ok(text) => Ok(Some(parse_outcome_record(&text, text.lines().count()))),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(PlannerError::MalformedRecord {
                opponent: opponent.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn save(&mut self, opponent: &str, records: &[StrategyRecord]) -> bob_core::error::Result<()> {
        let path = self.write_path(opponent);
        fs::create_dir_all(&self.write_dir)
            .and_then(|()| fs::write(&path, format_outcome_record(records)))
            .map_err(|e| PlannerError::Store(format!("{}: {e}", path.display())))?;
        tracing::debug!("Wrote outcome record {}", path.display());
        Ok(())
    }
}

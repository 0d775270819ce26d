//! Data validation utilities.
//!
//! The planner never refuses bad data at match time; it skips unknown
//! tokens, truncates mismatched composition lines and falls back to empty
//! files. This module finds those problems ahead of time.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use bob_core::composition::CompositionSpec;
use bob_core::config::PlannerConfig;
use bob_core::data::RaceUnitData;
use bob_core::error::PlannerError;
use bob_core::race::Race;
use bob_core::unit_kind::{UnitKindRegistry, UnitRole};
use bob_headless::storage::{read_text, read_unit_data, DataPaths, StorageError};

/// Error returned when validation finds problems.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// At least one problem was found.
    #[error("{count} problem(s) found in {}", .path.display())]
    Problems {
        /// Data directory checked.
        path: PathBuf,
        /// Number of problems.
        count: usize,
    },
}

/// One problem in the data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// A required file is absent.
    MissingFile(PathBuf),
    /// A file could not be read or parsed.
    Unreadable {
        /// File path.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },
    /// Unit data is inconsistent or its prerequisites form a cycle.
    UnitGraph(String),
    /// A token names no known unit kind.
    UnknownToken {
        /// File path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// Unit and count lines of a timeline group differ in length.
    TokenMismatch {
        /// File path.
        path: PathBuf,
        /// 1-based line number of the unit tokens.
        line: usize,
        /// Number of unit tokens.
        units: usize,
        /// Number of count tokens.
        counts: usize,
    },
    /// A blank catalog line, skipped when loading so later openings shift
    /// against outcome records written before it was added.
    BlankLine {
        /// File path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },
    /// A count token is not a non-negative integer.
    BadCount {
        /// File path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// An activation frame is not a non-negative integer.
    BadFrame {
        /// File path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Line content.
        text: String,
    },
    /// Lines after the last complete timeline group.
    TrailingLines {
        /// File path.
        path: PathBuf,
        /// Number of ignored lines.
        count: usize,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile(path) => write!(f, "{}: file missing", path.display()),
            Self::Unreadable { path, message } => write!(f, "{}: {message}", path.display()),
            Self::UnitGraph(message) => write!(f, "unit data: {message}"),
            Self::UnknownToken { path, line, token } => {
                write!(f, "{}:{line}: unknown unit kind '{token}'", path.display())
            }
            Self::TokenMismatch {
                path,
                line,
                units,
                counts,
            } => write!(
                f,
                "{}:{line}: {units} unit tokens but {counts} count tokens",
                path.display()
            ),
            Self::BlankLine { path, line } => {
                write!(f, "{}:{line}: blank line shifts opening indices", path.display())
            }
            Self::BadCount { path, line, token } => {
                write!(f, "{}:{line}: '{token}' is not a count", path.display())
            }
            Self::BadFrame { path, line, text } => {
                write!(f, "{}:{line}: '{text}' is not a frame", path.display())
            }
            Self::TrailingLines { path, count } => {
                write!(f, "{}: {count} trailing line(s) ignored", path.display())
            }
        }
    }
}

/// Findings from one validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems found, in the order they were found.
    pub findings: Vec<Finding>,
    /// Number of files read.
    pub files_checked: usize,
}

impl ValidationReport {
    /// Whether no problems were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

fn storage_finding(path: PathBuf, error: &StorageError) -> Finding {
    match error {
        StorageError::NotFound(_) => Finding::MissingFile(path),
        other => Finding::Unreadable {
            path,
            message: other.to_string(),
        },
    }
}

/// Build a registry from whatever unit data is present.
///
/// When prerequisites do not resolve, kinds are still registered so token
/// checks can go on.
fn build_registry(sets: &[RaceUnitData], report: &mut ValidationReport) -> UnitKindRegistry {
    match UnitKindRegistry::from_data(sets) {
        Ok(registry) => {
            if let Err(e) = registry.validate() {
                report.findings.push(Finding::UnitGraph(e.to_string()));
            }
            registry
        }
        Err(e) => {
            report.findings.push(Finding::UnitGraph(e.to_string()));
            let mut registry = UnitKindRegistry::new();
            for set in sets {
                for unit in &set.units {
                    registry.register(set.race, &unit.id, UnitRole::from_tags(&unit.tags));
                }
            }
            registry
        }
    }
}

fn check_tokens(
    registry: &UnitKindRegistry,
    race: Race,
    path: &Path,
    line: usize,
    tokens: &str,
    report: &mut ValidationReport,
) {
    for token in tokens.split_whitespace() {
        if registry.resolve_token(race, token).is_none() {
            report.findings.push(Finding::UnknownToken {
                path: path.to_path_buf(),
                line,
                token: token.to_string(),
            });
        }
    }
}

fn check_catalog(registry: &UnitKindRegistry, race: Race, path: &Path, text: &str, report: &mut ValidationReport) {
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            report.findings.push(Finding::BlankLine {
                path: path.to_path_buf(),
                line: i + 1,
            });
        } else {
            check_tokens(registry, race, path, i + 1, line, report);
        }
    }
}

fn check_timeline(registry: &UnitKindRegistry, race: Race, path: &Path, text: &str, report: &mut ValidationReport) {
    let lines: Vec<&str> = text.lines().map(|line| line.trim_end_matches('\r')).collect();

    for (group_index, group) in lines.chunks_exact(3).enumerate() {
        let first = group_index * 3 + 1;
        let (frame, units, counts) = (group[0], group[1], group[2]);

        if frame.trim().parse::<u32>().is_err() {
            report.findings.push(Finding::BadFrame {
                path: path.to_path_buf(),
                line: first,
                text: frame.to_string(),
            });
        }

        if let Err(PlannerError::ParseMismatch { units, counts }) =
            CompositionSpec::new(units, counts).check_lengths()
        {
            report.findings.push(Finding::TokenMismatch {
                path: path.to_path_buf(),
                line: first + 1,
                units,
                counts,
            });
        }

        check_tokens(registry, race, path, first + 1, units, report);
        for token in counts.split_whitespace() {
            if token.parse::<u32>().is_err() {
                report.findings.push(Finding::BadCount {
                    path: path.to_path_buf(),
                    line: first + 2,
                    token: token.to_string(),
                });
            }
        }
    }

    let trailing = lines.len() % 3;
    if trailing > 0 {
        report.findings.push(Finding::TrailingLines {
            path: path.to_path_buf(),
            count: trailing,
        });
    }
}

fn check_config(registry: &UnitKindRegistry, path: &Path, text: &str, report: &mut ValidationReport) {
    let config = match PlannerConfig::from_ron_str(text) {
        Ok(config) => config,
        Err(e) => {
            report.findings.push(Finding::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
            return;
        }
    };

    let tactics = &config.tactics;
    for token in tactics.worker_threat_kinds.iter().chain(&tactics.attack_trigger_kinds) {
        if registry.resolve_token(Race::Protoss, token).is_none() {
            report.findings.push(Finding::UnknownToken {
                path: path.to_path_buf(),
                line: 0,
                token: token.clone(),
            });
        }
    }
}

/// Check every data file under `path` and collect what is wrong.
///
/// Unit data is read first so catalog and timeline tokens can be resolved.
/// A race with no files at all is skipped; a race with some files must
/// have all three. The planner config is optional.
#[must_use]
pub fn check_data_directory(path: &Path) -> ValidationReport {
    let paths = DataPaths::new(path);
    let mut report = ValidationReport::default();

    let races: Vec<Race> = Race::ALL
        .into_iter()
        .filter(|&race| {
            [paths.units_path(race), paths.catalog_path(race), paths.timeline_path(race)]
                .iter()
                .any(|file| file.exists())
        })
        .collect();
    tracing::debug!("Races with data: {races:?}");

    let mut sets = Vec::new();
    for &race in &races {
        let file = paths.units_path(race);
        match read_unit_data(&file) {
            Ok(set) => {
                report.files_checked += 1;
                sets.push(set);
            }
            Err(e) => report.findings.push(storage_finding(file, &e)),
        }
    }
    let registry = build_registry(&sets, &mut report);

    for &race in &races {
        let file = paths.catalog_path(race);
        match read_text(&file) {
            Ok(text) => {
                report.files_checked += 1;
                check_catalog(&registry, race, &file, &text, &mut report);
            }
            Err(e) => report.findings.push(storage_finding(file, &e)),
        }

        let file = paths.timeline_path(race);
        match read_text(&file) {
            Ok(text) => {
                report.files_checked += 1;
                check_timeline(&registry, race, &file, &text, &mut report);
            }
            Err(e) => report.findings.push(storage_finding(file, &e)),
        }
    }

    let file = paths.config_path();
    match read_text(&file) {
        Ok(text) => {
            report.files_checked += 1;
            check_config(&registry, &file, &text, &mut report);
        }
        Err(StorageError::NotFound(_)) => tracing::debug!("No planner config, defaults apply"),
        Err(e) => report.findings.push(storage_finding(file, &e)),
    }

    report
}

/// Validate all data files in a directory, logging each problem.
///
/// # Errors
///
/// Returns an error if any data file fails validation.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport, ValidationError> {
    let report = check_data_directory(path);
    for finding in &report.findings {
        tracing::warn!("{finding}");
    }
    tracing::info!("Checked {} file(s)", report.files_checked);

    if report.is_clean() {
        Ok(report)
    } else {
        Err(ValidationError::Problems {
            path: path.to_path_buf(),
            count: report.findings.len(),
        })
    }
}

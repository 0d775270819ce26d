//! Error types for the decision core.
//!
//! None of these are fatal during a match. The planner absorbs them at its
//! boundary, logs them, and falls back to a degraded answer (empty catalog,
//! empty timeline, cold-start record) so every tick still gets a decision.

use thiserror::Error;

/// Result type alias using [`PlannerError`].
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Top-level error type for the decision core.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// A catalog or timeline source is absent.
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    /// A persisted outcome record could not be fully read.
    #[error("Malformed outcome record for '{opponent}': {message}")]
    MalformedRecord {
        /// Opponent the record belongs to.
        opponent: String,
        /// What was wrong with it.
        message: String,
    },

    /// Composition token lists could not be paired cleanly.
    #[error("Composition token mismatch: {units} unit tokens, {counts} count tokens")]
    ParseMismatch {
        /// Number of unit tokens.
        units: usize,
        /// Number of count tokens.
        counts: usize,
    },

    /// A token did not name a known unit kind.
    #[error("Unknown unit kind token: {0}")]
    UnknownUnitKind(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// The prerequisite graph contains a cycle through the named kinds.
    #[error("Prerequisite cycle: {}", .0.join(" -> "))]
    PrerequisiteCycle(Vec<String>),

    /// Persisting or loading an outcome record failed.
    #[error("Outcome store failure: {0}")]
    Store(String),
}

//! Headless runner for the build-order bot's decision core.
//!
//! This crate wires [`bob_core`] to files and to a sandbox opponent so the
//! planner can be exercised without a game:
//!
//! - **Selection**: Load the outcome history for an opponent and print the
//!   opening the bandit picks
//! - **Single match**: Play the planner against a scripted opponent
//! - **Batch learning**: Play many matches in a row, recording every
//!   outcome, and report how each opening fared
//!
//! # Example
//!
//! ```bash
//! # Which opening would be played next against zerg_rush?
//! cargo run -p bob_headless -- select --opponent zerg_rush
//!
//! # Play one match
//! cargo run -p bob_headless -- run --opponent zerg_rush
//!
//! # Learn over 50 matches
//! cargo run -p bob_headless -- batch --opponent zerg_rush --count 50 --output results/
//! ```
//!
//! Logs go to stderr; reports go to stdout or the output directory as JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod runner;
pub mod sandbox;
pub mod storage;

pub use batch::{run_batch, BatchConfig, BatchResults, OpeningSummary};
pub use runner::{play_match, MatchReport, MatchSettings, MatchSetup};
pub use sandbox::{OpponentProfile, SandboxResult, SandboxWorld};
pub use storage::{DataPaths, FileOutcomeStore, StorageError};

//! Data formats the planner is configured from.
//!
//! Unit kinds are described in RON; the opening catalog, attack timeline
//! and outcome records are plain line-oriented text files shared with
//! other tools.
//!
//! **Note:** This module contains no IO. It parses and formats strings;
//! file access lives in `bob_headless`.

mod text;
mod unit_data;

pub use text::{format_outcome_record, parse_catalog, parse_outcome_record, parse_timeline};
pub use unit_data::{RaceUnitData, UnitKindData};

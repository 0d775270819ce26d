//! # Build-Order Bot Development Tools
//!
//! Command-line tools for development:
//! - Data validators for opening catalogs, attack timelines, unit data and
//!   planner config

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;

//! # Build Order Bot Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture world, registry and outcome store
//! - Determinism harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;

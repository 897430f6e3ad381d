//! Execution engine for rolesync
//!
//! Planning and state bookkeeping live in the `declarative` crate; this
//! module adds the terminal side:
//! 1. Diffing - Show what a plan will change
//! 2. Executing - Confirm, apply with progress output, summarize

pub mod differ;
pub mod executor;

pub use differ::display_plan;
pub use executor::{RunOptions, run};

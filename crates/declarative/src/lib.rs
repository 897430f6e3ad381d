//! # Declarative
//!
//! A framework for declarative resource lifecycles.
//!
//! Resources are declared, the framework remembers what it last applied for
//! each one, and every run converges the declared set against that record.
//!
//! ## Core Concepts
//!
//! - **Resource**: One declared thing with `create`, `update` and `delete` hooks
//! - **Record**: What was last applied for a resource, persisted in a [`StateFile`]
//! - **ExecutionPlan**: Which hook to run for each resource, and which are in sync
//! - **Executor**: Runs the plan in order and records each outcome
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, ExecutionPlan, StateFile, execute_simple};
//!
//! let mut state = StateFile::load(&path)?;
//! let plan = ExecutionPlan::build(declared, &state, &factory, None)?;
//! let summary = execute_simple(plan, &mut state, &ExecuteOptions::default())?;
//! state.save(&path)?;
//! ```
//!
//! ## Provider Traits
//!
//! - [`ResourceFactory`]: Rebuilds resources that are recorded but no longer declared
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This keeps the crate free of UI and transport dependencies.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod record;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback,
};
pub use diff::{compute_diffs, group_by_type, DiffSummary, ResourceDiff};
pub use executor::{execute, execute_simple};
pub use planner::{Action, ExecutionPlan, PlannedChange};
pub use record::{record_key, Record, StateFile, STATE_VERSION};
pub use resource::{BoxedResource, Resource, ResourceFactory};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};

//! Resource trait for declarative lifecycle management
//!
//! A Resource is one declared thing with a lifecycle:
//!
//! ```text
//! ABSENT --create--> PRESENT --update--> PRESENT --delete--> ABSENT
//! ```
//!
//! The framework decides which hook to run from the recorded state and the
//! declaration; the resource only knows how to run each hook.

use crate::context::ApplyContext;
use crate::record::Record;
use crate::types::{ApplyResult, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// Every hook must be idempotent: the framework re-runs the full cycle after
/// any failure.
///
/// # Example
///
/// ```ignore
/// use declarative::{ApplyContext, ApplyResult, Record, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct Flag { name: String }
///
/// impl Resource for Flag {
///     fn id(&self) -> String { self.name.clone() }
///     fn description(&self) -> String { format!("Flag {}", self.name) }
///     fn resource_type(&self) -> &'static str { "flag" }
///     fn attributes(&self) -> anyhow::Result<serde_json::Value> {
///         Ok(serde_json::json!({ "name": self.name }))
///     }
///     fn current_state(&self) -> anyhow::Result<ResourceState> { Ok(ResourceState::Absent) }
///     fn desired_state(&self) -> ResourceState { ResourceState::Present { details: None } }
///     fn create(&self, _ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         Ok(ApplyResult::Created)
///     }
///     fn update(&self, _prior: &Record, _ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         Ok(ApplyResult::Modified)
///     }
///     fn delete(&self, _ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         Ok(ApplyResult::Removed)
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Unique identifier for this resource within its type
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping, filtering and state keys
    fn resource_type(&self) -> &'static str;

    /// Attributes persisted in the state file once applied
    ///
    /// These come back as `prior` in [`Resource::update`] and are what
    /// [`ResourceFactory::restore`] rebuilds a resource from.
    fn attributes(&self) -> Result<serde_json::Value>;

    /// Detect the current state of this resource
    ///
    /// Return `Absent` when the remote target is gone.
    fn current_state(&self) -> Result<ResourceState>;

    /// Get the desired state for this resource
    fn desired_state(&self) -> ResourceState;

    /// Whether the declared state is in place
    ///
    /// Default implementation compares current and desired states.
    fn exists(&self) -> Result<bool> {
        Ok(self.current_state()? == self.desired_state())
    }

    /// Bring an absent resource into existence
    ///
    /// Return `TargetMissing` when the remote target does not exist.
    fn create(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;

    /// Move from the recorded `prior` attributes to the declared ones
    fn update(&self, prior: &Record, ctx: &mut ApplyContext) -> Result<ApplyResult>;

    /// Undo everything this resource put in place
    fn delete(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Rebuilds resources from their records
///
/// Needed for resources that are still recorded but no longer declared:
/// deleting them requires the attributes they were applied with.
pub trait ResourceFactory {
    /// Rebuild the resource a record was created from
    fn restore(&self, record: &Record) -> Result<BoxedResource>;
}

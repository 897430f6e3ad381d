//! Execution planner - decides which lifecycle hook each resource needs

use crate::record::{Record, StateFile};
use crate::resource::{BoxedResource, Resource, ResourceFactory};
use crate::types::ResourceState;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Lifecycle transition planned for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Not recorded yet (or a previous attempt failed): run `create`
    Create,
    /// Declared attributes changed since the last apply: run `update`
    Update,
    /// Attributes unchanged but drifted remotely: run `update` against itself
    Repair,
    /// Recorded but no longer declared: run `delete`
    Delete,
    /// Remote target is gone: drop the record, no remote call
    Refresh,
}

impl Action {
    /// One-character marker for diff output
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update | Self::Repair => "~",
            Self::Delete => "-",
            Self::Refresh => "?",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Repair => "repair",
            Self::Delete => "delete",
            Self::Refresh => "refresh",
        };
        write!(f, "{s}")
    }
}

/// One step of a plan
#[derive(Debug)]
pub struct PlannedChange {
    /// What to do
    pub action: Action,
    /// The resource to act on (restored from state for `Delete`/`Refresh`)
    pub resource: BoxedResource,
    /// Record the resource was last applied with
    pub prior: Option<Record>,
    /// State observed while planning
    pub current: ResourceState,
    /// Why remote state could not be read; the change fails without running
    pub read_error: Option<String>,
}

/// Ordered list of changes plus the resources that are already in sync
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    /// Changes to apply, in order
    pub changes: Vec<PlannedChange>,
    /// Keys (`type.id`) of declared resources needing nothing
    pub in_sync: Vec<String>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan convergence of `declared` against the recorded `state`
    ///
    /// Reads remote state for every declared resource that has a record.
    /// A failed read becomes a change with `ResourceState::Unknown` that the
    /// executor reports as failed, so other resources still converge.
    /// Resources and records outside `target` are ignored entirely.
    pub fn build(
        declared: Vec<BoxedResource>,
        state: &StateFile,
        factory: &dyn ResourceFactory,
        target: Option<&str>,
    ) -> Result<Self> {
        let target = target.map(Target::parse);
        let mut plan = Self::new();
        let mut seen = HashSet::new();

        for resource in declared {
            let key = crate::record::record_key(resource.resource_type(), &resource.id());
            if !seen.insert(key.clone()) {
                bail!("Resource {key} is declared more than once");
            }
            if !matches_target(target.as_ref(), resource.as_ref()) {
                continue;
            }
            match plan_declared(resource, state)? {
                Some(change) => plan.changes.push(change),
                None => plan.in_sync.push(key),
            }
        }

        for (key, record) in &state.records {
            if seen.contains(key) {
                continue;
            }
            let resource = factory.restore(record)?;
            if !matches_target(target.as_ref(), resource.as_ref()) {
                continue;
            }
            plan.changes.push(plan_removal(resource, record));
        }

        Ok(plan)
    }

    /// Plan deletion of every recorded resource matching `target`
    pub fn destroy(
        state: &StateFile,
        factory: &dyn ResourceFactory,
        target: Option<&str>,
    ) -> Result<Self> {
        let target = target.map(Target::parse);
        let mut plan = Self::new();

        for record in state.records.values() {
            let resource = factory.restore(record)?;
            if !matches_target(target.as_ref(), resource.as_ref()) {
                continue;
            }
            plan.changes.push(plan_removal(resource, record));
        }

        Ok(plan)
    }

    /// Filter plan to only include changes matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&PlannedChange) -> bool,
    {
        Self {
            changes: self.changes.into_iter().filter(|c| predicate(c)).collect(),
            in_sync: self.in_sync,
        }
    }

    /// Number of planned changes
    pub fn total_changes(&self) -> usize {
        self.changes.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

fn plan_declared(resource: BoxedResource, state: &StateFile) -> Result<Option<PlannedChange>> {
    let attributes = resource.attributes()?;
    let Some(record) = state.get(resource.resource_type(), &resource.id()).cloned() else {
        return Ok(Some(PlannedChange {
            action: Action::Create,
            resource,
            prior: None,
            current: ResourceState::Unknown,
            read_error: None,
        }));
    };

    let changed = record.attributes != attributes;
    let fallback = if changed {
        Action::Update
    } else if record.applied {
        Action::Repair
    } else {
        Action::Create
    };

    let observed = resource.current_state().and_then(|current| {
        let action = if !record.applied || changed {
            Some(fallback)
        } else if current.is_absent() {
            Some(Action::Refresh)
        } else if resource.exists()? {
            None
        } else {
            Some(Action::Repair)
        };
        Ok((action, current))
    });

    Ok(match observed {
        Ok((action, current)) => action.map(|action| PlannedChange {
            action,
            resource,
            prior: Some(record),
            current,
            read_error: None,
        }),
        Err(e) => {
            log::warn!("Could not read {}: {e:#}", record.key());
            Some(PlannedChange {
                action: fallback,
                resource,
                prior: Some(record),
                current: ResourceState::Unknown,
                read_error: Some(format!("{e:#}")),
            })
        }
    })
}

fn plan_removal(resource: BoxedResource, record: &Record) -> PlannedChange {
    let (action, current, read_error) = match resource.current_state() {
        Ok(current) if current.is_absent() => (Action::Refresh, current, None),
        Ok(current) => (Action::Delete, current, None),
        Err(e) => {
            log::warn!("Could not read {}: {e:#}", record.key());
            (Action::Delete, ResourceState::Unknown, Some(format!("{e:#}")))
        }
    };
    PlannedChange {
        action,
        resource,
        prior: Some(record.clone()),
        current,
        read_error,
    }
}

/// Parsed target filter: "type", "id" or "type.id"
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    raw: String,
    resource_type: String,
    name: Option<String>,
}

impl Target {
    fn parse(target: &str) -> Self {
        // ids may contain dots ("john.doe"), so only the first one separates
        let mut parts = target.splitn(2, '.');
        let resource_type = parts.next().unwrap_or_default().to_string();
        let name = parts.next().map(str::to_string);
        Self {
            raw: target.to_string(),
            resource_type,
            name,
        }
    }

    fn matches(&self, resource: &dyn Resource) -> bool {
        let id = resource.id();
        if id == self.raw {
            return true;
        }
        if resource.resource_type() != self.resource_type {
            return false;
        }
        self.name.as_ref().is_none_or(|name| *name == id)
    }
}

fn matches_target(target: Option<&Target>, resource: &dyn Resource) -> bool {
    target.is_none_or(|t| t.matches(resource))
}

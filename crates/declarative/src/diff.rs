//! Diff computation for planned changes

use crate::planner::{Action, ExecutionPlan, PlannedChange};
use crate::types::ResourceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// Planned lifecycle transition
    pub action: Action,
    /// Current state
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
    /// Remote read failure seen while planning
    pub read_error: Option<String>,
}

impl ResourceDiff {
    /// Create a diff from a planned change
    pub fn from_change(change: &PlannedChange) -> Self {
        let desired = match change.action {
            Action::Delete | Action::Refresh => ResourceState::Absent,
            _ => change.resource.desired_state(),
        };
        Self {
            resource_id: change.resource.id(),
            resource_type: change.resource.resource_type().to_string(),
            description: change.resource.description(),
            action: change.action,
            current: change.current.clone(),
            desired,
            read_error: change.read_error.clone(),
        }
    }

    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        self.action == Action::Create
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        matches!(self.action, Action::Delete | Action::Refresh)
    }

    /// Check if this diff represents a modification
    pub fn is_modification(&self) -> bool {
        matches!(self.action, Action::Update | Action::Repair)
    }
}

/// Compute diffs for every change in a plan
pub fn compute_diffs(plan: &ExecutionPlan) -> Vec<ResourceDiff> {
    plan.changes.iter().map(ResourceDiff::from_change).collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of resources to modify
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type
pub fn group_by_type(diffs: &[ResourceDiff]) -> BTreeMap<String, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<String, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(resource_type: &str, action: Action) -> ResourceDiff {
        ResourceDiff {
            resource_id: "x".into(),
            resource_type: resource_type.into(),
            description: String::new(),
            action,
            current: ResourceState::Unknown,
            desired: ResourceState::Unknown,
            read_error: None,
        }
    }

    #[test]
    fn test_summary() {
        let diffs = vec![
            diff("a", Action::Create),
            diff("a", Action::Update),
            diff("b", Action::Repair),
            diff("b", Action::Delete),
            diff("b", Action::Refresh),
        ];
        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.modifications, 2);
        assert_eq!(summary.removals, 2);
        assert!(summary.has_changes());
    }

    #[test]
    fn test_group_by_type() {
        let diffs = vec![diff("b", Action::Create), diff("a", Action::Create)];
        let groups = group_by_type(&diffs);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_summary() {
        assert!(!DiffSummary::from_diffs(&[]).has_changes());
    }
}

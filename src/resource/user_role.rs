//! Nexus user role assignment resource
//!
//! Manages a subset of one user's roles. Roles granted by anyone else stay
//! where they are.

use anyhow::{Context, Result};
use declarative::{ApplyContext, ApplyResult, Record, Resource, ResourceState};
use memberkit::{EntityStore, MemberSet, Observation, Ownership, Reconciler, WriteOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared handle to the remote store
pub type StoreHandle = Arc<dyn EntityStore>;

/// Attributes recorded in the state file for a user role resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAttributes {
    pub userid: String,
    pub roles: MemberSet,
    #[serde(default)]
    pub ownership: Ownership,
}

/// Roles managed on one Nexus user
#[derive(Clone)]
pub struct UserRole {
    attrs: UserRoleAttributes,
    reconciler: Reconciler<StoreHandle>,
}

impl fmt::Debug for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRole")
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

impl UserRole {
    pub fn new(attrs: UserRoleAttributes, store: StoreHandle) -> Self {
        Self {
            attrs,
            reconciler: Reconciler::new(store),
        }
    }

    fn userid(&self) -> &str {
        &self.attrs.userid
    }

    /// Write the declared roles, on top of whatever was applied before
    fn converge(&self, prior: &MemberSet) -> Result<WriteOutcome> {
        let userid = self.userid();
        let outcome = match self.attrs.ownership {
            Ownership::Shared => self.reconciler.update(userid, prior, &self.attrs.roles),
            Ownership::Exclusive => self.reconciler.apply_desired(userid, &self.attrs.roles),
        };
        outcome.with_context(|| format!("Failed to write roles of user {userid}"))
    }
}

fn outcome_result(outcome: &WriteOutcome, changed: ApplyResult) -> ApplyResult {
    match outcome {
        WriteOutcome::EntityAbsent => ApplyResult::TargetMissing,
        WriteOutcome::Unchanged { .. } => ApplyResult::NoChange,
        WriteOutcome::Written { .. } => changed,
    }
}

fn format_roles(roles: &MemberSet) -> String {
    if roles.is_empty() {
        "(none)".to_string()
    } else {
        roles.to_string()
    }
}

impl Resource for UserRole {
    fn id(&self) -> String {
        self.attrs.userid.clone()
    }

    fn description(&self) -> String {
        format!(
            "Roles [{}] on user {}",
            self.attrs.roles, self.attrs.userid
        )
    }

    fn resource_type(&self) -> &'static str {
        super::USER_ROLE
    }

    fn attributes(&self) -> Result<serde_json::Value> {
        serde_json::to_value(&self.attrs).context("Failed to encode user role attributes")
    }

    fn current_state(&self) -> Result<ResourceState> {
        let observation = self
            .reconciler
            .read(self.userid(), &self.attrs.roles)
            .with_context(|| format!("Failed to read user {}", self.userid()))?;

        Ok(match observation {
            Observation::Absent => ResourceState::Absent,
            Observation::Present { managed, .. } if managed == self.attrs.roles => {
                ResourceState::Present {
                    details: Some(format_roles(&managed)),
                }
            }
            Observation::Present { managed, .. } => ResourceState::Modified {
                from: format_roles(&managed),
                to: format_roles(&self.attrs.roles),
            },
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(format_roles(&self.attrs.roles)),
        }
    }

    fn exists(&self) -> Result<bool> {
        self.reconciler
            .exists(self.userid(), &self.attrs.roles, self.attrs.ownership)
            .with_context(|| format!("Failed to read user {}", self.userid()))
    }

    fn create(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let outcome = self.converge(&MemberSet::new())?;
        Ok(outcome_result(&outcome, ApplyResult::Created))
    }

    fn update(&self, prior: &Record, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let prior: UserRoleAttributes = prior.decode()?;
        let outcome = self.converge(&prior.roles)?;
        Ok(outcome_result(&outcome, ApplyResult::Modified))
    }

    fn delete(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let outcome = self
            .reconciler
            .delete(self.userid(), &self.attrs.roles)
            .with_context(|| format!("Failed to remove roles from user {}", self.userid()))?;
        Ok(outcome_result(&outcome, ApplyResult::Removed))
    }
}

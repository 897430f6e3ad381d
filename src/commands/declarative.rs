//! Declarative commands: plan, apply, destroy, status
//!
//! ```text
//! rolesync plan                  # Show what apply would change
//! rolesync plan user_role.jdoe   # Only one user
//! rolesync apply [--dry-run]     # Converge remote roles to the config
//! rolesync destroy               # Remove every role rolesync added
//! rolesync status                # Recorded vs remote, per user
//! ```

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ExecuteSummary, ExecutionPlan};
use memberkit::{MemberSet, Observation, Reconciler};

use super::Session;
use crate::Context;
use crate::engine::{self, RunOptions};
use crate::resource::{USER_ROLE, UserRoleAttributes};
use crate::ui;

// ============================================================================
// Plan
// ============================================================================

/// Show the plan without applying it
pub fn plan(ctx: &Context, target: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    let plan = build_plan(&session, target)?;
    engine::display_plan(&plan);
    Ok(())
}

fn build_plan(session: &Session, target: Option<&str>) -> Result<ExecutionPlan> {
    ExecutionPlan::build(
        session.declared(),
        &session.state,
        &session.factory(),
        target,
    )
}

// ============================================================================
// Apply / Destroy
// ============================================================================

/// Converge the remote side to the config
pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    let mut session = Session::open(ctx)?;
    if !ctx.quiet {
        ui::header("Applying role assignments");
    }
    let plan = build_plan(&session, target)?;
    let summary = execute(&mut session, plan, dry_run, yes)?;
    check(&summary)
}

/// Remove every recorded assignment, leaving only foreign roles
pub fn destroy(ctx: &Context, target: Option<&str>, yes: bool) -> Result<()> {
    let mut session = Session::open(ctx)?;
    if !ctx.quiet {
        ui::header("Destroying role assignments");
    }
    let plan = ExecutionPlan::destroy(&session.state, &session.factory(), target)?;
    let summary = execute(&mut session, plan, false, yes)?;
    check(&summary)
}

fn execute(
    session: &mut Session,
    plan: ExecutionPlan,
    dry_run: bool,
    yes: bool,
) -> Result<ExecuteSummary> {
    let opts = RunOptions { dry_run, yes };
    let summary = engine::run(plan, &mut session.state, &opts)?;

    // Failed resources are recorded too, so save unless nothing ran
    if !dry_run && summary.total() > summary.skipped {
        session.save_state()?;
    }
    Ok(summary)
}

fn check(summary: &ExecuteSummary) -> Result<()> {
    if !summary.is_success() {
        bail!("{} role assignments failed", summary.failed);
    }
    Ok(())
}

// ============================================================================
// Status
// ============================================================================

/// One row of the status table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub userid: String,
    pub declared: bool,
    pub recorded: Recorded,
    pub remote: RemoteStatus,
}

/// What the state file says about a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    None,
    Applied,
    Pending,
}

/// What the remote says about a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Missing,
    Present {
        present: MemberSet,
        missing: MemberSet,
        foreign: usize,
    },
}

/// Show recorded and remote state for each managed user
pub fn status(ctx: &Context, target: Option<&str>) -> Result<()> {
    let session = Session::open(ctx)?;
    ui::header("Role assignment status");

    let rows = collect_status(&session, target)?;
    if rows.is_empty() {
        ui::dim("No user roles declared or recorded");
        return Ok(());
    }

    for row in &rows {
        print_row(row);
    }
    Ok(())
}

fn collect_status(session: &Session, target: Option<&str>) -> Result<Vec<StatusRow>> {
    let mut wanted: Vec<(UserRoleAttributes, bool)> = session
        .config
        .user_roles
        .iter()
        .map(|entry| {
            (
                UserRoleAttributes {
                    userid: entry.userid.clone(),
                    roles: entry.roles.clone(),
                    ownership: entry.ownership,
                },
                true,
            )
        })
        .collect();

    for record in session.state.of_type(USER_ROLE) {
        if session.config.find_user(&record.id).is_none() {
            wanted.push((record.decode()?, false));
        }
    }

    let reconciler = Reconciler::new(session.store.clone());
    let mut rows = Vec::new();
    for (attrs, declared) in wanted {
        if !matches_target(target, &attrs.userid) {
            continue;
        }
        let recorded = match session.state.get(USER_ROLE, &attrs.userid) {
            None => Recorded::None,
            Some(r) if r.applied => Recorded::Applied,
            Some(_) => Recorded::Pending,
        };
        let remote = match reconciler.read(&attrs.userid, &attrs.roles)? {
            Observation::Absent => RemoteStatus::Missing,
            Observation::Present { user, managed } => RemoteStatus::Present {
                missing: attrs.roles.difference(&managed),
                foreign: user.roles.difference(&attrs.roles).len(),
                present: managed,
            },
        };
        rows.push(StatusRow {
            userid: attrs.userid,
            declared,
            recorded,
            remote,
        });
    }
    Ok(rows)
}

fn matches_target(target: Option<&str>, userid: &str) -> bool {
    match target {
        None => true,
        Some(t) if t == USER_ROLE || t == userid => true,
        Some(t) => t.strip_prefix("user_role.") == Some(userid),
    }
}

fn print_row(row: &StatusRow) {
    let recorded = match (row.recorded, row.declared) {
        (Recorded::Applied, true) => "applied".green(),
        (Recorded::Pending, _) => "pending retry".yellow(),
        (Recorded::None, _) => "not applied".yellow(),
        (Recorded::Applied, false) => "removed from config".red(),
    };

    match &row.remote {
        RemoteStatus::Missing => {
            println!(
                "  {} {:<24} {} ({})",
                "?".yellow(),
                row.userid,
                "user not found".red(),
                recorded
            );
        }
        RemoteStatus::Present {
            present,
            missing,
            foreign,
        } => {
            let symbol = if missing.is_empty() {
                "✓".green()
            } else {
                "~".yellow()
            };
            println!("  {} {:<24} {}", symbol, row.userid.bold(), recorded);
            ui::roles("managed", present);
            if !missing.is_empty() {
                ui::kv("missing", missing.to_string().red());
            }
            ui::kv("foreign", format!("{foreign} roles owned elsewhere"));
        }
    }
}

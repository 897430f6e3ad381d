//! Per-user commands: show, import, forget
//!
//! None of these write to the remote side. `import` and `forget` only touch
//! the state file.

use anyhow::{Result, bail};
use colored::Colorize;
use memberkit::{EntityStore, MemberSet, Ownership, User};

use super::Session;
use crate::Context;
use crate::resource::{USER_ROLE, UserRoleAttributes};
use crate::ui;

// ============================================================================
// Show
// ============================================================================

/// How a remote role relates to this configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleOrigin {
    /// Recorded as applied by rolesync
    Managed,
    /// Declared in the config but not recorded yet
    Declared,
    /// Assigned by someone else
    Foreign,
}

/// Print a user's profile and all of their roles
pub fn show(ctx: &Context, userid: &str) -> Result<()> {
    let session = Session::open(ctx)?;
    let Some(user) = session.store.get(userid)? else {
        bail!("User '{userid}' not found");
    };

    ui::header(format!("User {}", user.user_id));
    ui::kv("name", user.display_name());
    if !user.email_address.is_empty() {
        ui::kv("email", &user.email_address);
    }
    if !user.source.is_empty() {
        ui::kv("source", &user.source);
    }
    if !user.status.is_empty() {
        ui::kv("status", &user.status);
    }
    if user.read_only {
        ui::kv("read only", "yes");
    }

    ui::section("Roles");
    let roles = classify(&session, &user)?;
    if roles.is_empty() {
        ui::dim("(none)");
    }
    for (role, origin) in &roles {
        match origin {
            RoleOrigin::Managed => ui::role_line("●".green(), role, "(managed)"),
            RoleOrigin::Declared => ui::role_line("○".yellow(), role, "(declared)"),
            RoleOrigin::Foreign => ui::role_line("·".dimmed(), role, ""),
        }
    }

    if !user.external_roles.is_empty() {
        ui::section("External roles");
        for role in &user.external_roles {
            ui::role_line("·".dimmed(), role, "");
        }
    }

    Ok(())
}

/// Tag each remote role with where it came from
fn classify(session: &Session, user: &User) -> Result<Vec<(String, RoleOrigin)>> {
    let managed = match session.state.get(USER_ROLE, &user.user_id) {
        Some(record) if record.applied => record.decode::<UserRoleAttributes>()?.roles,
        _ => MemberSet::new(),
    };
    let declared = session
        .config
        .find_user(&user.user_id)
        .map(|entry| entry.roles.clone())
        .unwrap_or_default();

    Ok(user
        .roles
        .iter()
        .map(|role| {
            let origin = if managed.contains(role) {
                RoleOrigin::Managed
            } else if declared.contains(role) {
                RoleOrigin::Declared
            } else {
                RoleOrigin::Foreign
            };
            (role.to_string(), origin)
        })
        .collect())
}

// ============================================================================
// Import / Forget
// ============================================================================

/// Adopt roles a user already has into the state file
///
/// Without `--roles` the roles declared in the config are adopted. Every
/// adopted role must already be assigned remotely; nothing is written there.
pub fn import(ctx: &Context, userid: &str, roles: Option<MemberSet>) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let attrs = import_into(&mut session, userid, roles)?;
    session.save_state()?;
    ui::success(format!("Imported roles [{}] of user {userid}", attrs.roles));
    Ok(())
}

fn import_into(
    session: &mut Session,
    userid: &str,
    roles: Option<MemberSet>,
) -> Result<UserRoleAttributes> {
    if session.state.get(USER_ROLE, userid).is_some() {
        bail!("User '{userid}' is already managed; run `rolesync forget {userid}` first");
    }

    let declared = session.config.find_user(userid);
    let roles = match (roles, declared) {
        (Some(roles), _) => roles,
        (None, Some(entry)) => entry.roles.clone(),
        (None, None) => bail!("User '{userid}' is not in the config; pass --roles"),
    };
    let ownership = declared.map_or(Ownership::Shared, |entry| entry.ownership);

    let Some(user) = session.store.get(userid)? else {
        bail!("User '{userid}' not found");
    };
    let missing = roles.difference(&user.roles);
    if !missing.is_empty() {
        bail!("User '{userid}' does not have roles [{missing}]; apply them instead");
    }

    let attrs = UserRoleAttributes {
        userid: userid.to_string(),
        roles,
        ownership,
    };
    session
        .state
        .mark_applied(USER_ROLE, userid, serde_json::to_value(&attrs)?);
    log::info!("Imported {USER_ROLE}.{userid}");
    Ok(attrs)
}

/// Drop a user from the state file without touching the remote
pub fn forget(ctx: &Context, userid: &str) -> Result<()> {
    let mut session = Session::open(ctx)?;
    match session.state.forget(USER_ROLE, userid) {
        Some(_) => {
            session.save_state()?;
            ui::success(format!("Forgot user {userid}; its roles stay assigned"));
        }
        None => ui::warn(format!("User '{userid}' is not in the state file")),
    }
    Ok(())
}

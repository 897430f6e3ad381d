//! Plan display - rolesync-specific UI

use colored::Colorize;
use declarative::{Action, DiffSummary, ExecutionPlan, ResourceDiff, ResourceState};

/// Human name for a resource type heading
fn type_heading(resource_type: &str) -> &str {
    match resource_type {
        crate::resource::USER_ROLE => "User roles",
        other => other,
    }
}

fn symbol(action: Action) -> colored::ColoredString {
    match action {
        Action::Create => action.symbol().green(),
        Action::Update | Action::Repair => action.symbol().yellow(),
        Action::Delete => action.symbol().red(),
        Action::Refresh => action.symbol().dimmed(),
    }
}

/// One-line description of the state transition
fn describe(diff: &ResourceDiff) -> String {
    if let Some(error) = &diff.read_error {
        return format!("(cannot read current roles: {error})");
    }
    match diff.action {
        Action::Create => format!(
            "(not applied) → {}",
            diff.desired.details().unwrap_or("desired")
        ),
        Action::Update | Action::Repair => format!(
            "{} → {}",
            diff.current.details().unwrap_or("current"),
            diff.desired.details().unwrap_or("desired")
        ),
        Action::Delete => format!(
            "(will remove {})",
            match &diff.current {
                ResourceState::Modified { to, .. } => to.as_str(),
                other => other.details().unwrap_or("managed members"),
            }
        ),
        Action::Refresh => "(user no longer exists, forgetting)".to_string(),
    }
}

/// Display the changes of a plan
pub fn display_plan(plan: &ExecutionPlan) {
    let diffs = declarative::compute_diffs(plan);

    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        if !plan.in_sync.is_empty() {
            println!("    {} resources in sync", plan.in_sync.len());
        }
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Role Assignment Diff".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in declarative::group_by_type(&diffs) {
        println!("│ {}", type_heading(&resource_type).bold());

        for diff in type_diffs {
            let action = if diff.action == Action::Repair {
                format!(" [{}]", diff.action).yellow().to_string()
            } else {
                String::new()
            };
            println!(
                "│   {} {:<30} {}{}",
                symbol(diff.action),
                diff.resource_id,
                describe(diff).dimmed(),
                action
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(&diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to add, {} to change, {} to remove",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

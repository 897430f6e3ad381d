//! Execution engine - rolesync executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyResult, ConfirmCallback, ExecuteOptions, ExecuteSummary, ExecutionPlan, ProgressCallback,
    StateFile,
};

use super::differ::display_plan;

/// Options for a run (adds `yes` for confirmation skip)
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Walk the plan without writing anything
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
}

/// Show the plan, confirm, and execute it against `state`
pub fn run(
    plan: ExecutionPlan,
    state: &mut StateFile,
    opts: &RunOptions,
) -> Result<ExecuteSummary> {
    display_plan(&plan);

    if plan.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    let exec_opts = ExecuteOptions {
        dry_run: opts.dry_run,
    };
    let mut progress = TermProgress {
        dry_run: opts.dry_run,
        ..Default::default()
    };
    let mut confirm = PromptConfirm { yes: opts.yes };

    let summary = declarative::execute(plan, state, &exec_opts, &mut progress, &mut confirm)?;

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(summary);
    }

    if summary.total() > 0 && summary.skipped == summary.total() {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(summary);
    }

    print_summary(&summary);
    Ok(summary)
}

/// Prints one line per resource as it completes
#[derive(Debug, Default)]
pub struct TermProgress {
    dry_run: bool,
    done: usize,
    total: usize,
}

impl ProgressCallback for TermProgress {
    fn on_batch_start(&mut self, count: usize) {
        self.total = count;
        self.done = 0;
        let verb = if self.dry_run { "Checking" } else { "Applying" };
        println!();
        println!("  {} {verb} {count} changes...", "→".cyan());
    }

    fn on_resource_start(&mut self, id: &str, description: &str) {
        log::debug!("Starting {id}: {description}");
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        self.done += 1;
        let counter = format!("[{}/{}]", self.done, self.total).dimmed();
        match result {
            ApplyResult::NoChange => {
                println!("    {} {} {id} (already in place)", counter, "○".dimmed());
            }
            ApplyResult::Created => println!("    {} {} {id} created", counter, "✓".green()),
            ApplyResult::Modified => println!("    {} {} {id} updated", counter, "✓".green()),
            ApplyResult::Removed => println!("    {} {} {id} removed", counter, "✓".green()),
            ApplyResult::TargetMissing => println!(
                "    {} {} {id} user not found, dropped from state",
                counter,
                "?".yellow()
            ),
            ApplyResult::Skipped { reason } => {
                println!("    {} {} {id} skipped: {reason}", counter, "⊘".dimmed());
            }
            ApplyResult::Failed { error } => {
                println!("    {} {} {id} {}", counter, "✗".red(), error.red());
            }
        }
    }

    fn on_batch_complete(&mut self) {}
}

/// Asks on the terminal unless `--yes` was given
#[derive(Debug)]
pub struct PromptConfirm {
    pub yes: bool,
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Roles applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Roles applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} assignments created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} assignments updated", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} assignments removed", summary.removed);
    }
    if summary.no_change > 0 {
        println!("    • {} already in place", summary.no_change);
    }
    if summary.missing > 0 {
        println!("    • {} users not found", summary.missing);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "assignments".red());
    }
}

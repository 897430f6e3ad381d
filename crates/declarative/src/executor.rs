//! Execution engine - runs planned lifecycle hooks and records the outcome

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback};
use crate::planner::{Action, ExecutionPlan, PlannedChange};
use crate::record::StateFile;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;

/// Execute a plan with the given options and callbacks
///
/// Changes run one at a time, in plan order. A failing hook marks its
/// resource as not applied and execution continues with the next one.
/// `state` is updated in memory; persisting it is up to the caller.
/// A dry run skips confirmation, hands `dry_run` to every hook and leaves
/// `state` untouched.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `state` - Recorded state, updated after every change
/// * `opts` - Execution options
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
pub fn execute<P, C>(
    plan: ExecutionPlan,
    state: &mut StateFile,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let total_changes = plan.total_changes();

    if total_changes == 0 {
        return Ok(ExecuteSummary::default());
    }

    if !opts.dry_run && !confirm.confirm("Apply changes?")? {
        return Ok(ExecuteSummary {
            skipped: total_changes,
            ..Default::default()
        });
    }

    let mut summary = ExecuteSummary::default();
    let ctx = ApplyContext::new(opts.dry_run);

    progress.on_batch_start(total_changes);
    for change in &plan.changes {
        let id = change.resource.id();
        progress.on_resource_start(&id, &change.resource.description());
        let result = apply_change(change, state, ctx);
        progress.on_resource_complete(&id, &result);
        summary.add_result(&result);
    }
    progress.on_batch_complete();

    Ok(summary)
}

/// Run one change and record its outcome
fn apply_change(
    change: &PlannedChange,
    state: &mut StateFile,
    mut ctx: ApplyContext,
) -> ApplyResult {
    let resource = change.resource.as_ref();
    let resource_type = resource.resource_type();
    let id = resource.id();

    log::debug!("{} {}.{}", change.action, resource_type, id);

    let outcome = match (&change.read_error, change.action) {
        (Some(error), _) => Err(anyhow::anyhow!("{error}")),
        (None, Action::Refresh) if ctx.dry_run => Ok(ApplyResult::Skipped {
            reason: "Dry run".to_string(),
        }),
        (None, Action::Refresh) => Ok(ApplyResult::TargetMissing),
        (None, Action::Create) => resource.create(&mut ctx),
        (None, Action::Delete) => resource.delete(&mut ctx),
        (None, Action::Update | Action::Repair) => match &change.prior {
            Some(prior) => resource.update(prior, &mut ctx),
            None => resource.create(&mut ctx),
        },
    };

    let result = outcome.and_then(|result| {
        if !ctx.dry_run {
            record_success(change.action, resource, &result, state)?;
        }
        Ok(result)
    });

    match result {
        Ok(result) => result,
        Err(e) => {
            log::warn!("{} {}.{} failed: {:#}", change.action, resource_type, id, e);
            if !ctx.dry_run {
                state.mark_failed(resource_type, &id, &format!("{e:#}"));
            }
            ApplyResult::Failed {
                error: format!("{e:#}"),
            }
        }
    }
}

fn record_success(
    action: Action,
    resource: &dyn crate::resource::Resource,
    result: &ApplyResult,
    state: &mut StateFile,
) -> Result<()> {
    let resource_type = resource.resource_type();
    let id = resource.id();

    match (action, result) {
        (_, ApplyResult::Failed { error }) => {
            state.mark_failed(resource_type, &id, error);
        }
        (_, ApplyResult::Skipped { .. }) => {}
        (_, ApplyResult::TargetMissing) | (Action::Delete | Action::Refresh, _) => {
            state.forget(resource_type, &id);
        }
        _ => {
            state.mark_applied(resource_type, &id, resource.attributes()?);
        }
    }
    Ok(())
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(
    plan: ExecutionPlan,
    state: &mut StateFile,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, state, opts, &mut NoProgress, &mut AutoConfirm)
}

//! Declarative commands
//!
//! - `validate` - Check declarations offline
//! - `plan` - Preview what apply would change
//! - `apply` - Make live permissions match the declared state

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use dialoguer::Confirm;
use permissions::{Client, Plan};

use crate::Context;
use crate::cli::{ApplyArgs, ConfigArgs, PlanArgs};
use crate::config::{self, PermissionsFile};
use crate::engine::{self, ExecuteOptions, differ};
use crate::ui;

fn load(args: &ConfigArgs) -> Result<PermissionsFile> {
    let path = config::resolve_path(args.config.as_deref())?;
    log::info!("Loading declarations from {}", path.display());
    PermissionsFile::load(&path)
}

// ============================================================================
// Validate
// ============================================================================

pub fn validate(ctx: &Context, args: &ConfigArgs) -> Result<()> {
    let file = load(args)?;
    let selected = file.select(args.target.as_deref())?;

    let mut invalid = 0;
    for decl in &selected {
        match decl.validate() {
            Ok(declaration) => {
                if !ctx.quiet {
                    ui::success(&format!(
                        "{} {}",
                        decl.label(),
                        format!(
                            "({}, {} grants)",
                            declaration.object_type,
                            declaration.access_control.len()
                        )
                        .dimmed()
                    ));
                }
            }
            Err(err) => {
                invalid += 1;
                ui::report(&decl.label(), &err);
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} of {} declarations are invalid", selected.len());
    }
    Ok(())
}

// ============================================================================
// Plan / Apply
// ============================================================================

/// Plan the selected declarations, reporting the ones that fail
fn plan_selected(
    client: &Client,
    args: &ConfigArgs,
    jobs: usize,
) -> Result<(Vec<(String, Plan)>, usize)> {
    let file = load(args)?;
    let selected = file.select(args.target.as_deref())?;
    let caller = client.me().context("Could not identify the calling user")?;
    log::debug!("Planning {} declarations as {caller}", selected.len());

    let mut plans = Vec::new();
    let mut failures = 0;
    for (label, result) in engine::plan_all(client, &caller, &selected, jobs)? {
        match result {
            Ok(plan) => plans.push((label, plan)),
            Err(err) => {
                failures += 1;
                ui::report(&label, &err);
            }
        }
    }
    Ok((plans, failures))
}

pub fn plan(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let client = super::connect(ctx)?;
    let (plans, failures) = plan_selected(&client, &args.config, args.jobs as usize)?;
    differ::display_plans(&plans);

    if failures > 0 {
        bail!("{failures} declarations could not be planned");
    }
    Ok(())
}

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let client = super::connect(ctx)?;
    let (plans, failures) = plan_selected(&client, &args.config, args.jobs as usize)?;
    differ::display_plans(&plans);

    let pending = plans.iter().filter(|(_, p)| !p.is_noop()).count();
    if args.dry_run {
        println!();
        ui::info("Dry run - no changes written");
        return finish(failures);
    }
    if pending == 0 {
        return finish(failures);
    }
    if failures > 0 && args.fail_fast {
        bail!("{failures} declarations could not be planned; nothing written");
    }

    if !args.yes {
        println!();
        let confirmed = Confirm::new()
            .with_prompt(format!("Apply changes to {pending} objects?"))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            ui::warn("Cancelled");
            return Ok(());
        }
    }

    let opts = ExecuteOptions {
        jobs: args.jobs as usize,
        fail_fast: args.fail_fast,
        quiet: ctx.quiet,
    };
    let summary = engine::execute(&client, &plans, &opts)?;

    if !summary.is_success() {
        bail!(
            "{} objects failed, {} skipped",
            summary.failed,
            summary.skipped
        );
    }
    finish(failures)
}

fn finish(failures: usize) -> Result<()> {
    if failures > 0 {
        bail!("{failures} declarations could not be planned");
    }
    Ok(())
}

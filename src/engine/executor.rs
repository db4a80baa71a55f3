//! Execution engine - parallel planning and apply with UI integration

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use permissions::{Client, Error, PermissionsConfig, Plan};
use rayon::prelude::*;

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Number of parallel jobs
    pub jobs: usize,
    /// Cancel remaining work after the first failure
    pub fail_fast: bool,
    /// Hide the progress bar
    pub quiet: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            fail_fast: false,
            quiet: false,
        }
    }
}

/// Outcome of applying one plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    NoChange,
    Modified,
    Skipped { reason: String },
    Failed { error: String },
}

impl ApplyResult {
    fn symbol(&self) -> &'static str {
        match self {
            Self::NoChange => "○",
            Self::Modified => "✓",
            Self::Skipped { .. } => "⊘",
            Self::Failed { .. } => "✗",
        }
    }
}

/// Summary of execution results
#[derive(Debug, Default)]
pub struct ExecuteSummary {
    pub modified: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

fn build_pool(jobs: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create thread pool")
}

fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let template = "  {spinner} Applying [{bar:30}] {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Plan every declaration in parallel, keeping input order
pub fn plan_all(
    client: &Client,
    caller: &str,
    configs: &[&PermissionsConfig],
    jobs: usize,
) -> Result<Vec<(String, permissions::Result<Plan>)>> {
    let pool = build_pool(jobs)?;
    Ok(pool.install(|| {
        configs
            .par_iter()
            .map(|config| (config.label(), client.plan(caller, config)))
            .collect()
    }))
}

/// Apply plans in parallel
///
/// With `fail_fast`, the first failure cancels the client's token; plans
/// that had not yet issued their write are reported as skipped.
pub fn execute(
    client: &Client,
    plans: &[(String, Plan)],
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    let pool = build_pool(opts.jobs)?;
    let pb = progress_bar(plans.len(), opts.quiet);

    let results: Vec<(&str, ApplyResult)> = pool.install(|| {
        plans
            .par_iter()
            .map(|(label, plan)| {
                let result = apply_one(client, plan);
                if opts.fail_fast && matches!(result, ApplyResult::Failed { .. }) {
                    client.cancel_token().cancel();
                }
                pb.set_message(format!("{} {}", result.symbol(), label));
                pb.inc(1);
                (label.as_str(), result)
            })
            .collect()
    });
    pb.finish_and_clear();

    let mut summary = ExecuteSummary::default();
    for (label, result) in &results {
        match result {
            ApplyResult::NoChange => summary.no_change += 1,
            ApplyResult::Modified => {
                summary.modified += 1;
                println!("    {} {}", "✓".green(), label);
            }
            ApplyResult::Skipped { reason } => {
                summary.skipped += 1;
                println!("    {} {} {}", "⊘".yellow(), label, format!("({reason})").dimmed());
            }
            ApplyResult::Failed { error } => {
                summary.failed += 1;
                println!("    {} {}: {}", "✗".red(), label, error);
            }
        }
    }

    print_summary(&summary);
    Ok(summary)
}

fn apply_one(client: &Client, plan: &Plan) -> ApplyResult {
    if plan.is_noop() {
        return ApplyResult::NoChange;
    }
    match client.apply(plan) {
        Ok(()) => ApplyResult::Modified,
        Err(Error::Cancelled) => ApplyResult::Skipped {
            reason: "cancelled after an earlier failure".to_string(),
        },
        Err(err) => ApplyResult::Failed {
            error: err.to_string(),
        },
    }
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Permissions applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Permissions applied with errors", "⚠".yellow().bold());
    }

    if summary.modified > 0 {
        println!("    • {} objects updated", summary.modified);
    }
    if summary.no_change > 0 {
        println!("    • {} objects already in sync", summary.no_change);
    }
    if summary.skipped > 0 {
        println!("    • {} objects skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "objects".red());
    }
}

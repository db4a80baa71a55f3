//! Plan display

use colored::Colorize;
use permissions::{DiffSummary, Plan};

/// Display plans in a user-friendly format
pub fn display_plans(plans: &[(String, Plan)]) {
    let changed: Vec<_> = plans.iter().filter(|(_, p)| !p.is_noop()).collect();
    if changed.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Permissions Diff".bold()
    );
    println!("│");

    let mut summary = DiffSummary::default();
    for (label, plan) in &changed {
        println!(
            "│ {} {}",
            label.bold(),
            format!("({} {})", plan.object.object_type, plan.object).dimmed()
        );

        if plan.observed.is_none() {
            println!("│   {} {}", "!".red(), "object does not exist".red());
            println!("│");
            continue;
        }

        let diff = &plan.diff;
        let rows = diff
            .added()
            .map(|g| ("+".green(), g))
            .chain(diff.changed().map(|g| ("~".yellow(), g)))
            .chain(diff.removed().map(|g| ("-".red(), g)));
        for (symbol, grant) in rows {
            let state_desc = format!(
                "{} → {}",
                grant.current.as_deref().unwrap_or("(none)"),
                grant.desired.as_deref().unwrap_or("(none)")
            );
            println!(
                "│   {} {:<30} {}",
                symbol,
                grant.principal.to_string(),
                state_desc.dimmed()
            );
        }
        summary.merge(plan.diff.summary());
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} objects, {} grants ({} added, {} changed, {} removed)",
        changed.len().to_string().bold(),
        summary.total(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

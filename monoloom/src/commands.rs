//! Command implementations for the CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use owo_colors::OwoColorize;

use monoloom_analyzers::EsModuleAnalyzer;
use monoloom_core::report::{RunReport, StepOutcome};
use monoloom_core::{Installer, WorkspaceConfig};

pub fn cmd_install(config_path: PathBuf) -> Result<()> {
    let start = Instant::now();

    let config = WorkspaceConfig::load(&config_path)?;
    let analyzer = Arc::new(EsModuleAnalyzer::new(&config));
    let installer = Installer::new(config, analyzer);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;
    let outcome = rt.block_on(installer.install())?;

    print_report(&outcome.report);

    println!(
        "  {} in {:.2}s",
        "Done".green().bold(),
        start.elapsed().as_secs_f64()
    );
    println!();

    Ok(())
}

fn status(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Succeeded => "OK".green().to_string(),
        StepOutcome::Skipped => "--".bright_black().to_string(),
        StepOutcome::Failed(message) => format!("{} {}", "FAILED".red(), message),
    }
}

fn print_report(report: &RunReport) {
    println!("{}", "[Installing workspace]".bold().cyan());
    println!();

    for link in &report.links {
        println!("  link {} {}", link.path.display(), status(&link.outcome));
    }
    for copy in &report.copies {
        println!("  copy {} {}", copy.target.display(), status(&copy.outcome));
    }
    if !report.links.is_empty() || !report.copies.is_empty() {
        println!();
    }

    for pkg in &report.packages {
        println!(
            "  {} scaffold {} deps {} refs {}",
            pkg.name.bold().white(),
            status(&pkg.scaffold),
            status(&pkg.manifest),
            status(&pkg.reference),
        );
        if !pkg.pinned.is_empty() {
            println!(
                "    {} {}",
                "pinned:".bright_black(),
                pkg.pinned.join(", ")
            );
        }
        if !pkg.unpinned.is_empty() {
            println!(
                "    {} {}",
                "no version metadata:".yellow(),
                pkg.unpinned.join(", ")
            );
        }
        if let StepOutcome::Failed(message) = &pkg.analysis {
            println!("    {} {}", "analysis:".red(), message);
        }
    }
    println!();

    if let Some(order) = &report.build_order {
        println!(
            "  {} {}",
            "build order:".bright_black(),
            order.join(" -> ")
        );
    }
    if let Some(warning) = &report.cycle_warning {
        println!("  {} {}", "WARNING:".yellow(), warning);
    }
    if let Some(aggregate) = &report.aggregate {
        println!("  root references {}", status(aggregate));
    }

    let failures = report.failure_count();
    if failures > 0 {
        println!(
            "  {} {} step(s) failed; run continued per package",
            "WARNING:".yellow(),
            failures.to_string().bold()
        );
    }
    println!();
}

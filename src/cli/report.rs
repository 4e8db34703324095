use colored::*;

use crate::agent::{PipelineOutcome, PipelineReport, PipelineRun};
use crate::config::Config;

pub(crate) fn render_header(goal: &str, config: &Config, mock: bool) {
    println!();
    println!("{}", "=== triad pipeline ===".bold());
    println!("Goal: {}", goal.cyan());
    if mock {
        println!("Provider: {}", "offline stand-in".yellow());
    } else {
        println!(
            "Provider: {} ({})",
            config.llm.provider.display_name(),
            config.llm.model
        );
    }
    println!("Workspace: {}", config.workspace.dir.display());
    println!();
}

pub(crate) fn render_run(run: &PipelineRun) {
    match &run.outcome {
        PipelineOutcome::Completed(report) => render_report(report),
        PipelineOutcome::Failed { phase, error } => {
            println!();
            println!("{} during {}", "Pipeline failed".bold().red(), phase);
            println!("{error}");
        }
    }
}

fn render_report(report: &PipelineReport) {
    println!();
    println!("{}", "=== Result ===".bold());
    println!(
        "Task: {} in {}",
        report.spec.entry_point_name.bold(),
        report.spec.filename
    );

    let detection = if report.defect_detected {
        "caught".green()
    } else {
        "not detected".yellow()
    };
    println!(
        "Initial run: defect {} ({})",
        detection, report.initial_verdict.reason
    );

    let status = if report.passed() {
        "PASSED".bold().green()
    } else {
        "FAILED".bold().red()
    };
    println!("Final verdict: {} - {}", status, report.final_verdict.reason);

    println!();
    println!("Buggy version: {}", report.artifacts.buggy.display());
    println!("Fixed version: {}", report.artifacts.fixed.display());
    println!("Tests:         {}", report.artifacts.tests.display());
}

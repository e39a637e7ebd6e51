//! Check command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::warn;

use javalint_core::{Pipeline, ToolStatus, absolutize};

use crate::cli::{CheckArgs, Cli};
use crate::output::output_report;
use crate::settings::{Settings, rebase_rulesets};

/// Runs the pipeline on one file. Returns whether any diagnostics were found.
pub fn run_check(cli: &Cli, args: &CheckArgs) -> Result<bool> {
    let cwd = std::env::current_dir().into_diagnostic()?;
    let target = absolutize(&cwd, &args.file);
    if !target.is_file() {
        return Err(miette::miette!("File not found: {}", target.display()));
    }

    let settings = overrides(args, &cwd).layered_over(Settings::load_for(&target, cli.config.as_deref())?);

    // javac needs somewhere to put class files; they are discarded.
    let output_dir = tempfile::Builder::new()
        .prefix("javalint-")
        .tempdir()
        .into_diagnostic()?;
    let config = settings.into_config(output_dir.path().to_path_buf());

    let report = Pipeline::new().analyze(&target, &config).into_diagnostic()?;

    for outcome in &report.outcomes {
        match &outcome.status {
            ToolStatus::Completed { .. } => {}
            ToolStatus::Unavailable { reason } => {
                warn!("{} was skipped: {}", outcome.tool, reason)
            }
            ToolStatus::Crashed { reason } => warn!("{} failed: {}", outcome.tool, reason),
            ToolStatus::TimedOut => warn!("{} timed out", outcome.tool),
        }
    }

    output_report(&report, args.format, &config.presentation)?;

    Ok(!report.passed())
}

/// Settings layer built from command-line flags. A relative `--ruleset`
/// file is taken from `cwd`.
fn overrides(args: &CheckArgs, cwd: &Path) -> Settings {
    Settings {
        do_xlint: args.no_xlint.then_some(false),
        do_pmd: args.no_pmd.then_some(false),
        ruleset_path: args.ruleset.as_deref().map(|r| rebase_rulesets(cwd, r)),
        rules: args.rules.clone(),
        timeout_secs: args.timeout,
        ..Settings::default()
    }
}

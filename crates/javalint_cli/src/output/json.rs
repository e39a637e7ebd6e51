//! JSON output formatter

use javalint_core::AnalysisReport;
use miette::{IntoDiagnostic, Result};

pub fn output_json(report: &AnalysisReport) -> Result<()> {
    let output = serde_json::json!({
        "path": report.file.display().to_string(),
        "passed": report.passed(),
        "diagnostics": report.diagnostics,
        "tools": report.outcomes,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).into_diagnostic()?
    );
    Ok(())
}

//! Output formatting module

mod json;
mod text;

use javalint_core::{AnalysisReport, PresentationConfig};
use miette::Result;

use crate::cli::OutputFormat;

pub fn output_report(
    report: &AnalysisReport,
    format: OutputFormat,
    presentation: &PresentationConfig,
) -> Result<()> {
    match format {
        OutputFormat::Json => json::output_json(report),
        OutputFormat::Text => {
            text::output_text(report, presentation.results_pane);
            Ok(())
        }
    }
}

//! Text output formatter

use javalint_core::AnalysisReport;

pub fn output_text(report: &AnalysisReport, results_pane: bool) {
    if results_pane {
        print!("{}", report.render());
    }

    println!();
    println!(
        "Found {} error(s) and {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
}

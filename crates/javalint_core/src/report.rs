//! Fixed-width report rows and the per-run report.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::runner::ToolOutcome;
use crate::{Diagnostic, Severity};

/// Width of the right-aligned line number column.
const LINE_NUMBER_WIDTH: usize = 5;
/// Source text longer than this is truncated.
const MAX_SOURCE_WIDTH: usize = 80;
/// Length kept from a truncated source line, before the ellipsis.
const TRUNCATED_WIDTH: usize = 77;
/// Column (relative to the source text) where the message starts.
const MESSAGE_COLUMN: usize = 81;

/// Marker rendered instead of rows when a file has no diagnostics.
pub const PASS_MARKER: &str = "       -- pass -- ";

/// Formats one diagnostic as a report row:
/// `<line number>: <source text><padding><message>`.
pub fn format_row(diagnostic: &Diagnostic, source_line: &str) -> String {
    let text = truncate_source(source_line);
    let padding = MESSAGE_COLUMN.saturating_sub(text.graphemes(true).count());
    format!(
        "{:>width$}: {}{}{}",
        diagnostic.line(),
        text,
        " ".repeat(padding),
        diagnostic.message(),
        width = LINE_NUMBER_WIDTH
    )
}

fn truncate_source(line: &str) -> Cow<'_, str> {
    if line.graphemes(true).count() <= MAX_SOURCE_WIDTH {
        return Cow::Borrowed(line);
    }
    let mut truncated: String = line.graphemes(true).take(TRUNCATED_WIDTH).collect();
    truncated.push_str("...");
    Cow::Owned(truncated)
}

/// Renders the plain-text report: a header naming the file, then one row
/// per diagnostic or [`PASS_MARKER`].
pub fn render_report(file: &Path, rows: &[String]) -> String {
    let mut out = format!("{}:\n\n", file.display());
    if rows.is_empty() {
        out.push_str(PASS_MARKER);
        out.push('\n');
    }
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

/// Result of analyzing one file.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Absolute path of the analyzed file.
    pub file: PathBuf,
    /// Diagnostics sorted by line.
    pub diagnostics: Vec<Diagnostic>,
    /// One formatted row per diagnostic, same order.
    pub rows: Vec<String>,
    /// What happened to each enabled tool.
    pub outcomes: Vec<ToolOutcome>,
}

impl AnalysisReport {
    /// True when no diagnostics were found.
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    /// Renders the report as plain text.
    pub fn render(&self) -> String {
        render_report(&self.file, &self.rows)
    }
}

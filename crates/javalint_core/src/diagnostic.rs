//! Diagnostic types shared by every tool.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Column value for diagnostics whose position inside the line is unknown.
pub const NO_COLUMN: i32 = -1;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the compiler rejected the file.
    Error,
    /// Warning - lint or rule violation.
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem reported by an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    line: u32,
    column: i32,
    source_file: PathBuf,
}

impl Diagnostic {
    /// Creates a diagnostic without a column.
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        line: u32,
        source_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            line,
            column: NO_COLUMN,
            source_file: source_file.into(),
        }
    }

    /// Creates a warning, the only severity the rule checker reports.
    pub fn warning(message: impl Into<String>, line: u32, source_file: impl Into<PathBuf>) -> Self {
        Self::new(Severity::Warning, message, line, source_file)
    }

    /// Sets the column.
    pub fn with_column(mut self, column: i32) -> Self {
        self.column = column;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line number, or 0 when the diagnostic applies to the whole file.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 0-based column, [`NO_COLUMN`] when unknown, 0 for line-level tools.
    pub fn column(&self) -> i32 {
        self.column
    }

    /// Returns true when the diagnostic points inside the line rather than at it.
    pub fn has_column(&self) -> bool {
        self.column > 0
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }
}

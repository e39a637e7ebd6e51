//! Parser for `javac -Xlint` output.
//!
//! A compiler record spans several lines:
//!
//! ```text
//! src/Foo.java:10: warning: [cast] redundant cast to String
//!         String s = (String) o;
//!                    ^
//!   symbol: ...
//! ```
//!
//! The first line carries the location and message, the source echo is
//! skipped, the caret line gives the column and anything after it is
//! appended to the message.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{OutputParser, strip_line_ending};
use crate::diagnostic::NO_COLUMN;
use crate::paths::absolutize;
use crate::{Diagnostic, Severity};

static PRIMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<path>.*\.java):(?P<line>\d+): (?:(?P<warning>warning: )|error: )?(?:\[\w+\] )?(?P<message>.*)$",
    )
    .expect("invalid compiler diagnostic pattern")
});

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<mark>\s*)\^$").expect("invalid caret marker pattern"));

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+ (?:error|warning)s?$").expect("invalid summary pattern")
});

/// Compiler-wide messages such as `warning: [path] bad path element` or
/// `Note: Some input files use unchecked operations.`
static GLOBAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:warning|error|[Nn]ote): ").expect("invalid global message pattern")
});

/// Separator placed between a message and its continuation lines.
const CONTINUATION_SEPARATOR: &str = "; ";

/// Diagnostic under construction.
#[derive(Debug)]
struct Record {
    severity: Severity,
    line: u32,
    column: i32,
    message: String,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    /// Primary line seen, caret not yet. `None` means the block belongs to
    /// another file and is consumed without output.
    AwaitingMarker(Option<Record>),
    /// Caret seen; unmatched lines extend the message.
    Open(Option<Record>),
}

/// Stateful parser for the compiler's multi-line diagnostic grammar.
///
/// Only blocks whose path resolves to `target` produce diagnostics.
/// A new primary line always starts a fresh record, even if the previous one
/// never saw its caret line; such records get [`NO_COLUMN`].
pub struct CompilerLintParser {
    target: PathBuf,
    base_dir: PathBuf,
    state: State,
}

impl CompilerLintParser {
    /// Creates a parser for `target` (absolute). Relative paths in the output
    /// are resolved against `base_dir`, the compiler's working directory.
    pub fn new(target: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            base_dir: base_dir.into(),
            state: State::Idle,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    fn flush(&mut self, out: &mut Vec<Diagnostic>) {
        match std::mem::take(&mut self.state) {
            State::AwaitingMarker(Some(record)) => {
                debug!(
                    "No caret marker for {}:{}, column unknown",
                    self.target.display(),
                    record.line
                );
                out.push(self.build(record));
            }
            State::Open(Some(record)) => out.push(self.build(record)),
            _ => {}
        }
    }

    fn build(&self, record: Record) -> Diagnostic {
        Diagnostic::new(record.severity, record.message, record.line, &self.target)
            .with_column(record.column)
    }

    fn start_record(&mut self, path: &str, line: &str, warning: bool, message: &str) {
        let path = absolutize(&self.base_dir, Path::new(path));
        if path != self.target {
            debug!("Skipping compiler diagnostic for {}", path.display());
            self.state = State::AwaitingMarker(None);
            return;
        }

        let line = match line.parse::<u32>() {
            Ok(n) => n,
            Err(e) => {
                warn!("Invalid line number {:?} in compiler output: {}", line, e);
                0
            }
        };

        self.state = State::AwaitingMarker(Some(Record {
            severity: if warning {
                Severity::Warning
            } else {
                Severity::Error
            },
            line,
            column: NO_COLUMN,
            message: message.trim().to_string(),
        }));
    }
}

impl OutputParser for CompilerLintParser {
    fn feed_line(&mut self, line: &str, out: &mut Vec<Diagnostic>) {
        let line = strip_line_ending(line);

        if let Some(caps) = PRIMARY_RE.captures(line) {
            self.flush(out);
            self.start_record(
                &caps["path"],
                &caps["line"],
                caps.name("warning").is_some(),
                &caps["message"],
            );
            return;
        }

        if SUMMARY_RE.is_match(line) || GLOBAL_RE.is_match(line) {
            self.flush(out);
            return;
        }

        match &mut self.state {
            State::Idle => {}
            State::AwaitingMarker(record) => {
                if let Some(caps) = MARKER_RE.captures(line) {
                    let column = i32::try_from(caps["mark"].len()).unwrap_or(NO_COLUMN);
                    let record = record.take().map(|mut r| {
                        r.column = column;
                        r
                    });
                    self.state = State::Open(record);
                }
            }
            State::Open(Some(record)) => {
                let text = line.trim();
                if !text.is_empty() && !MARKER_RE.is_match(line) {
                    record.message.push_str(CONTINUATION_SEPARATOR);
                    record.message.push_str(text);
                }
            }
            State::Open(None) => {}
        }
    }

    fn finish(&mut self, out: &mut Vec<Diagnostic>) {
        self.flush(out);
    }
}

//! Parser for the rule checker's `text` report.
//!
//! Every violation is one line of the form `<file>:<line>\t<message>`.

use std::path::PathBuf;

use tracing::warn;

use super::{OutputParser, strip_line_ending};
use crate::Diagnostic;

/// Single-line parser for PMD's text renderer.
///
/// All diagnostics are warnings at column 0 and are attributed to the
/// target file; the file named on each line is not compared against it.
pub struct RuleLintParser {
    target: PathBuf,
    malformed: usize,
}

impl RuleLintParser {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            malformed: 0,
        }
    }

    /// Number of non-blank lines that did not match the report grammar.
    pub fn malformed_lines(&self) -> usize {
        self.malformed
    }
}

impl OutputParser for RuleLintParser {
    fn feed_line(&mut self, line: &str, out: &mut Vec<Diagnostic>) {
        let line = strip_line_ending(line);
        if line.trim().is_empty() {
            return;
        }

        match split_violation(line) {
            Some((number, message)) => {
                out.push(Diagnostic::warning(message, number, &self.target).with_column(0));
            }
            None => {
                self.malformed += 1;
                warn!("Unrecognized rule checker output: {}", line);
            }
        }
    }
}

/// Splits `<file>:<line>\t<message>` into line number and trimmed message.
///
/// The file part is split at its last colon so Windows drive letters
/// survive; a colon right before the tab is accepted as well.
fn split_violation(line: &str) -> Option<(u32, &str)> {
    let (head, message) = line.split_once('\t')?;
    let head = head.strip_suffix(':').unwrap_or(head);
    let (file, number) = head.rsplit_once(':')?;
    if file.is_empty() {
        return None;
    }
    let number = number.trim().parse().ok()?;
    Some((number, message.trim()))
}

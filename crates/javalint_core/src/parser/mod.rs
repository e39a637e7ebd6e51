//! Parsers turning raw tool output into diagnostics.
//!
//! Each external tool has its own line grammar. Parsers are fed one line at
//! a time so that the runner can stream process output through them without
//! buffering the whole transcript.

mod compiler;
mod rules;

pub use compiler::CompilerLintParser;
pub use rules::RuleLintParser;

use crate::Diagnostic;

/// Line-oriented parser for one tool's output.
pub trait OutputParser: Send {
    /// Consumes one line of output, pushing any completed diagnostics to `out`.
    ///
    /// Trailing `\r`/`\n` characters are ignored.
    fn feed_line(&mut self, line: &str, out: &mut Vec<Diagnostic>);

    /// Signals the end of the stream, flushing any record still in progress.
    fn finish(&mut self, _out: &mut Vec<Diagnostic>) {}

    /// Parses a complete transcript.
    fn parse_lines<I, S>(mut self, lines: I) -> Vec<Diagnostic>
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for line in lines {
            self.feed_line(line.as_ref(), &mut out);
        }
        self.finish(&mut out);
        out
    }
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

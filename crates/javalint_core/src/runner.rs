//! Running one external analyzer and streaming its output through a parser.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregator::AggregatorSink;
use crate::error::ToolError;
use crate::tool::{ToolCommand, ToolKind};
use crate::Diagnostic;

/// How often a child is polled for exit while a deadline is set.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What happened to one tool during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolStatus {
    /// The tool ran and its output was parsed.
    Completed { diagnostics: usize },
    /// The tool could not be started.
    Unavailable { reason: String },
    /// The tool started but failed.
    Crashed { reason: String },
    /// The tool was killed at the deadline.
    TimedOut,
}

impl ToolStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ToolStatus::Completed { .. })
    }
}

/// Status of a tool, tagged with the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOutcome {
    pub tool: ToolKind,
    #[serde(flatten)]
    pub status: ToolStatus,
}

/// Runs a single external tool against the target file.
///
/// Stdout and stderr are read on separate threads and merged into one line
/// stream, so the parser sees both (lines keep their order within each
/// stream). The run blocks until the process exits or the optional timeout
/// expires.
pub struct AnalyzerRunner {
    kind: ToolKind,
    command: ToolCommand,
    target: PathBuf,
    base_dir: PathBuf,
    timeout: Option<Duration>,
}

impl AnalyzerRunner {
    /// Creates a runner. Relative paths in the tool's output are resolved
    /// against the command's working directory, or the current one.
    pub fn new(kind: ToolKind, command: ToolCommand, target: impl Into<PathBuf>) -> Self {
        let base_dir = command
            .current_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        Self {
            kind,
            command,
            target: target.into(),
            base_dir,
            timeout: None,
        }
    }

    /// Sets the deadline after which the process is killed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Runs the tool and pushes its diagnostics into `sink`.
    ///
    /// Failures are contained: the tool then contributes nothing and the
    /// returned outcome says why.
    pub fn run_into(&self, sink: &AggregatorSink) -> ToolOutcome {
        let status = match self.run() {
            Ok(diagnostics) => {
                let count = diagnostics.len();
                debug!("{} reported {} diagnostics", self.kind, count);
                sink.extend(&self.target, diagnostics);
                ToolStatus::Completed { diagnostics: count }
            }
            Err(e @ ToolError::Spawn { .. }) => {
                warn!("{} is unavailable: {}", self.kind, e);
                ToolStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
            Err(ToolError::TimedOut(timeout)) => {
                warn!("{} timed out after {:?}", self.kind, timeout);
                ToolStatus::TimedOut
            }
            Err(e) => {
                warn!("{} failed: {}", self.kind, e);
                ToolStatus::Crashed {
                    reason: e.to_string(),
                }
            }
        };

        ToolOutcome {
            tool: self.kind,
            status,
        }
    }

    /// Runs the tool and returns the diagnostics it reported for the target.
    pub fn run(&self) -> Result<Vec<Diagnostic>, ToolError> {
        debug!("Running {}: {}", self.kind, self.command);

        let mut child = self
            .command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.command.program.to_string_lossy().into_owned(),
                source,
            })?;

        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone()));
        }
        // Only the reader threads keep the channel open from here on.
        drop(tx);

        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let mut parser = self.kind.parser(&self.target, &self.base_dir);
        let mut diagnostics = Vec::new();

        loop {
            let line = match deadline {
                Some(deadline) => match rx.recv_deadline(deadline) {
                    Ok(line) => line,
                    Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => return Err(self.kill(&mut child)),
                },
                None => match rx.recv() {
                    Ok(line) => line,
                    Err(_) => break,
                },
            };
            parser.feed_line(&line, &mut diagnostics);
        }
        parser.finish(&mut diagnostics);

        for reader in readers {
            if reader.join().is_err() {
                warn!("Output reader for {} panicked", self.kind);
            }
        }

        let status = self.wait(&mut child, deadline)?;
        match status.code() {
            Some(code) if self.kind.is_expected_exit(code) => Ok(diagnostics),
            Some(code) => Err(ToolError::UnexpectedExit { code }),
            None => Err(ToolError::Terminated),
        }
    }

    fn wait(&self, child: &mut Child, deadline: Option<Instant>) -> Result<ExitStatus, ToolError> {
        let Some(deadline) = deadline else {
            return Ok(child.wait()?);
        };

        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                return Err(self.kill(child));
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    fn kill(&self, child: &mut Child) -> ToolError {
        if let Err(e) = child.kill() {
            debug!("Failed to kill {}: {}", self.kind, e);
        }
        // Reap the process; readers are left to finish on their own.
        let _ = child.wait();
        ToolError::TimedOut(self.timeout.unwrap_or_default())
    }
}

/// Forwards each line of `stream` to `tx` until EOF.
fn spawn_line_reader<R>(stream: R, tx: Sender<String>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read tool output: {}", e);
                    break;
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::aggregator::ResultAggregator;
    use crate::Severity;
    use pretty_assertions::assert_eq;

    fn shell(kind: ToolKind, script: &str, dir: &Path) -> AnalyzerRunner {
        let command = ToolCommand::new("sh").args(["-c", script]).current_dir(dir);
        AnalyzerRunner::new(kind, command, dir.join("Foo.java"))
    }

    #[test]
    fn test_compiler_output_on_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf 'Foo.java:10: warning: [cast] unchecked cast\\n        ^\\n1 warning\\n' >&2";
        let diags = shell(ToolKind::CompilerLint, script, dir.path()).run().unwrap();

        assert_eq!(
            diags,
            vec![Diagnostic::warning("unchecked cast", 10, dir.path().join("Foo.java")).with_column(8)]
        );
    }

    #[test]
    fn test_compiler_errors_exit_code_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf 'Foo.java:3: error: missing return statement\\n    }\\n    ^\\n1 error\\n' >&2; exit 1";
        let diags = shell(ToolKind::CompilerLint, script, dir.path()).run().unwrap();

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity(), Severity::Error);
        assert_eq!(diags[0].column(), 4);
    }

    #[test]
    fn test_rule_output_on_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf 'Foo.java:22\\tAvoid empty catch blocks\\nFoo.java:4\\tUnused import\\n'; exit 4";
        let diags = shell(ToolKind::RuleLint, script, dir.path()).run().unwrap();

        let lines: Vec<u32> = diags.iter().map(Diagnostic::line).collect();
        assert_eq!(lines, vec![22, 4]);
    }

    #[test]
    fn test_unexpected_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf 'Foo.java:22\\tAvoid empty catch blocks\\n'; exit 1";
        let err = shell(ToolKind::RuleLint, script, dir.path()).run().unwrap_err();

        assert!(matches!(err, ToolError::UnexpectedExit { code: 1 }));
    }

    #[test]
    fn test_spawn_failure_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let command = ToolCommand::new("/nonexistent/javalint/javac");
        let runner = AnalyzerRunner::new(ToolKind::CompilerLint, command, dir.path().join("Foo.java"));
        let mut aggregator = ResultAggregator::new();

        let outcome = runner.run_into(&aggregator.sink(0));

        assert!(matches!(outcome.status, ToolStatus::Unavailable { .. }));
        assert!(aggregator.files().is_empty());
    }

    #[test]
    fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let runner = shell(ToolKind::RuleLint, "exec sleep 30", dir.path())
            .with_timeout(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = runner.run().unwrap_err();

        assert!(matches!(err, ToolError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_run_into_pushes_under_target() {
        let dir = tempfile::tempdir().unwrap();
        let script = "printf 'Other.java:1\\tmsg\\n'";
        let runner = shell(ToolKind::RuleLint, script, dir.path());
        let mut aggregator = ResultAggregator::new();

        let outcome = runner.run_into(&aggregator.sink(0));

        assert_eq!(outcome.status, ToolStatus::Completed { diagnostics: 1 });
        assert_eq!(aggregator.drain_sorted(&dir.path().join("Foo.java")).len(), 1);
    }
}
